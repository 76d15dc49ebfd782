//! Error types for the RFPlayer protocol.

use thiserror::Error;

/// Errors that can occur while building a command for the device.
///
/// All of these are caused by the caller's input and are detected before
/// anything is written to the serial line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// A required order field was empty or absent.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A field contained bytes that could break command framing.
    #[error("invalid characters in field {field}: {value:?}")]
    InvalidField {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: String,
    },
}

/// Result type alias for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
