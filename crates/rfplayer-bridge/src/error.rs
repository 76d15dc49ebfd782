//! Error types for the bridge.

use std::io;

use rfplayer_protocol::ProtocolError;
use thiserror::Error;

/// Errors raised by the serial line.
///
/// Any of these means the link can no longer be trusted.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The serial device could not be opened.
    #[error("failed to open serial port {port}: {source}")]
    Open {
        /// Device path.
        port: String,
        /// Underlying error.
        #[source]
        source: serialport::Error,
    },

    /// Writing a command failed.
    #[error("serial write failed: {0}")]
    Write(#[source] io::Error),

    /// Reading failed with something other than "no more data".
    #[error("serial read failed: {0}")]
    Read(#[source] io::Error),
}

/// Errors that can occur while serving a request or starting the bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The order failed validation.
    #[error(transparent)]
    Validation(#[from] ProtocolError),

    /// The request body could not be decoded.
    #[error("malformed request body: {0}")]
    BadRequest(String),

    /// The serial line failed while handling this request.
    #[error("serial transport failure: {0}")]
    Transport(#[from] TransportError),

    /// The serial worker has stopped after an earlier failure.
    #[error("serial link is down")]
    LinkDown,

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The configuration file could not be parsed.
    #[error("failed to parse configuration file: {0}")]
    ConfigFile(#[from] serde_yaml::Error),

    /// I/O error outside the serial line (config file, listener, TLS files).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
