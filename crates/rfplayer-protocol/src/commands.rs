//! Commands that can be sent to the RFPlayer.
//!
//! The bridge only ever sends a handful of commands:
//! - Orders built from HTTP requests
//! - `PING` and `STATUS SYSTEM JSON` health queries
//! - `FORMAT JSON` to select JSON replies at startup

use crate::codec::frame;
use crate::error::ProtocolResult;
use crate::order::{translate, Order};

/// Commands that can be sent to the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Liveness check.
    Ping,

    /// Full system status, as JSON.
    Status,

    /// Switch the device to JSON replies. Sent once when the link opens.
    FormatJson,

    /// Actuate or query a device endpoint.
    Order(Order),
}

impl Command {
    /// Encode the command as the exact bytes to write to the serial line.
    /// Includes the `ZIA++` marker and the `\r` terminator.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        Ok(frame(&self.to_command_string()?))
    }

    /// Get the command string without framing.
    ///
    /// Only [`Command::Order`] can fail, when the order does not validate.
    pub fn to_command_string(&self) -> ProtocolResult<String> {
        match self {
            Command::Ping => Ok("PING".to_string()),
            Command::Status => Ok("STATUS SYSTEM JSON".to_string()),
            Command::FormatJson => Ok("FORMAT JSON".to_string()),
            Command::Order(order) => translate(order),
        }
    }

    /// Short name of the command, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Ping => "ping",
            Command::Status => "status",
            Command::FormatJson => "format",
            Command::Order(_) => "order",
        }
    }
}
