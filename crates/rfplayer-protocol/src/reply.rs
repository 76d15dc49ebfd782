//! Replies received from the device.
//!
//! The bridge relays replies as opaque bytes. [`Reply`] only removes the
//! `ZIA--` prefix and answers a few questions about the payload.

use crate::codec::unframe;

/// An unframed reply from the device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    bytes: Vec<u8>,
}

impl Reply {
    /// Build a reply from raw drained bytes, stripping the reply prefix.
    pub fn from_raw(raw: &[u8]) -> Self {
        Reply {
            bytes: unframe(raw).to_vec(),
        }
    }

    /// The reply payload.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the reply, returning the payload.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Check if the device sent nothing.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Get the payload as text if it is valid UTF-8.
    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }

    /// MIME type to serve the payload with.
    pub fn content_type(&self) -> &'static str {
        if self.as_text().is_some() {
            "text/plain; charset=utf-8"
        } else {
            "application/octet-stream"
        }
    }
}

impl From<Vec<u8>> for Reply {
    fn from(raw: Vec<u8>) -> Self {
        Reply::from_raw(&raw)
    }
}
