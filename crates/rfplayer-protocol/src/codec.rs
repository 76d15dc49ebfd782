//! Command framing for the serial line.
//!
//! Every command sent to the RFPlayer is wrapped as `ZIA++<command>\r`.
//! Replies may start with `ZIA--`, which is removed before the reply is
//! handed back to the caller.

/// Marker that starts every host → device command.
pub const START_MARKER: &str = "ZIA++";

/// Command terminator (carriage return, no line feed).
pub const TERMINATOR: u8 = b'\r';

/// Prefix the device may put in front of a reply.
pub const REPLY_PREFIX: &str = "ZIA--";

/// Frame a command for transmission.
///
/// Prepends [`START_MARKER`] and appends [`TERMINATOR`]. The command text is
/// inserted verbatim.
pub fn frame(command: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(START_MARKER.len() + command.len() + 1);
    buf.extend_from_slice(START_MARKER.as_bytes());
    buf.extend_from_slice(command.as_bytes());
    buf.push(TERMINATOR);
    buf
}

/// Strip the reply prefix from received data.
///
/// Returns the bytes after [`REPLY_PREFIX`] if the reply starts with it,
/// otherwise returns the input unchanged. Never fails.
pub fn unframe(reply: &[u8]) -> &[u8] {
    reply
        .strip_prefix(REPLY_PREFIX.as_bytes())
        .unwrap_or(reply)
}
