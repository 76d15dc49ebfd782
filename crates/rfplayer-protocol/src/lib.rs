//! RFPlayer ASCII Command Protocol
//!
//! This crate provides types and utilities for talking to an RFPlayer
//! home-automation transceiver over its serial line. The device speaks a
//! simple line-oriented ASCII protocol: every command is wrapped in a start
//! marker and a carriage return, and replies may carry a marker of their own.
//!
//! # Protocol Overview
//!
//! - **Commands** (host → device): `ZIA++<command>\r`
//! - **Replies** (device → host): free text, optionally prefixed with `ZIA--`
//!
//! # Command Types
//!
//! - **Orders**: `<action> <address> <protocol> [%<percent>] [BURST <n>] [QUALIFIER <q>]`
//!   actuate or query a device endpoint (see [`Order`])
//! - **Housekeeping**: `PING`, `STATUS SYSTEM JSON`, `FORMAT JSON`
//!
//! # Example
//!
//! ```rust
//! use rfplayer_protocol::{frame, unframe, Command, Order};
//!
//! let order = Order::new("ON", "12345", "X10");
//! let cmd = Command::Order(order);
//! assert_eq!(cmd.encode().unwrap(), b"ZIA++ON 12345 X10\r");
//!
//! assert_eq!(unframe(b"ZIA--OK"), b"OK");
//! assert_eq!(frame("PING"), b"ZIA++PING\r");
//! ```

mod codec;
mod commands;
mod error;
mod order;
mod reply;

pub use codec::*;
pub use commands::*;
pub use error::*;
pub use order::*;
pub use reply::*;
