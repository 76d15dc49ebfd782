//! RFPlayer HTTP bridge.
//!
//! Exposes a serial-attached RFPlayer transceiver over a small REST API.
//! Requests are translated into the device's ASCII command protocol (see
//! [`rfplayer_protocol`]), written to the serial line, and the device's reply
//! is relayed back as the response body.
//!
//! ## Components
//!
//! - [`transport`]: byte-level serial access and the drain loop
//! - [`worker`]: the thread that owns the serial line and serializes exchanges
//! - [`server`]: the axum router and listener
//! - [`config`] / [`cli`]: configuration layers

pub mod cli;
pub mod config;
pub mod error;
pub mod server;
pub mod transport;
pub mod worker;

pub use config::{BridgeConfig, HttpConfig, SerialConfig};
pub use error::{BridgeError, BridgeResult, TransportError};
pub use server::{router, serve};
pub use transport::{MockTransport, SerialTransport, Transport};
pub use worker::{spawn_serial_worker, LinkState, SerialHandle, SerialWorker};
