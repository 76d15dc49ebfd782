//! Bridge configuration.
//!
//! Values come from three layers, lowest priority first: built-in defaults,
//! an optional YAML file, and command-line flags (see [`crate::cli`]).
//!
//! ```yaml
//! serial:
//!   port: /dev/ttyACM0
//!   baud_rate: 115200
//!   read_timeout_ms: 1000
//! http:
//!   listen: 127.0.0.1:8000
//!   tls: true
//!   cert_path: /etc/rfplayer/server.crt
//!   key_path: /etc/rfplayer/server.key
//! ```

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, BridgeResult};

/// Default serial device.
pub const DEFAULT_SERIAL_PORT: &str = "/dev/ttyUSB0";

/// The RFPlayer runs at 115200 baud.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default time a single read may block waiting for data.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1000;

/// Default HTTP port.
pub const DEFAULT_HTTP_PORT: u16 = 8000;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Serial line settings.
    pub serial: SerialConfig,
    /// HTTP listener settings.
    pub http: HttpConfig,
}

/// Serial line settings. Framing is always 8N1 without flow control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device path.
    pub port: String,
    /// Baud rate.
    pub baud_rate: u32,
    /// Per-read timeout in milliseconds. A read that sees no data within
    /// this window ends a drain.
    pub read_timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        SerialConfig {
            port: DEFAULT_SERIAL_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
        }
    }
}

impl SerialConfig {
    /// Per-read timeout.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Address to bind.
    pub listen: SocketAddr,
    /// Serve over TLS.
    pub tls: bool,
    /// PEM certificate chain, used when `tls` is set.
    pub cert_path: PathBuf,
    /// PEM private key, used when `tls` is set.
    pub key_path: PathBuf,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            listen: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_HTTP_PORT)),
            tls: false,
            cert_path: PathBuf::from("server.crt"),
            key_path: PathBuf::from("server.key"),
        }
    }
}

impl BridgeConfig {
    /// Load a configuration file. Missing keys keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> BridgeResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Parse a configuration from YAML text.
    pub fn from_yaml_str(text: &str) -> BridgeResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Check that the configuration can be used to start the bridge.
    pub fn validate(&self) -> BridgeResult<()> {
        if self.serial.port.is_empty() {
            return Err(BridgeError::Config("serial port path is empty".to_string()));
        }
        if self.serial.baud_rate == 0 {
            return Err(BridgeError::Config("baud rate must be non-zero".to_string()));
        }
        if self.serial.read_timeout_ms == 0 {
            return Err(BridgeError::Config(
                "read timeout must be non-zero, a zero timeout never drains".to_string(),
            ));
        }
        if self.http.tls
            && (self.http.cert_path.as_os_str().is_empty()
                || self.http.key_path.as_os_str().is_empty())
        {
            return Err(BridgeError::Config(
                "TLS enabled without a certificate and key".to_string(),
            ));
        }
        Ok(())
    }
}
