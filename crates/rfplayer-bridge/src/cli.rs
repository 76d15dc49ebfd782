//! Command-line interface.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{ArgAction, Parser};

use crate::config::BridgeConfig;
use crate::error::BridgeResult;

/// HTTP bridge for a serial-attached RFPlayer transceiver.
#[derive(Debug, Parser)]
#[command(name = "rfplayer-bridge", version, about)]
pub struct Cli {
    /// Enable TLS connections.
    #[arg(long)]
    pub tls: bool,

    /// Path to the serial port.
    #[arg(long, value_name = "PATH")]
    pub port: Option<String>,

    /// YAML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Address for the HTTP listener.
    #[arg(long, value_name = "ADDR")]
    pub listen: Option<SocketAddr>,

    /// Serial baud rate.
    #[arg(long)]
    pub baud: Option<u32>,

    /// Per-read serial timeout in milliseconds.
    #[arg(long, value_name = "MS")]
    pub read_timeout_ms: Option<u64>,

    /// TLS certificate (PEM).
    #[arg(long, value_name = "PATH")]
    pub cert: Option<PathBuf>,

    /// TLS private key (PEM).
    #[arg(long, value_name = "PATH")]
    pub key: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Build the effective configuration: defaults, then the config file,
    /// then flags.
    pub fn resolve_config(&self) -> BridgeResult<BridgeConfig> {
        let mut config = match &self.config {
            Some(path) => BridgeConfig::load(path)?,
            None => BridgeConfig::default(),
        };
        self.apply_to(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Override `config` with any flags that were given.
    pub fn apply_to(&self, config: &mut BridgeConfig) {
        if self.tls {
            config.http.tls = true;
        }
        if let Some(port) = &self.port {
            config.serial.port = port.clone();
        }
        if let Some(listen) = self.listen {
            config.http.listen = listen;
        }
        if let Some(baud) = self.baud {
            config.serial.baud_rate = baud;
        }
        if let Some(timeout) = self.read_timeout_ms {
            config.serial.read_timeout_ms = timeout;
        }
        if let Some(cert) = &self.cert {
            config.http.cert_path = cert.clone();
        }
        if let Some(key) = &self.key {
            config.http.key_path = key.clone();
        }
    }

    /// Default log filter when `RUST_LOG` is not set.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
