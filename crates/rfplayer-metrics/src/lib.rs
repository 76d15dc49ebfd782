//! Metrics declarations for the RFPlayer bridge.
//!
//! Every metric the bridge records is declared here as a structured
//! [`Metric`] constant so names, units and label keys live in one place.
//! The `metrics` crate is re-exported for convenience.
//!
//! # Example
//!
//! ```rust,ignore
//! use rfplayer_metrics::{describe_metrics, metric_defs, request_labels};
//!
//! // Register descriptions once at startup
//! describe_metrics();
//!
//! metrics::counter!(metric_defs::HTTP_REQUESTS.name, &request_labels("ping", 200)).increment(1);
//! ```
//!
//! No exporter is installed by the bridge itself; without a recorder the
//! macros are no-ops.

pub use metrics;

use metrics::{describe_counter, describe_histogram, Unit};

/// How a metric is recorded. The bridge only counts and times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Monotonic total.
    Counter,
    /// Distribution of observed values.
    Histogram,
}

/// Name, kind and metadata of one metric, declared as a constant.
///
/// ```rust
/// use rfplayer_metrics::{Metric, MetricKind};
/// use rfplayer_metrics::metrics::Unit;
///
/// const BYTES_OUT: Metric = Metric::counter("rfplayer.example.bytes_out")
///     .with_description("Bytes sent")
///     .with_unit(Unit::Bytes);
///
/// assert_eq!(BYTES_OUT.kind, MetricKind::Counter);
/// ```
#[derive(Debug, Clone)]
pub struct Metric {
    /// The metric name (e.g., "rfplayer.serial.bytes_written").
    pub name: &'static str,
    /// The kind of metric.
    pub kind: MetricKind,
    /// Human-readable description.
    pub description: &'static str,
    /// The unit of measurement.
    pub unit: Option<Unit>,
    /// Expected label keys.
    pub labels: &'static [&'static str],
}

impl Metric {
    const fn new(name: &'static str, kind: MetricKind) -> Self {
        Self {
            name,
            kind,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    /// Counter with no description, unit or labels yet.
    pub const fn counter(name: &'static str) -> Self {
        Self::new(name, MetricKind::Counter)
    }

    /// Histogram with no description, unit or labels yet.
    pub const fn histogram(name: &'static str) -> Self {
        Self::new(name, MetricKind::Histogram)
    }

    /// Sets the description.
    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Sets the unit.
    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Sets the expected label keys.
    pub const fn with_labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    /// Registers this metric's description with the installed recorder.
    pub fn describe(&self) {
        let unit = self.unit.unwrap_or(Unit::Count);
        match self.kind {
            MetricKind::Counter => {
                describe_counter!(self.name, unit, self.description);
            }
            MetricKind::Histogram => {
                describe_histogram!(self.name, unit, self.description);
            }
        }
    }
}

/// All metric definitions for the bridge.
pub mod metric_defs {
    use super::{Metric, Unit};

    // ========================================================================
    // HTTP Surface
    // ========================================================================

    /// HTTP requests handled, by operation and response status.
    ///
    /// Labels: operation, status
    pub const HTTP_REQUESTS: Metric = Metric::counter("rfplayer.http.requests")
        .with_description("HTTP requests handled by the bridge")
        .with_unit(Unit::Count)
        .with_labels(&["operation", "status"]);

    /// Orders rejected before reaching the serial line.
    pub const ORDERS_REJECTED: Metric = Metric::counter("rfplayer.http.orders_rejected")
        .with_description("Orders rejected by validation or decoding")
        .with_unit(Unit::Count);

    // ========================================================================
    // Serial Line
    // ========================================================================

    /// Bytes written to the device, framing included.
    pub const SERIAL_BYTES_WRITTEN: Metric = Metric::counter("rfplayer.serial.bytes_written")
        .with_description("Bytes written to the serial line")
        .with_unit(Unit::Bytes);

    /// Bytes drained from the device.
    pub const SERIAL_BYTES_READ: Metric = Metric::counter("rfplayer.serial.bytes_read")
        .with_description("Bytes drained from the serial line")
        .with_unit(Unit::Bytes);

    /// Stale bytes thrown away at startup.
    pub const SERIAL_STALE_DISCARDED: Metric =
        Metric::counter("rfplayer.serial.stale_bytes_discarded")
            .with_description("Unsolicited bytes discarded when the link was opened")
            .with_unit(Unit::Bytes);

    /// Wall-clock time of one write-then-drain exchange.
    ///
    /// Labels: operation
    pub const SERIAL_EXCHANGE_TIME: Metric = Metric::histogram("rfplayer.serial.exchange_time_us")
        .with_description("Time to write a command and drain the reply in microseconds")
        .with_unit(Unit::Microseconds)
        .with_labels(&["operation"]);

    /// Everything [`describe_metrics`](super::describe_metrics) registers.
    pub const ALL: &[&Metric] = &[
        &HTTP_REQUESTS,
        &ORDERS_REJECTED,
        &SERIAL_BYTES_WRITTEN,
        &SERIAL_BYTES_READ,
        &SERIAL_STALE_DISCARDED,
        &SERIAL_EXCHANGE_TIME,
    ];
}

/// Labels for [`metric_defs::HTTP_REQUESTS`].
pub fn request_labels(operation: &'static str, status: u16) -> Vec<(&'static str, String)> {
    vec![("operation", operation.to_string()), ("status", status.to_string())]
}

/// Describes all metrics used by the bridge.
///
/// Call once at startup, after installing a recorder if one is wanted.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}
