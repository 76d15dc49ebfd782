//! Orders: actuate or query a device endpoint.
//!
//! An order is translated into the device grammar
//!
//! ```text
//! <action> <address> <protocol> [%<percent>] [BURST <burst>] [QUALIFIER <qualifier>]
//! ```
//!
//! Modifiers are appended in that fixed order and only when present.

use std::fmt;

use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ProtocolError, ProtocolResult};

/// A request to actuate or query a device endpoint.
///
/// Field names on the wire match the HTTP API (`Order`, `Address`, ...).
/// Decoding matches names in any letter case and ignores unknown keys.
/// Missing and `null` fields decode as empty so that [`Order::validate`]
/// reports them instead of the JSON decoder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Order {
    /// Verb, e.g. `ON`, `OFF`, `DIM`.
    #[serde(rename = "Order")]
    pub action: String,

    /// Device or unit identifier, e.g. `A1` or `12345`.
    #[serde(rename = "Address")]
    pub address: String,

    /// Wire sub-protocol, e.g. `X10`, `CHACON`, `RTS`.
    #[serde(rename = "Protocol")]
    pub protocol: String,

    /// Dimmer level.
    #[serde(rename = "Percent", skip_serializing_if = "is_absent")]
    pub percent: Option<String>,

    /// Repeat count.
    #[serde(rename = "Burst", skip_serializing_if = "is_absent")]
    pub burst: Option<String>,

    /// Free-form modifier.
    #[serde(rename = "Qualifier", skip_serializing_if = "is_absent")]
    pub qualifier: Option<String>,
}

impl<'de> Deserialize<'de> for Order {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(OrderVisitor)
    }
}

struct OrderVisitor;

impl<'de> Visitor<'de> for OrderVisitor {
    type Value = Order;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an order object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Order, A::Error> {
        let mut order = Order::default();

        // A later duplicate wins; null leaves the field as it was.
        while let Some(key) = map.next_key::<String>()? {
            let slot = match key.to_ascii_lowercase().as_str() {
                "order" => Slot::Required(&mut order.action),
                "address" => Slot::Required(&mut order.address),
                "protocol" => Slot::Required(&mut order.protocol),
                "percent" => Slot::Modifier(&mut order.percent),
                "burst" => Slot::Modifier(&mut order.burst),
                "qualifier" => Slot::Modifier(&mut order.qualifier),
                _ => {
                    map.next_value::<IgnoredAny>()?;
                    continue;
                }
            };
            if let Some(value) = map.next_value::<Option<String>>()? {
                match slot {
                    Slot::Required(field) => *field = value,
                    Slot::Modifier(field) => *field = Some(value),
                }
            }
        }

        Ok(order)
    }
}

enum Slot<'a> {
    Required(&'a mut String),
    Modifier(&'a mut Option<String>),
}

fn is_absent(value: &Option<String>) -> bool {
    present(value).is_none()
}

/// An empty modifier counts as absent.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Reject anything but printable, non-whitespace ASCII.
///
/// Keeps a carriage return or a second `ZIA++` command from being smuggled
/// through a field value.
fn check_field(field: &'static str, value: &str) -> ProtocolResult<()> {
    if value.bytes().all(|b| b.is_ascii_graphic()) {
        Ok(())
    } else {
        Err(ProtocolError::InvalidField {
            field,
            value: value.to_string(),
        })
    }
}

impl Order {
    /// Create an order with the three required fields and no modifiers.
    pub fn new(
        action: impl Into<String>,
        address: impl Into<String>,
        protocol: impl Into<String>,
    ) -> Self {
        Order {
            action: action.into(),
            address: address.into(),
            protocol: protocol.into(),
            ..Default::default()
        }
    }

    /// Set the dimmer level.
    pub fn with_percent(mut self, percent: impl Into<String>) -> Self {
        self.percent = Some(percent.into());
        self
    }

    /// Set the repeat count.
    pub fn with_burst(mut self, burst: impl Into<String>) -> Self {
        self.burst = Some(burst.into());
        self
    }

    /// Set the qualifier.
    pub fn with_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    /// Check that the order can be sent.
    ///
    /// Required fields are checked first (action, address, protocol), then
    /// every present field is checked for characters that could break framing.
    pub fn validate(&self) -> ProtocolResult<()> {
        let required = [
            ("Order", self.action.as_str()),
            ("Address", self.address.as_str()),
            ("Protocol", self.protocol.as_str()),
        ];
        for (field, value) in required {
            if value.is_empty() {
                return Err(ProtocolError::MissingField(field));
            }
        }
        for (field, value) in required {
            check_field(field, value)?;
        }

        let optional = [
            ("Percent", &self.percent),
            ("Burst", &self.burst),
            ("Qualifier", &self.qualifier),
        ];
        for (field, value) in optional {
            if let Some(v) = present(value) {
                check_field(field, v)?;
            }
        }
        Ok(())
    }

    /// Build the command string for this order.
    pub fn to_command_string(&self) -> ProtocolResult<String> {
        translate(self)
    }
}

/// Translate an order into the device command grammar.
///
/// Fails if a required field is empty or any field holds characters outside
/// printable ASCII.
pub fn translate(order: &Order) -> ProtocolResult<String> {
    order.validate()?;

    let mut command = format!("{} {} {}", order.action, order.address, order.protocol);

    if let Some(percent) = present(&order.percent) {
        command.push_str(" %");
        command.push_str(percent);
    }
    if let Some(burst) = present(&order.burst) {
        command.push_str(" BURST ");
        command.push_str(burst);
    }
    if let Some(qualifier) = present(&order.qualifier) {
        command.push_str(" QUALIFIER ");
        command.push_str(qualifier);
    }

    Ok(command)
}
