//! Records sent by the gateway and the metric attributes derived from them.
//!
//! Every frame carries a JSON object of the form
//! `{"type": "<kind>", "data": {...}}`. Only `log` payloads are decoded
//! further; `configure` payloads are passed through untouched and any other
//! type is reported as unknown.

use metrics::Label;
use serde::Deserialize;
use serde_json::Value;

use crate::error::MessageError;

/// Type tag of a `log` record.
pub const LOG_TYPE: &str = "log";
/// Type tag of a `configure` record.
pub const CONFIGURE_TYPE: &str = "configure";

/// Decoded top-level record.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Record {
    /// Value of the `type` field.
    #[serde(rename = "type")]
    pub kind: String,
    /// Type-specific payload. Missing `data` decodes as `null`.
    #[serde(default)]
    pub data: Value,
}

/// Classification of a record by its type tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageType<'a> {
    /// A request log emitted by the gateway.
    Log,
    /// A configuration snapshot.
    Configure,
    /// Any other type tag.
    Unknown(&'a str),
}

impl Record {
    /// Decode a record from raw frame bytes.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::Malformed`] if the frame is not valid JSON or
    /// is not an object with a string `type` field.
    pub fn from_frame(frame: &[u8]) -> Result<Self, MessageError> {
        serde_json::from_slice(frame).map_err(MessageError::Malformed)
    }

    /// Classify the record by its type tag.
    #[must_use]
    pub fn message_type(&self) -> MessageType<'_> {
        match self.kind.as_str() {
            LOG_TYPE => MessageType::Log,
            CONFIGURE_TYPE => MessageType::Configure,
            other => MessageType::Unknown(other),
        }
    }
}

/// Service or route reference inside a log payload.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct Entity {
    /// Human readable name, if configured.
    #[serde(default)]
    pub name: Option<String>,
    /// Gateway identifier.
    #[serde(default)]
    pub id: Option<String>,
}

impl Entity {
    /// Name used as a metric label, falling back to the id when the name is
    /// absent or empty.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => Some(name),
            _ => self.id.as_deref(),
        }
    }
}

/// Latencies reported by the gateway, in milliseconds.
///
/// Fields stay raw JSON; a falsy or non-numeric value skips that observation
/// and never rejects the payload.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Latencies {
    /// Time spent inside the gateway itself.
    #[serde(default)]
    pub kong: Option<Value>,
    /// Total request time including the upstream service.
    #[serde(default)]
    pub request: Option<Value>,
}

/// Keeps only numbers that count as present: non-zero and not NaN.
///
/// `null`, `false`, `""` and `0` are absent. Other non-numbers cannot be
/// recorded and are skipped as well.
fn observed(field: &'static str, value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64().filter(|v| *v != 0.0 && !v.is_nan()),
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        other => {
            tracing::debug!(field, value = %other, "skipping non-numeric latency");
            None
        }
    }
}

impl Latencies {
    /// Gateway latency to record, if any.
    #[must_use]
    pub fn kong_observation(&self) -> Option<f64> { observed("kong", self.kong.as_ref()) }

    /// Request latency to record, if any.
    #[must_use]
    pub fn request_observation(&self) -> Option<f64> { observed("request", self.request.as_ref()) }
}

/// Response summary of a logged request.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct ResponseInfo {
    /// HTTP status code returned to the client.
    #[serde(default)]
    pub status: Option<u16>,
}

/// Payload of a `log` record.
///
/// `service`, `route` and `latencies` are structurally required; decoding a
/// payload without them fails.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct LogPayload {
    pub service: Entity,
    pub route: Entity,
    pub latencies: Latencies,
    #[serde(default)]
    pub response: Option<ResponseInfo>,
}

impl LogPayload {
    /// Decode the `data` field of a `log` record.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::InvalidLogPayload`] when a required object is
    /// missing or a field has the wrong type.
    pub fn from_data(data: Value) -> Result<Self, MessageError> {
        serde_json::from_value(data).map_err(MessageError::InvalidLogPayload)
    }

    /// Attribute set tagging the attributed histogram observations.
    #[must_use]
    pub fn attributes(&self) -> AttributeSet {
        AttributeSet {
            service: self.service.display_name().map(str::to_owned),
            route: self.route.display_name().map(str::to_owned),
            status: self.response.and_then(|r| r.status),
        }
    }
}

/// Dimensions attached to an attributed latency observation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttributeSet {
    pub service: Option<String>,
    pub route: Option<String>,
    pub status: Option<u16>,
}

impl AttributeSet {
    /// Render the set as metric labels. Absent values produce no label.
    #[must_use]
    pub fn labels(&self) -> Vec<Label> {
        let mut labels = Vec::with_capacity(3);
        if let Some(service) = &self.service {
            labels.push(Label::new("service", service.clone()));
        }
        if let Some(route) = &self.route {
            labels.push(Label::new("route", route.clone()));
        }
        if let Some(status) = self.status {
            labels.push(Label::new("status", status.to_string()));
        }
        labels
    }
}
