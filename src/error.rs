//! Per-message error types.
//!
//! A [`MessageError`] never closes a connection. The handler counts it in
//! `gateway_messages_failed`, hands it to the observer and moves on to the
//! next frame.

use thiserror::Error;

/// Reasons a single frame could not be turned into metrics.
#[derive(Debug, Error)]
pub enum MessageError {
    /// The frame is not a JSON object carrying a string `type` field.
    #[error("malformed record: {0}")]
    Malformed(#[source] serde_json::Error),

    /// A `log` record lacks the structure needed for metric extraction.
    #[error("invalid log payload: {0}")]
    InvalidLogPayload(#[source] serde_json::Error),
}

impl MessageError {
    /// Short label naming the failure stage, used in log fields.
    #[must_use]
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "decode",
            Self::InvalidLogPayload(_) => "extract",
        }
    }
}
