//! Observer callbacks for message outcomes that carry no metric.
//!
//! The handler reports failures, configuration payloads and unknown record
//! types through a [`MessageObserver`]. Every method has a default that logs
//! through `tracing`, so [`LoggingObserver`] is simply the trait with no
//! overrides.

use serde_json::Value;

use crate::error::MessageError;

/// Receives diagnostic events from the message handler.
///
/// Implementations are shared across connections and called synchronously
/// from the connection task, so they must be cheap and non-blocking.
pub trait MessageObserver: Send + Sync + 'static {
    /// A frame failed decoding or metric extraction.
    fn on_failure(&self, error: &MessageError, frame: &[u8]) {
        tracing::error!(
            stage = error.stage(),
            error = %error,
            frame_len = frame.len(),
            "error handling message"
        );
    }

    /// A `configure` record arrived.
    fn on_configure(&self, data: &Value) {
        tracing::info!(config = %data, "received config");
    }

    /// A record with an unrecognised type tag arrived.
    fn on_unknown_type(&self, kind: &str) {
        tracing::warn!(kind, "unknown message type");
    }
}

/// Observer that only logs.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingObserver;

impl MessageObserver for LoggingObserver {}
