//! Per-frame message handling.
//!
//! [`MessageHandler::handle_frame`] counts every frame, decodes it, and
//! dispatches on the record type. Failures are contained to the frame that
//! caused them.

use std::sync::Arc;

use crate::{
    error::MessageError,
    hooks::{LoggingObserver, MessageObserver},
    message::{LogPayload, MessageType, Record},
    metrics::GatewayMetrics,
};

/// What happened to a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    /// A `log` record whose latencies were recorded.
    Log,
    /// A `configure` record passed to the observer.
    Configure,
    /// A record with an unrecognised type tag.
    Unknown,
    /// The frame failed decoding or metric extraction.
    Failed,
}

/// Turns frames into metric observations.
///
/// One handler is shared by all connections.
#[derive(Clone)]
pub struct MessageHandler {
    metrics: Arc<GatewayMetrics>,
    observer: Arc<dyn MessageObserver>,
}

impl MessageHandler {
    /// Create a handler that reports through [`LoggingObserver`].
    #[must_use]
    pub fn new(metrics: Arc<GatewayMetrics>) -> Self {
        Self::with_observer(metrics, Arc::new(LoggingObserver))
    }

    /// Create a handler reporting to a custom observer.
    #[must_use]
    pub fn with_observer(metrics: Arc<GatewayMetrics>, observer: Arc<dyn MessageObserver>) -> Self {
        Self { metrics, observer }
    }

    /// Instruments this handler records into.
    #[must_use]
    pub fn metrics(&self) -> &Arc<GatewayMetrics> { &self.metrics }

    /// Process one frame.
    ///
    /// The processed counter is incremented before decoding, so it counts
    /// attempts rather than successes.
    pub fn handle_frame(&self, frame: &[u8]) -> Disposition {
        self.metrics.inc_processed();
        match self.dispatch(frame) {
            Ok(disposition) => disposition,
            Err(error) => {
                self.metrics.inc_failed();
                self.observer.on_failure(&error, frame);
                Disposition::Failed
            }
        }
    }

    fn dispatch(&self, frame: &[u8]) -> Result<Disposition, MessageError> {
        let record = Record::from_frame(frame)?;
        match record.message_type() {
            MessageType::Log => {
                let payload = LogPayload::from_data(record.data)?;
                self.record_latencies(&payload);
                Ok(Disposition::Log)
            }
            MessageType::Configure => {
                self.observer.on_configure(&record.data);
                Ok(Disposition::Configure)
            }
            MessageType::Unknown(kind) => {
                self.observer.on_unknown_type(kind);
                Ok(Disposition::Unknown)
            }
        }
    }

    fn record_latencies(&self, payload: &LogPayload) {
        let attributes = payload.attributes();
        if let Some(kong) = payload.latencies.kong_observation() {
            self.metrics.kong_latency().record(kong, &attributes);
        }
        if let Some(request) = payload.latencies.request_observation() {
            self.metrics.request_latency().record(request, &attributes);
        }
    }
}
