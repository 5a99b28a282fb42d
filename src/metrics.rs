//! Metric instruments exposed by the receiver.
//!
//! Instruments are registered once against an explicit
//! [`metrics::Recorder`] and shared through [`GatewayMetrics`]. Nothing here
//! touches the global recorder, so tests can inject a
//! `metrics_util::debugging::DebuggingRecorder` and production code a
//! Prometheus recorder (see [`exporter`]).

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use metrics::{Counter, Gauge, Histogram, Key, KeyName, Level, Metadata, Recorder, Unit};

use crate::message::AttributeSet;

pub mod exporter;

/// Name of the counter tracking accepted connections.
pub const TOTAL_CONNECTIONS: &str = "gateway_total_connections";
/// Name of the gauge tracking live connections.
pub const CURRENT_CONNECTIONS: &str = "gateway_current_connections";
/// Name of the counter tracking attempted frames.
pub const MESSAGES_PROCESSED: &str = "gateway_messages_processed";
/// Name of the counter tracking frames that failed decoding or extraction.
pub const MESSAGES_FAILED: &str = "gateway_messages_failed";
/// Name of the reserved upstream latency histogram.
pub const UPSTREAM_LATENCY: &str = "upstream_latency";
/// Name of the gateway latency histogram.
pub const KONG_LATENCY: &str = "kong_latency";
/// Name of the request latency histogram.
pub const REQUEST_LATENCY: &str = "request_latency";

/// Bucket boundaries shared by every latency histogram.
///
/// The repeated final value is kept as configured.
pub const LATENCY_BOUNDARIES: [f64; 5] = [0.5, 0.9, 0.95, 0.99, 0.99];

/// Names of all latency histograms, in registration order.
pub const LATENCY_HISTOGRAMS: [&str; 3] = [UPSTREAM_LATENCY, KONG_LATENCY, REQUEST_LATENCY];

/// Recorder shared by every instrument.
pub type SharedRecorder = Arc<dyn Recorder + Send + Sync>;

fn metadata() -> Metadata<'static> {
    Metadata::new(module_path!(), Level::INFO, Some(module_path!()))
}

/// A latency histogram recorded both globally and per attribute set.
#[derive(Clone)]
pub struct LatencyHistogram {
    name: &'static str,
    unattributed: Histogram,
    recorder: SharedRecorder,
}

impl LatencyHistogram {
    fn register(recorder: &SharedRecorder, name: &'static str, description: &'static str) -> Self {
        recorder.describe_histogram(
            KeyName::from_const_str(name),
            Some(Unit::Milliseconds),
            description.into(),
        );
        Self {
            name,
            unattributed: recorder.register_histogram(&Key::from_static_name(name), &metadata()),
            recorder: Arc::clone(recorder),
        }
    }

    /// Metric name of this histogram.
    #[must_use]
    pub const fn name(&self) -> &'static str { self.name }

    /// Record `value` once without labels and once labelled with `attributes`.
    pub fn record(&self, value: f64, attributes: &AttributeSet) {
        self.unattributed.record(value);
        let key = Key::from_parts(self.name, attributes.labels());
        self.recorder
            .register_histogram(&key, &metadata())
            .record(value);
    }
}

/// Connection counter and live-connection gauge.
///
/// [`ConnectionTracker::open`] returns a guard; the gauge is decremented when
/// the guard drops, whichever way the connection ended.
pub struct ConnectionTracker {
    total: Counter,
    current: Gauge,
    live: AtomicU64,
}

impl ConnectionTracker {
    fn register(recorder: &SharedRecorder) -> Self {
        recorder.describe_counter(
            KeyName::from_const_str(TOTAL_CONNECTIONS),
            None,
            "Total number of connections to the gateway data server".into(),
        );
        recorder.describe_gauge(
            KeyName::from_const_str(CURRENT_CONNECTIONS),
            None,
            "Current number of connections to the gateway data server".into(),
        );
        Self {
            total: recorder.register_counter(&Key::from_static_name(TOTAL_CONNECTIONS), &metadata()),
            current: recorder.register_gauge(&Key::from_static_name(CURRENT_CONNECTIONS), &metadata()),
            live: AtomicU64::new(0),
        }
    }

    /// Record an accepted connection.
    pub fn open(self: &Arc<Self>) -> ConnectionGuard {
        self.total.increment(1);
        self.current.increment(1.0);
        let live = self.live.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::debug!(live, "connection opened");
        ConnectionGuard {
            tracker: Arc::clone(self),
        }
    }

    /// Number of connections currently open.
    #[must_use]
    pub fn live(&self) -> u64 { self.live.load(Ordering::Acquire) }

    fn close(&self) {
        self.current.decrement(1.0);
        let live = self.live.fetch_sub(1, Ordering::AcqRel) - 1;
        tracing::debug!(live, "connection closed");
    }
}

/// Keeps a connection counted as live until dropped.
#[must_use = "dropping the guard immediately marks the connection as closed"]
pub struct ConnectionGuard {
    tracker: Arc<ConnectionTracker>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) { self.tracker.close(); }
}

/// Every instrument exposed by the receiver.
pub struct GatewayMetrics {
    connections: Arc<ConnectionTracker>,
    messages_processed: Counter,
    messages_failed: Counter,
    upstream_latency: LatencyHistogram,
    kong_latency: LatencyHistogram,
    request_latency: LatencyHistogram,
}

impl GatewayMetrics {
    /// Describe and register all instruments with `recorder`.
    #[must_use]
    pub fn register(recorder: SharedRecorder) -> Self {
        recorder.describe_counter(
            KeyName::from_const_str(MESSAGES_PROCESSED),
            None,
            "Total number of messages processed by the gateway data server".into(),
        );
        recorder.describe_counter(
            KeyName::from_const_str(MESSAGES_FAILED),
            None,
            "Total number of messages failed to be processed by the gateway data server".into(),
        );
        Self {
            connections: Arc::new(ConnectionTracker::register(&recorder)),
            messages_processed: recorder
                .register_counter(&Key::from_static_name(MESSAGES_PROCESSED), &metadata()),
            messages_failed: recorder
                .register_counter(&Key::from_static_name(MESSAGES_FAILED), &metadata()),
            upstream_latency: LatencyHistogram::register(
                &recorder,
                UPSTREAM_LATENCY,
                "Latency of requests to the upstream service",
            ),
            kong_latency: LatencyHistogram::register(
                &recorder,
                KONG_LATENCY,
                "Latency of requests inside of Kong",
            ),
            request_latency: LatencyHistogram::register(
                &recorder,
                REQUEST_LATENCY,
                "Latency of requests, including Kong and upstream service",
            ),
        }
    }

    /// Connection lifecycle instruments.
    #[must_use]
    pub fn connections(&self) -> &Arc<ConnectionTracker> { &self.connections }

    /// Count a frame handed to the message handler.
    pub fn inc_processed(&self) { self.messages_processed.increment(1); }

    /// Count a frame that failed decoding or extraction.
    pub fn inc_failed(&self) { self.messages_failed.increment(1); }

    /// Reserved histogram for upstream latency. Nothing records into it yet.
    #[must_use]
    pub fn upstream_latency(&self) -> &LatencyHistogram { &self.upstream_latency }

    #[must_use]
    pub fn kong_latency(&self) -> &LatencyHistogram { &self.kong_latency }

    #[must_use]
    pub fn request_latency(&self) -> &LatencyHistogram { &self.request_latency }
}
