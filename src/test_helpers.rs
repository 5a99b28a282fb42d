//! Test-only helpers for inspecting recorded metrics and observer events.

use std::sync::{Arc, Mutex, PoisonError};

use metrics::{SharedString, Unit};
use metrics_util::{
    CompositeKey,
    debugging::{DebugValue, DebuggingRecorder, Snapshotter},
};
use serde_json::Value;

use crate::{
    error::MessageError,
    handler::MessageHandler,
    hooks::MessageObserver,
    metrics::GatewayMetrics,
};

type Entry = (CompositeKey, Option<Unit>, Option<SharedString>, DebugValue);

/// Handle for taking snapshots of a [`DebuggingRecorder`].
pub struct MetricsProbe {
    snapshotter: Snapshotter,
}

impl MetricsProbe {
    /// Register [`GatewayMetrics`] against a fresh debugging recorder.
    pub fn register() -> (Arc<GatewayMetrics>, Self) {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        let metrics = Arc::new(GatewayMetrics::register(Arc::new(recorder)));
        (metrics, Self { snapshotter })
    }

    /// Capture the current values. Histogram samples are drained by each
    /// snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            entries: self.snapshotter.snapshot().into_vec(),
        }
    }
}

/// Point-in-time view of every registered metric.
pub struct MetricsSnapshot {
    entries: Vec<Entry>,
}

impl MetricsSnapshot {
    fn find<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Entry> + 'a {
        self.entries
            .iter()
            .filter(move |(key, ..)| key.key().name() == name)
    }

    /// Value of an unlabelled counter, or zero if never registered.
    pub fn counter(&self, name: &str) -> u64 {
        self.find(name)
            .find_map(|(.., value)| match value {
                DebugValue::Counter(c) => Some(*c),
                _ => None,
            })
            .unwrap_or(0)
    }

    /// Value of an unlabelled gauge, or zero if never registered.
    pub fn gauge(&self, name: &str) -> f64 {
        self.find(name)
            .find_map(|(.., value)| match value {
                DebugValue::Gauge(g) => Some(g.into_inner()),
                _ => None,
            })
            .unwrap_or(0.0)
    }

    /// Whether a metric with `name` was registered at all.
    pub fn is_registered(&self, name: &str) -> bool { self.find(name).next().is_some() }

    /// Samples of the histogram `name` carrying exactly `labels`.
    pub fn histogram(&self, name: &str, labels: &[(&str, &str)]) -> Vec<f64> {
        self.find(name)
            .filter(|(key, ..)| {
                let mut actual: Vec<(&str, &str)> =
                    key.key().labels().map(|l| (l.key(), l.value())).collect();
                let mut expected = labels.to_vec();
                actual.sort_unstable();
                expected.sort_unstable();
                actual == expected
            })
            .flat_map(|(.., value)| histogram_samples(value))
            .collect()
    }

    /// Number of samples across every label set of histogram `name`.
    pub fn histogram_count(&self, name: &str) -> usize {
        self.find(name)
            .map(|(.., value)| histogram_samples(value).len())
            .sum()
    }

    /// Every histogram sample in the snapshot, tagged with its metric name.
    pub fn histogram_observations(&self) -> Vec<(String, f64)> {
        self.entries
            .iter()
            .flat_map(|(key, .., value)| {
                let name = key.key().name().to_owned();
                histogram_samples(value)
                    .into_iter()
                    .map(move |sample| (name.clone(), sample))
            })
            .collect()
    }
}

fn histogram_samples(value: &DebugValue) -> Vec<f64> {
    match value {
        DebugValue::Histogram(samples) => samples.iter().map(|s| s.into_inner()).collect(),
        _ => Vec::new(),
    }
}

/// Observer that remembers every event it receives.
#[derive(Default)]
pub struct RecordingObserver {
    failures: Mutex<Vec<String>>,
    configs: Mutex<Vec<Value>>,
    unknown: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn failures(&self) -> usize {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn configs(&self) -> Vec<Value> {
        self.configs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn unknown_types(&self) -> Vec<String> {
        self.unknown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl MessageObserver for RecordingObserver {
    fn on_failure(&self, error: &MessageError, _frame: &[u8]) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(error.to_string());
    }

    fn on_configure(&self, data: &Value) {
        self.configs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(data.clone());
    }

    fn on_unknown_type(&self, kind: &str) {
        self.unknown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(kind.to_owned());
    }
}

/// A handler wired to a debugging recorder and a [`RecordingObserver`].
pub fn handler_with_probe() -> (MessageHandler, MetricsProbe, Arc<RecordingObserver>) {
    let (metrics, probe) = MetricsProbe::register();
    let observer = Arc::new(RecordingObserver::default());
    let handler = MessageHandler::with_observer(metrics, observer.clone());
    (handler, probe, observer)
}
