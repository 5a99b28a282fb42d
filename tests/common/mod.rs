//! Shared utilities for integration tests.
//!
//! Starts a [`GatewayServer`] on a free localhost port with a debugging
//! recorder, and forwards observer events over a channel so tests can wait
//! for frames to be handled.

// Items in this shared module may not be used by all test binaries that import it.
#![allow(
    dead_code,
    reason = "shared test utilities are not used by all test binaries"
)]

use std::{
    net::{Ipv4Addr, SocketAddr, TcpListener as StdTcpListener},
    sync::Arc,
    time::Duration,
};

use gateway_telemetry::{
    GatewayMetrics,
    GatewayServer,
    MessageError,
    MessageHandler,
    MessageObserver,
    ServerError,
};
use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use serde_json::Value;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::{sleep, timeout},
};

/// Events reported by the message handler.
#[derive(Debug, PartialEq)]
pub enum Observed {
    Failure,
    Configure(Value),
    Unknown(String),
}

struct ChannelObserver(mpsc::UnboundedSender<Observed>);

impl MessageObserver for ChannelObserver {
    fn on_failure(&self, _error: &MessageError, _frame: &[u8]) {
        let _ = self.0.send(Observed::Failure);
    }

    fn on_configure(&self, data: &Value) { let _ = self.0.send(Observed::Configure(data.clone())); }

    fn on_unknown_type(&self, kind: &str) { let _ = self.0.send(Observed::Unknown(kind.to_owned())); }
}

/// A running server plus the handles tests need to inspect it.
pub struct TestServer {
    pub addr: SocketAddr,
    pub events: mpsc::UnboundedReceiver<Observed>,
    snapshotter: Snapshotter,
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<(), ServerError>>,
}

impl TestServer {
    /// Bind to a free port and start serving.
    pub async fn start() -> Self {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        let metrics = Arc::new(GatewayMetrics::register(Arc::new(recorder)));
        let (tx, events) = mpsc::unbounded_channel();
        let handler = MessageHandler::with_observer(metrics, Arc::new(ChannelObserver(tx)));

        let listener = StdTcpListener::bind(SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 0))
            .expect("failed to bind port");
        let (ready_tx, ready_rx) = oneshot::channel();
        let server = GatewayServer::new(handler)
            .ready_signal(ready_tx)
            .bind_existing_listener(listener)
            .expect("bind server");
        let addr = server.local_addr().expect("server address");

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(server.run_with_shutdown(async {
            let _ = stop_rx.await;
        }));
        ready_rx.await.expect("server failed to start");

        Self {
            addr,
            events,
            snapshotter,
            stop: Some(stop_tx),
            handle,
        }
    }

    /// Wait for the next observer event.
    pub async fn next_event(&mut self) -> Observed {
        timeout(Duration::from_secs(2), self.events.recv())
            .await
            .expect("timed out waiting for observer event")
            .expect("observer channel closed")
    }

    /// Capture current metric values. Histogram samples are drained.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot(
            self.snapshotter
                .snapshot()
                .into_vec()
                .into_iter()
                .map(|(key, _, _, value)| {
                    let labels = key
                        .key()
                        .labels()
                        .map(|l| (l.key().to_owned(), l.value().to_owned()))
                        .collect();
                    (key.key().name().to_owned(), labels, value)
                })
                .collect(),
        )
    }

    /// Poll until the live-connection gauge equals `expected`.
    pub async fn wait_for_gauge(&self, name: &str, expected: f64) {
        for _ in 0..400 {
            if (self.snapshot().gauge(name) - expected).abs() < f64::EPSILON {
                return;
            }
            sleep(Duration::from_millis(5)).await;
        }
        panic!("{name} never reached {expected}");
    }

    /// Stop the server and wait for it to finish.
    pub async fn stop(mut self) -> Snapshot {
        if let Some(tx) = self.stop.take() {
            let _ = tx.send(());
        }
        timeout(Duration::from_secs(2), &mut self.handle)
            .await
            .expect("server did not stop in time")
            .expect("join server task")
            .expect("server run failed");
        self.snapshot()
    }
}

/// Metric values keyed by name and labels.
pub struct Snapshot(Vec<(String, Vec<(String, String)>, DebugValue)>);

impl Snapshot {
    pub fn counter(&self, name: &str) -> u64 {
        self.0
            .iter()
            .find_map(|(n, _, v)| match v {
                DebugValue::Counter(c) if n == name => Some(*c),
                _ => None,
            })
            .unwrap_or(0)
    }

    pub fn gauge(&self, name: &str) -> f64 {
        self.0
            .iter()
            .find_map(|(n, _, v)| match v {
                DebugValue::Gauge(g) if n == name => Some(g.into_inner()),
                _ => None,
            })
            .unwrap_or(0.0)
    }

    /// Samples of histogram `name` whose label set is exactly `labels`.
    pub fn histogram(&self, name: &str, labels: &[(&str, &str)]) -> Vec<f64> {
        let mut expected: Vec<(String, String)> = labels
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        expected.sort();
        self.0
            .iter()
            .filter(|(n, l, _)| {
                let mut actual = l.clone();
                actual.sort();
                n == name && actual == expected
            })
            .flat_map(|(_, _, v)| match v {
                DebugValue::Histogram(samples) => samples.iter().map(|s| s.into_inner()).collect::<Vec<f64>>(),
                _ => Vec::new(),
            })
            .collect()
    }

    pub fn has_metric(&self, name: &str) -> bool { self.0.iter().any(|(n, ..)| n == name) }
}
