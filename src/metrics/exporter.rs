//! Prometheus exposition of the receiver metrics.

use std::{net::SocketAddr, sync::Arc};

use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusRecorder};

use super::{LATENCY_BOUNDARIES, LATENCY_HISTOGRAMS, SharedRecorder};

/// Builder with the latency bucket boundaries applied to every histogram.
///
/// # Errors
///
/// Returns a [`BuildError`] if the bucket configuration is rejected.
pub fn builder() -> Result<PrometheusBuilder, BuildError> {
    LATENCY_HISTOGRAMS
        .iter()
        .try_fold(PrometheusBuilder::new(), |builder, name| {
            builder.set_buckets_for_metric(Matcher::Full((*name).to_owned()), &LATENCY_BOUNDARIES)
        })
}

/// Build a Prometheus recorder serving scrapes on `addr` and spawn its HTTP
/// listener on the current Tokio runtime.
///
/// # Errors
///
/// Returns a [`BuildError`] if the exporter cannot be configured or the
/// listener cannot be bound.
pub fn serve(addr: SocketAddr) -> Result<SharedRecorder, BuildError> {
    let (recorder, exporter) = builder()?.with_http_listener(addr).build()?;
    tokio::spawn(async move {
        if let Err(e) = exporter.await {
            tracing::error!(error = ?e, "prometheus exporter stopped");
        }
    });
    tracing::info!(%addr, "prometheus exporter listening");
    Ok(Arc::new(recorder))
}

/// Build a recorder without an HTTP listener; render it via its handle.
///
/// # Errors
///
/// Returns a [`BuildError`] if the bucket configuration is rejected.
pub fn detached() -> Result<PrometheusRecorder, BuildError> { Ok(builder()?.build_recorder()) }
