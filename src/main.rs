//! Gateway telemetry receiver.
//!
//! Serves Prometheus metrics and accepts gateway data connections until
//! Ctrl+C is received.

mod cli;

use std::{net::SocketAddr, sync::Arc};

use clap::Parser;
use gateway_telemetry::{
    metrics::{GatewayMetrics, exporter},
    server::GatewayServer,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let cli = cli::Cli::parse();
    let recorder = exporter::serve(SocketAddr::new(cli.host, cli.prometheus_port))?;
    let metrics = Arc::new(GatewayMetrics::register(recorder));

    GatewayServer::with_metrics(metrics)
        .bind(SocketAddr::new(cli.host, cli.port))?
        .run()
        .await?;

    Ok(())
}
