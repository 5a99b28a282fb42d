//! Command line interface for the `gateway-telemetry` binary.
//!
//! Every option can also be supplied through the environment, matching the
//! variables gateway deployments already set.

use std::net::{IpAddr, Ipv4Addr};

use clap::Parser;

/// Port on which gateways deliver their data when none is configured.
pub const DEFAULT_GATEWAY_PORT: u16 = 5000;
/// Port serving the Prometheus scrape endpoint when none is configured.
pub const DEFAULT_PROMETHEUS_PORT: u16 = 9464;

/// Command line arguments for the `gateway-telemetry` binary.
#[derive(Debug, Parser)]
#[command(
    name = "gateway-telemetry",
    version,
    about = "Receive newline-delimited gateway events and expose latency metrics"
)]
pub struct Cli {
    /// TCP port accepting gateway data connections.
    #[arg(long, env = "GATEWAY_PORT", default_value_t = DEFAULT_GATEWAY_PORT)]
    pub port: u16,

    /// TCP port serving Prometheus metrics.
    #[arg(long, env = "PROMETHEUS_PORT", default_value_t = DEFAULT_PROMETHEUS_PORT)]
    pub prometheus_port: u16,

    /// Address both listeners bind to.
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,
}
