//! Test helpers shared across server modules.

use std::net::{Ipv4Addr, SocketAddr, TcpListener as StdTcpListener};

use rstest::fixture;

use super::{Bound, GatewayServer};
use crate::{handler::MessageHandler, test_helpers::handler_with_probe};

#[fixture]
pub fn handler() -> MessageHandler { handler_with_probe().0 }

#[fixture]
/// Returns a listener bound to a free localhost port.
///
/// Keeping the listener bound prevents another process claiming the port
/// between discovery and use.
pub fn free_listener() -> StdTcpListener {
    let addr = SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 0);
    StdTcpListener::bind(addr).expect("Failed to bind free port listener")
}

#[must_use]
pub fn listener_addr(listener: &StdTcpListener) -> SocketAddr {
    listener
        .local_addr()
        .expect("failed to get listener address")
}

pub fn bind_server(handler: MessageHandler, listener: StdTcpListener) -> GatewayServer<Bound> {
    GatewayServer::new(handler)
        .bind_existing_listener(listener)
        .expect("Failed to bind")
}
