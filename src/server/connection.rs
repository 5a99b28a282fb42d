//! Connection task spawning for [`GatewayServer`](super::GatewayServer).

use std::net::SocketAddr;

use tokio::net::TcpStream;
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use crate::{
    connection::{CloseReason, Connection},
    handler::MessageHandler,
};

/// Register an accepted stream and spawn the task reading from it.
///
/// The connection is counted before the task starts, so the connection
/// metrics reflect the accept immediately.
pub(super) fn spawn_connection_task(
    stream: TcpStream,
    peer_addr: SocketAddr,
    handler: MessageHandler,
    shutdown: &CancellationToken,
    tracker: &TaskTracker,
) {
    let connection = Connection::open(handler, Some(peer_addr));
    tracing::info!(%peer_addr, "gateway connected");
    let shutdown = shutdown.clone();
    tracker.spawn(async move {
        match connection.run(stream, shutdown).await {
            Ok(CloseReason::Eof) => tracing::info!(%peer_addr, "gateway disconnected"),
            Ok(CloseReason::Shutdown) => {
                tracing::debug!(%peer_addr, "connection closed for shutdown");
            }
            Err(e) => tracing::warn!(%peer_addr, error = %e, "connection error"),
        }
    });
}
