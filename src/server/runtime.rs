//! Runtime control for [`GatewayServer`].

mod accept;
mod backoff;

pub(super) use accept::{AcceptLoopOptions, accept_loop};
pub use backoff::BackoffConfig;
use futures::Future;
use log::warn;
use tokio::{select, signal};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use super::{Bound, GatewayServer, ServerError};

impl GatewayServer<Bound> {
    /// Run the server until Ctrl+C is received.
    ///
    /// # Errors
    ///
    /// Accept failures are retried with exponential back-off and do not
    /// surface as errors; the signature leaves room for fatal listener
    /// failures.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(async {
            let _ = signal::ctrl_c().await;
        })
        .await
    }

    /// Run the server until the `shutdown` future resolves.
    ///
    /// On shutdown the accept loop stops and every open connection is
    /// closed; the call returns once all connection tasks have finished.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::{
    ///     net::{Ipv4Addr, SocketAddr},
    ///     sync::Arc,
    /// };
    ///
    /// use gateway_telemetry::{metrics::GatewayMetrics, server::GatewayServer};
    /// use tokio::sync::oneshot;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), gateway_telemetry::server::ServerError> {
    /// let metrics = Arc::new(GatewayMetrics::register(Arc::new(metrics::NoopRecorder)));
    /// let server =
    ///     GatewayServer::with_metrics(metrics).bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))?;
    ///
    /// let (tx, rx) = oneshot::channel::<()>();
    /// let handle = tokio::spawn(server.run_with_shutdown(async {
    ///     let _ = rx.await;
    /// }));
    ///
    /// let _ = tx.send(());
    /// handle.await.expect("join server task")?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// See [`GatewayServer::run`].
    pub async fn run_with_shutdown<S>(self, shutdown: S) -> Result<(), ServerError>
    where
        S: Future<Output = ()> + Send,
    {
        let GatewayServer {
            handler,
            ready_tx,
            backoff_config,
            state: Bound { listener },
        } = self;
        let shutdown_token = CancellationToken::new();
        let tracker = TaskTracker::new();

        match listener.local_addr() {
            Ok(addr) => tracing::info!(%addr, "gateway data server listening"),
            Err(e) => warn!("failed to read listener address: error={e}"),
        }

        tracker.spawn(accept_loop(
            listener,
            handler,
            AcceptLoopOptions {
                shutdown: shutdown_token.clone(),
                tracker: tracker.clone(),
                backoff: backoff_config,
            },
        ));

        if let Some(tx) = ready_tx
            && tx.send(()).is_err()
        {
            warn!("Failed to send readiness signal: receiver dropped");
        }

        select! {
            () = shutdown => shutdown_token.cancel(),
            () = tracker.wait() => {},
        }

        tracker.close();
        tracker.wait().await;
        tracing::info!("gateway data server stopped");
        Ok(())
    }
}
