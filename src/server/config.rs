//! Builder methods and listener binding for [`GatewayServer`].

use std::{
    net::{SocketAddr, TcpListener as StdTcpListener},
    sync::Arc,
};

use tokio::{net::TcpListener, sync::oneshot};

use super::{BackoffConfig, Bound, GatewayServer, ServerError, ServerState, Unbound};
use crate::{handler::MessageHandler, metrics::GatewayMetrics};

impl GatewayServer<Unbound> {
    /// Create an unbound server dispatching frames to `handler`.
    #[must_use]
    pub fn new(handler: MessageHandler) -> Self {
        Self {
            handler,
            ready_tx: None,
            backoff_config: BackoffConfig::default(),
            state: Unbound,
        }
    }

    /// Create an unbound server with a logging-only handler over `metrics`.
    #[must_use]
    pub fn with_metrics(metrics: Arc<GatewayMetrics>) -> Self { Self::new(MessageHandler::new(metrics)) }

    /// Return `None` as the server is not bound.
    #[must_use]
    pub const fn local_addr(&self) -> Option<SocketAddr> { None }

    /// Bind to `addr`.
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
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let metrics = Arc::new(GatewayMetrics::register(Arc::new(
    ///     metrics::NoopRecorder,
    /// )));
    /// let server = GatewayServer::with_metrics(metrics)
    ///     .bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))
    ///     .expect("bind failed");
    /// assert!(server.local_addr().is_some());
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if binding or configuring the listener
    /// fails.
    pub fn bind(self, addr: SocketAddr) -> Result<GatewayServer<Bound>, ServerError> {
        let std_listener = StdTcpListener::bind(addr).map_err(ServerError::Bind)?;
        self.bind_existing_listener(std_listener)
    }

    /// Take over an already bound standard listener.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the listener cannot be switched to
    /// non-blocking mode or registered with the runtime.
    pub fn bind_existing_listener(
        self,
        std_listener: StdTcpListener,
    ) -> Result<GatewayServer<Bound>, ServerError> {
        let GatewayServer {
            handler,
            ready_tx,
            backoff_config,
            ..
        } = self;

        std_listener
            .set_nonblocking(true)
            .map_err(ServerError::Bind)?;
        let listener = TcpListener::from_std(std_listener).map_err(ServerError::Bind)?;

        Ok(GatewayServer {
            handler,
            ready_tx,
            backoff_config,
            state: Bound { listener },
        })
    }
}

impl GatewayServer<Bound> {
    /// Returns the bound address, or `None` if retrieving it fails.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> { self.state.listener.local_addr().ok() }
}

impl<S> GatewayServer<S>
where
    S: ServerState,
{
    /// Signal `tx` once the accept loop has started.
    #[must_use]
    pub fn ready_signal(mut self, tx: oneshot::Sender<()>) -> Self {
        self.ready_tx = Some(tx);
        self
    }

    /// Configure back-off applied after failed `accept()` calls.
    #[must_use]
    pub fn accept_backoff(mut self, config: BackoffConfig) -> Self {
        self.backoff_config = config.normalized();
        self
    }

    /// Current accept back-off configuration.
    #[must_use]
    pub const fn backoff_config(&self) -> BackoffConfig { self.backoff_config }

    /// Handler shared by every connection.
    #[must_use]
    pub const fn handler(&self) -> &MessageHandler { &self.handler }
}
