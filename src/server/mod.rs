//! Tokio-based TCP server for gateway data.
//!
//! [`GatewayServer`] accepts connections on a single listener and spawns one
//! task per connection. Each task owns its [`Connection`](crate::connection::Connection)
//! state and feeds frames to the shared [`MessageHandler`].

use tokio::{net::TcpListener, sync::oneshot};

use crate::handler::MessageHandler;

/// TCP server feeding gateway data to a [`MessageHandler`].
///
/// The type parameter tracks whether a listener has been bound, so
/// [`run`](GatewayServer::run) is only available on bound servers.
pub struct GatewayServer<S = Unbound>
where
    S: ServerState,
{
    pub(crate) handler: MessageHandler,
    pub(crate) ready_tx: Option<oneshot::Sender<()>>,
    pub(crate) backoff_config: BackoffConfig,
    pub(crate) state: S,
}

/// Marker for a server without a listener.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbound;

/// A server holding a bound listener.
#[derive(Debug)]
pub struct Bound {
    pub(crate) listener: TcpListener,
}

/// Binding state of a [`GatewayServer`].
pub trait ServerState: sealed::Sealed {}

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Unbound {}
    impl Sealed for super::Bound {}
}

impl ServerState for Unbound {}
impl ServerState for Bound {}

mod config;
mod connection;
pub mod error;
mod runtime;

pub use error::ServerError;
pub use runtime::BackoffConfig;

#[cfg(test)]
pub(crate) mod test_util;
