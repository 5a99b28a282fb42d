#![doc(html_root_url = "https://docs.rs/gateway-telemetry/latest")]
//! Receiver for API gateway telemetry.
//!
//! Gateways open long-lived TCP connections and stream newline-delimited
//! JSON records. Each record is decoded, classified by its `type` tag and,
//! for request logs, turned into latency histogram observations. Connection
//! and message counts are exported alongside.

pub mod codec;
pub mod connection;
pub mod error;
pub mod handler;
pub mod hooks;
pub mod message;
pub mod metrics;
pub mod server;
#[cfg(test)]
pub(crate) mod test_helpers;

pub use codec::{FRAME_DELIMITER, LineFrameDecoder};
pub use connection::{CloseReason, Connection};
pub use error::MessageError;
pub use handler::{Disposition, MessageHandler};
pub use hooks::{LoggingObserver, MessageObserver};
pub use self::metrics::GatewayMetrics;
pub use server::{GatewayServer, ServerError};
