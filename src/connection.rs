//! Per-connection read loop.
//!
//! A [`Connection`] owns the byte accumulator for one socket. Each read
//! appends to the accumulator and every complete frame is handed to the
//! [`MessageHandler`] before the next read, so frames from one connection
//! are always handled in arrival order.

use std::{io, net::SocketAddr};

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;

use crate::{codec::LineFrameDecoder, handler::MessageHandler, metrics::ConnectionGuard};

/// Spare capacity reserved in the accumulator before each read.
const READ_CAPACITY: usize = 8 * 1024;

/// How a connection's read loop ended without a transport error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseReason {
    /// The peer closed its write half.
    Eof,
    /// The server is shutting down.
    Shutdown,
}

/// State of one accepted connection.
///
/// The connection is counted as live from [`Connection::open`] until it is
/// dropped.
pub struct Connection {
    buffer: BytesMut,
    decoder: LineFrameDecoder,
    handler: MessageHandler,
    peer_addr: Option<SocketAddr>,
    _guard: ConnectionGuard,
}

impl Connection {
    /// Register a newly accepted connection.
    #[must_use]
    pub fn open(handler: MessageHandler, peer_addr: Option<SocketAddr>) -> Self {
        let guard = handler.metrics().connections().open();
        Self {
            buffer: BytesMut::new(),
            decoder: LineFrameDecoder::new(),
            handler,
            peer_addr,
            _guard: guard,
        }
    }

    /// Address of the remote peer, if known.
    #[must_use]
    pub const fn peer_addr(&self) -> Option<SocketAddr> { self.peer_addr }

    /// Number of bytes waiting for a delimiter.
    #[must_use]
    pub fn buffered(&self) -> usize { self.buffer.len() }

    /// Append `chunk` and handle every frame it completes.
    ///
    /// Returns the number of frames handled.
    pub fn on_bytes(&mut self, chunk: &[u8]) -> usize {
        self.buffer.extend_from_slice(chunk);
        self.drain_frames()
    }

    fn drain_frames(&mut self) -> usize {
        let mut handled = 0;
        while let Some(frame) = self.decoder.next_frame(&mut self.buffer) {
            self.handler.handle_frame(&frame);
            handled += 1;
        }
        handled
    }

    fn discard_residue(&mut self) {
        let dropped = self.decoder.discard_residue(&mut self.buffer);
        if dropped > 0 {
            tracing::debug!(
                peer_addr = ?self.peer_addr,
                bytes = dropped,
                "discarding unterminated frame"
            );
        }
    }

    /// Read from `stream` until end of stream or `shutdown` is cancelled.
    ///
    /// Unterminated bytes left at the end are discarded.
    ///
    /// # Errors
    ///
    /// Returns the transport error that ended the connection.
    pub async fn run<R>(mut self, mut stream: R, shutdown: CancellationToken) -> io::Result<CloseReason>
    where
        R: AsyncRead + Unpin,
    {
        loop {
            self.buffer.reserve(READ_CAPACITY);
            let read = tokio::select! {
                biased;

                () = shutdown.cancelled() => {
                    self.discard_residue();
                    return Ok(CloseReason::Shutdown);
                }
                res = stream.read_buf(&mut self.buffer) => res?,
            };
            if read == 0 {
                self.discard_residue();
                return Ok(CloseReason::Eof);
            }
            self.drain_frames();
        }
    }
}
