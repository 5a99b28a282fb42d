//! Newline-delimited framing for the gateway data stream.
//!
//! Gateways write one JSON record per line. [`LineFrameDecoder`] splits the
//! raw byte stream on a single `\n` byte and yields each line, without the
//! delimiter, as an immutable [`Bytes`] frame. Bytes following the last
//! delimiter stay in the buffer until more data arrives.
//!
//! No maximum frame length is enforced and no `\r` stripping or UTF-8
//! validation happens at this layer; the message handler deals with the
//! content of each frame.

use std::io;

use bytes::{Bytes, BytesMut};
use tokio_util::codec::Decoder;

/// Byte terminating every frame on the wire.
pub const FRAME_DELIMITER: u8 = b'\n';

/// Splits an accumulating byte buffer into `\n`-terminated frames.
///
/// The decoder remembers how much of the buffered residue it has already
/// scanned so that a long partial frame is not rescanned on every read.
///
/// ```
/// use bytes::BytesMut;
/// use gateway_telemetry::codec::LineFrameDecoder;
/// use tokio_util::codec::Decoder;
///
/// let mut decoder = LineFrameDecoder::new();
/// let mut buf = BytesMut::from(&b"{\"type\":\"log\"}\n{\"ty"[..]);
/// let frame = decoder.decode(&mut buf).unwrap().unwrap();
/// assert_eq!(&frame[..], b"{\"type\":\"log\"}");
/// assert!(decoder.decode(&mut buf).unwrap().is_none());
/// assert_eq!(&buf[..], b"{\"ty");
/// ```
#[derive(Clone, Debug, Default)]
pub struct LineFrameDecoder {
    scanned: usize,
}

impl LineFrameDecoder {
    /// Create a decoder with no scan progress.
    #[must_use]
    pub const fn new() -> Self { Self { scanned: 0 } }

    /// Extract the next complete frame from `buf`, if any.
    ///
    /// The frame and its delimiter are removed from `buf`; any residue is
    /// left in place.
    pub fn next_frame(&mut self, buf: &mut BytesMut) -> Option<Bytes> {
        let start = self.scanned.min(buf.len());
        match buf[start..].iter().position(|b| *b == FRAME_DELIMITER) {
            Some(offset) => {
                let end = start + offset;
                let mut line = buf.split_to(end + 1);
                line.truncate(end);
                self.scanned = 0;
                Some(line.freeze())
            }
            None => {
                self.scanned = buf.len();
                None
            }
        }
    }

    /// Discard unterminated residue left in `buf` when the stream ends.
    ///
    /// Returns the number of bytes dropped.
    pub fn discard_residue(&mut self, buf: &mut BytesMut) -> usize {
        let dropped = buf.len();
        buf.clear();
        self.scanned = 0;
        dropped
    }
}

impl Decoder for LineFrameDecoder {
    type Item = Bytes;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Ok(self.next_frame(src))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(frame) = self.next_frame(src) {
            return Ok(Some(frame));
        }
        let dropped = self.discard_residue(src);
        if dropped > 0 {
            tracing::debug!(bytes = dropped, "discarding unterminated frame at end of stream");
        }
        Ok(None)
    }
}
