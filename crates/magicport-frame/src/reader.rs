use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};

use crate::codec::{decode_header, FrameConfig, HEADER_SIZE};
use crate::error::{FrameError, Result};

const DRAIN_CHUNK_SIZE: usize = 4 * 1024;

/// Outcome of reading one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A complete payload within the configured limit.
    Frame(Bytes),
    /// A frame whose declared length exceeded the limit. Its payload has
    /// already been read and discarded.
    Oversized { declared: usize },
}

/// Reads complete frames from any `Read` stream.
///
/// Partial reads are retried internally; callers always get complete frames.
/// The reader never consumes bytes past the end of the current frame.
pub struct FrameReader<T> {
    inner: T,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self { inner, config }
    }

    /// Read the next frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when the stream ends before
    /// a full header or a full payload has been read.
    pub fn read_frame(&mut self) -> Result<Inbound> {
        let mut header = [0u8; HEADER_SIZE];
        self.fill(&mut header)?;
        let len = decode_header(header);

        if len > self.config.max_payload_size {
            self.discard(len)?;
            tracing::debug!(
                declared = len,
                max = self.config.max_payload_size,
                "drained oversized frame"
            );
            return Ok(Inbound::Oversized { declared: len });
        }

        let mut payload = BytesMut::zeroed(len);
        self.fill(&mut payload)?;
        tracing::trace!(size = len, "frame received");
        Ok(Inbound::Frame(payload.freeze()))
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0usize;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        Ok(())
    }

    fn discard(&mut self, mut remaining: usize) -> Result<()> {
        let mut chunk = [0u8; DRAIN_CHUNK_SIZE];
        while remaining > 0 {
            let want = remaining.min(chunk.len());
            match self.inner.read(&mut chunk[..want]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => remaining -= n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        Ok(())
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}
