use std::io::{ErrorKind, Read};

use bytes::{Buf, BytesMut};
use cisio_transport::{IpcStream, MessageSource, Received, TransportError};
use tracing::{trace, warn};

use crate::codec::{decode_frame, Frame, FrameConfig, FrameKind, HEADER_SIZE};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete frames from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete frames.
/// A rejected frame (too large, unknown kind) is skipped on the next read so
/// the stream stays aligned on frame boundaries.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
    skip: usize,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            skip: 0,
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when the stream ends
    /// between frames and `Err(FrameError::Truncated)` when it ends inside one.
    pub fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if self.skip > 0 {
                let n = self.skip.min(self.buf.len());
                self.buf.advance(n);
                self.skip -= n;
            }

            if self.skip == 0 {
                match decode_frame(&mut self.buf, self.config.max_payload_size) {
                    Ok(Some(frame)) => return Ok(frame),
                    Ok(None) => {}
                    Err(err) => {
                        if let FrameError::PayloadTooLarge { size: len, .. }
                        | FrameError::UnknownKind { len, .. } = err
                        {
                            warn!(len, "skipping rejected frame");
                            self.skip = HEADER_SIZE + len;
                        }
                        return Err(err);
                    }
                }
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                if self.buf.is_empty() && self.skip == 0 {
                    return Err(FrameError::ConnectionClosed);
                }
                return Err(FrameError::Truncated {
                    buffered: self.buf.len(),
                });
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
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

impl FrameReader<IpcStream> {
    /// Create a frame reader for `IpcStream` and apply read timeout from config.
    pub fn with_config_ipc(
        inner: IpcStream,
        config: FrameConfig,
    ) -> std::result::Result<Self, TransportError> {
        inner.set_read_timeout(config.read_timeout)?;
        Ok(Self::with_config(inner, config))
    }
}

impl<T: Read + Send> MessageSource for FrameReader<T> {
    fn recv(&mut self) -> std::result::Result<Received, TransportError> {
        let frame = self.read_frame()?;
        trace!(kind = ?frame.kind, len = frame.payload.len(), "frame received");
        Ok(match frame.kind {
            FrameKind::Data => Received::Message(frame.payload),
            FrameKind::EndOfStream => Received::EndOfStream,
        })
    }

    fn transport_name(&self) -> &'static str {
        "framed-stream"
    }
}
