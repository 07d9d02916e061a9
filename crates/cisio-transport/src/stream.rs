use std::io::{Read, Write};
use std::net::Shutdown;
use std::time::Duration;

use crate::error::Result;

/// A connected byte stream between two processes.
///
/// On Unix this wraps a Unix domain socket stream. Framing on top of it lives
/// in `cisio-frame`.
pub struct IpcStream {
    inner: IpcStreamInner,
}

enum IpcStreamInner {
    #[cfg(unix)]
    Unix(std::os::unix::net::UnixStream),
}

impl Read for IpcStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for IpcStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(stream) => stream.flush(),
        }
    }
}

impl IpcStream {
    /// Wrap an already connected Unix domain socket stream.
    #[cfg(unix)]
    pub fn from_unix(stream: std::os::unix::net::UnixStream) -> Self {
        Self {
            inner: IpcStreamInner::Unix(stream),
        }
    }

    /// Set read timeout on the underlying stream.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(stream) => stream.set_read_timeout(timeout).map_err(Into::into),
        }
    }

    /// Set write timeout on the underlying stream.
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> Result<()> {
        match &self.inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(stream) => stream.set_write_timeout(timeout).map_err(Into::into),
        }
    }

    /// Close the write half so the peer observes EOF on its read side.
    pub fn shutdown_write(&self) -> Result<()> {
        match &self.inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(stream) => stream.shutdown(Shutdown::Write).map_err(Into::into),
        }
    }

    /// Try to clone this stream (creates a new file descriptor).
    pub fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(stream) => {
                let cloned = stream.try_clone()?;
                Ok(Self::from_unix(cloned))
            }
        }
    }
}

impl std::fmt::Debug for IpcStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.inner {
            #[cfg(unix)]
            IpcStreamInner::Unix(_) => f.debug_struct("IpcStream").field("type", &"unix").finish(),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn shutdown_write_signals_eof_to_peer() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut writer = IpcStream::from_unix(left);
        let mut reader = IpcStream::from_unix(right);

        writer.write_all(b"bye").unwrap();
        writer.shutdown_write().unwrap();

        let mut received = Vec::new();
        reader.read_to_end(&mut received).unwrap();
        assert_eq!(received, b"bye");
    }

    #[test]
    fn cloned_stream_shares_connection() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let stream = IpcStream::from_unix(left);
        let mut clone = stream.try_clone().unwrap();
        let mut peer = IpcStream::from_unix(right);

        clone.write_all(b"x").unwrap();
        let mut buf = [0u8; 1];
        peer.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"x");
        assert_eq!(format!("{stream:?}"), "IpcStream { type: \"unix\" }");
    }
}
