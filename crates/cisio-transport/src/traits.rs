use bytes::Bytes;

use crate::error::Result;

/// Outcome of a blocking receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    /// One complete message, boundaries preserved.
    Message(Bytes),
    /// The peer announced that no further messages will follow.
    EndOfStream,
}

impl Received {
    /// Returns true for the end-of-stream marker.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Received::EndOfStream)
    }
}

/// Receiving half of a point-to-point message transport.
///
/// Implementations deliver whole messages in order and report the peer's
/// end-of-stream marker distinctly from failures.
pub trait MessageSource: Send {
    /// Block until the next message or end-of-stream arrives.
    fn recv(&mut self) -> Result<Received>;

    /// Short transport name for diagnostics.
    fn transport_name(&self) -> &'static str;
}

/// Sending half of a point-to-point message transport.
pub trait MessageSink: Send {
    /// Hand one message to the transport (blocks until accepted).
    fn send(&mut self, payload: &[u8]) -> Result<()>;

    /// Tell the peer that no further messages will follow.
    fn send_eof(&mut self) -> Result<()>;

    /// Flush and release transport resources.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    /// Short transport name for diagnostics.
    fn transport_name(&self) -> &'static str;
}

impl<T: MessageSource + ?Sized> MessageSource for Box<T> {
    fn recv(&mut self) -> Result<Received> {
        (**self).recv()
    }

    fn transport_name(&self) -> &'static str {
        (**self).transport_name()
    }
}

impl<T: MessageSink + ?Sized> MessageSink for Box<T> {
    fn send(&mut self, payload: &[u8]) -> Result<()> {
        (**self).send(payload)
    }

    fn send_eof(&mut self) -> Result<()> {
        (**self).send_eof()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn transport_name(&self) -> &'static str {
        (**self).transport_name()
    }
}
