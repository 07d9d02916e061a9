//! State shared by every endpoint kind.

use bytes::Bytes;
use cisio_transport::{MessageSink, MessageSource, Received};
use tracing::{debug, trace};

use crate::config::ChannelConfig;
use crate::error::{ChannelError, Result};

/// Lifecycle of an endpoint.
///
/// `Drained` means end-of-stream was observed (inputs) or sent (outputs).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Open,
    Drained,
    Closed,
}

/// An endpoint that yields items until end-of-stream.
pub trait Receive {
    type Item;

    fn receive(&mut self) -> Result<Self::Item>;
}

/// An endpoint that accepts items and can signal end-of-stream.
pub trait Deliver {
    type Item: ?Sized;

    fn deliver(&mut self, item: &Self::Item) -> Result<()>;

    fn send_eof(&mut self) -> Result<()>;

    /// Send end-of-stream if still open, then release the transport.
    fn close(&mut self) -> Result<()>;
}

/// Iterator over received items, ending at end-of-stream.
///
/// Per-message errors ([`ChannelError::is_recoverable`]) are yielded and
/// iteration continues; any other error is yielded once and ends it.
pub struct Incoming<'a, R> {
    endpoint: &'a mut R,
    done: bool,
}

impl<'a, R: Receive> Incoming<'a, R> {
    pub(crate) fn new(endpoint: &'a mut R) -> Self {
        Self {
            endpoint,
            done: false,
        }
    }
}

impl<R: Receive> Iterator for Incoming<'_, R> {
    type Item = Result<R::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.endpoint.receive() {
            Ok(item) => Some(Ok(item)),
            Err(err) if err.is_end_of_stream() => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = !err.is_recoverable();
                Some(Err(err))
            }
        }
    }
}

pub(crate) struct InputCore<S> {
    name: String,
    source: S,
    state: ChannelState,
    max_message_size: usize,
}

impl<S: MessageSource> InputCore<S> {
    pub(crate) fn new(name: String, source: S, config: &ChannelConfig) -> Self {
        debug!(channel = %name, transport = source.transport_name(), "input opened");
        Self {
            name,
            source,
            state: ChannelState::Open,
            max_message_size: config.max_message_size,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn state(&self) -> ChannelState {
        self.state
    }

    pub(crate) fn source(&self) -> &S {
        &self.source
    }

    pub(crate) fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub(crate) fn end_of_stream(&self) -> ChannelError {
        ChannelError::EndOfStream {
            channel: self.name.clone(),
        }
    }

    /// Fail if the endpoint is closed. Drained inputs pass: their next
    /// receive reports end-of-stream.
    pub(crate) fn check_open(&self) -> Result<()> {
        if self.state == ChannelState::Closed {
            return Err(ChannelError::Closed {
                channel: self.name.clone(),
            });
        }
        Ok(())
    }

    /// Receive one raw message.
    pub(crate) fn recv_message(&mut self) -> Result<Bytes> {
        self.check_open()?;
        if self.state == ChannelState::Drained {
            return Err(self.end_of_stream());
        }
        match self.source.recv()? {
            Received::Message(payload) => {
                trace!(channel = %self.name, len = payload.len(), "message received");
                if payload.len() > self.max_message_size {
                    return Err(ChannelError::Overflow(format!(
                        "message of {} bytes exceeds limit {}",
                        payload.len(),
                        self.max_message_size
                    )));
                }
                Ok(payload)
            }
            Received::EndOfStream => {
                debug!(channel = %self.name, "end of stream received");
                self.state = ChannelState::Drained;
                Err(self.end_of_stream())
            }
        }
    }

    pub(crate) fn close(&mut self) -> Result<()> {
        self.check_open()?;
        debug!(channel = %self.name, "input closed");
        self.state = ChannelState::Closed;
        Ok(())
    }

    /// Back to `Open` after the underlying source has been reopened.
    pub(crate) fn reset(&mut self) {
        self.state = ChannelState::Open;
    }
}

pub(crate) struct OutputCore<K> {
    name: String,
    sink: K,
    state: ChannelState,
    max_message_size: usize,
}

impl<K: MessageSink> OutputCore<K> {
    pub(crate) fn new(name: String, sink: K, config: &ChannelConfig) -> Self {
        debug!(channel = %name, transport = sink.transport_name(), "output opened");
        Self {
            name,
            sink,
            state: ChannelState::Open,
            max_message_size: config.max_message_size,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn state(&self) -> ChannelState {
        self.state
    }

    pub(crate) fn sink(&self) -> &K {
        &self.sink
    }

    pub(crate) fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }

    /// Fail unless messages may still be sent.
    pub(crate) fn check_open(&self) -> Result<()> {
        if self.state == ChannelState::Open {
            Ok(())
        } else {
            Err(ChannelError::Closed {
                channel: self.name.clone(),
            })
        }
    }

    pub(crate) fn send_message(&mut self, payload: &[u8]) -> Result<()> {
        self.check_open()?;
        if payload.len() > self.max_message_size {
            return Err(ChannelError::Overflow(format!(
                "message of {} bytes exceeds limit {}",
                payload.len(),
                self.max_message_size
            )));
        }
        self.sink.send(payload)?;
        trace!(channel = %self.name, len = payload.len(), "message sent");
        Ok(())
    }

    /// Send end-of-stream once; repeated calls are no-ops until close.
    pub(crate) fn send_eof(&mut self) -> Result<()> {
        match self.state {
            ChannelState::Closed => Err(ChannelError::Closed {
                channel: self.name.clone(),
            }),
            ChannelState::Drained => Ok(()),
            ChannelState::Open => {
                self.sink.send_eof()?;
                debug!(channel = %self.name, "end of stream sent");
                self.state = ChannelState::Drained;
                Ok(())
            }
        }
    }

    /// Send end-of-stream if it has not been sent, then release the sink.
    pub(crate) fn close(&mut self) -> Result<()> {
        let previous = self.state;
        if previous == ChannelState::Closed {
            return Err(ChannelError::Closed {
                channel: self.name.clone(),
            });
        }
        self.state = ChannelState::Closed;
        let eof = match previous {
            ChannelState::Open => self.sink.send_eof(),
            _ => Ok(()),
        };
        let released = self.sink.close();
        debug!(channel = %self.name, "output closed");
        eof?;
        released?;
        Ok(())
    }

    pub(crate) fn reset(&mut self) {
        self.state = ChannelState::Open;
    }
}

#[cfg(test)]
mod tests {
    use cisio_transport::{pipe, TransportError};

    use super::*;

    fn cores() -> (
        OutputCore<cisio_transport::MemorySink>,
        InputCore<cisio_transport::MemorySource>,
    ) {
        let (sink, source) = pipe();
        let config = ChannelConfig::default();
        (
            OutputCore::new("out".to_string(), sink, &config),
            InputCore::new("in".to_string(), source, &config),
        )
    }

    #[test]
    fn drained_input_reports_eof_without_io() {
        let (mut output, mut input) = cores();
        output.send_eof().unwrap();
        drop(output);

        assert!(input.recv_message().unwrap_err().is_end_of_stream());
        assert_eq!(input.state(), ChannelState::Drained);
        // The sink is gone; a real read would report a disconnect.
        assert!(input.recv_message().unwrap_err().is_end_of_stream());
    }

    #[test]
    fn close_sends_eof_once() {
        let (mut output, mut input) = cores();
        output.send_message(b"x").unwrap();
        output.close().unwrap();

        assert_eq!(input.recv_message().unwrap().as_ref(), b"x");
        assert!(input.recv_message().unwrap_err().is_end_of_stream());
        assert!(matches!(
            output.close(),
            Err(ChannelError::Closed { .. })
        ));
    }

    /// Accepts messages but fails end-of-stream, and remembers being closed.
    #[derive(Default)]
    struct BrokenEofSink {
        closed: bool,
    }

    impl MessageSink for BrokenEofSink {
        fn send(&mut self, _payload: &[u8]) -> cisio_transport::Result<()> {
            Ok(())
        }

        fn send_eof(&mut self) -> cisio_transport::Result<()> {
            Err(TransportError::Disconnected)
        }

        fn close(&mut self) -> cisio_transport::Result<()> {
            self.closed = true;
            Ok(())
        }

        fn transport_name(&self) -> &'static str {
            "broken-eof"
        }
    }

    #[test]
    fn close_releases_sink_when_eof_fails() {
        let mut output = OutputCore::new(
            "out".to_string(),
            BrokenEofSink::default(),
            &ChannelConfig::default(),
        );
        output.send_message(b"x").unwrap();

        assert!(matches!(
            output.close(),
            Err(ChannelError::Transport(TransportError::Disconnected))
        ));
        assert!(output.sink().closed);
        assert_eq!(output.state(), ChannelState::Closed);
        assert!(matches!(
            output.close(),
            Err(ChannelError::Closed { .. })
        ));
    }

    #[test]
    fn send_after_eof_is_closed() {
        let (mut output, _input) = cores();
        output.send_eof().unwrap();
        output.send_eof().unwrap();
        assert!(matches!(
            output.send_message(b"late"),
            Err(ChannelError::Closed { .. })
        ));
        assert_eq!(output.state(), ChannelState::Drained);
    }

    #[test]
    fn closed_input_rejects_receive() {
        let (_output, mut input) = cores();
        input.close().unwrap();
        assert!(matches!(
            input.recv_message(),
            Err(ChannelError::Closed { .. })
        ));
    }

    #[test]
    fn disconnect_without_eof_is_transport_error() {
        let (output, mut input) = cores();
        drop(output);
        assert!(matches!(
            input.recv_message(),
            Err(ChannelError::Transport(TransportError::Disconnected))
        ));
    }

    #[test]
    fn oversized_outgoing_message_is_rejected_before_send() {
        let (sink, mut source) = pipe();
        let config = ChannelConfig {
            max_message_size: 4,
            ..ChannelConfig::default()
        };
        let mut output = OutputCore::new("out".to_string(), sink, &config);
        assert!(matches!(
            output.send_message(b"too long"),
            Err(ChannelError::Overflow(_))
        ));
        output.send_message(b"ok").unwrap();
        assert_eq!(
            source.recv().unwrap(),
            Received::Message(Bytes::from_static(b"ok"))
        );
    }
}
