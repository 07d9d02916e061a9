use cisio_format::CodecError;
use cisio_transport::{MessageSink, MessageSource};

use crate::config::ChannelConfig;
use crate::endpoint::{ChannelState, Deliver, Incoming, InputCore, OutputCore, Receive};
use crate::error::{ChannelError, Result};

/// Receives one text line per message.
pub struct LineInput<S> {
    pub(crate) core: InputCore<S>,
    max_line_len: usize,
}

impl<S: MessageSource> LineInput<S> {
    pub fn new(name: impl Into<String>, source: S) -> Self {
        Self::with_config(name, source, &ChannelConfig::default())
    }

    pub fn with_config(name: impl Into<String>, source: S, config: &ChannelConfig) -> Self {
        Self {
            core: InputCore::new(name.into(), source, config),
            max_line_len: config.max_line_len,
        }
    }

    /// Receive the next line, exactly as sent (terminator included).
    ///
    /// A line longer than `max_len` bytes is discarded and reported as
    /// [`ChannelError::Overflow`]; the next call reads the following line.
    pub fn recv_line(&mut self, max_len: usize) -> Result<String> {
        let payload = self.core.recv_message()?;
        if payload.len() > max_len {
            return Err(ChannelError::Overflow(format!(
                "line of {} bytes exceeds limit {max_len}",
                payload.len()
            )));
        }
        let line = std::str::from_utf8(&payload).map_err(CodecError::from)?;
        Ok(line.to_string())
    }

    /// Receive the next line, bounded by the configured `max_line_len`.
    pub fn recv(&mut self) -> Result<String> {
        self.recv_line(self.max_line_len)
    }

    /// Iterate over lines until end-of-stream.
    pub fn lines(&mut self) -> Incoming<'_, Self> {
        Incoming::new(self)
    }

    pub fn close(&mut self) -> Result<()> {
        self.core.close()
    }

    pub fn name(&self) -> &str {
        self.core.name()
    }

    pub fn state(&self) -> ChannelState {
        self.core.state()
    }

    pub fn get_ref(&self) -> &S {
        self.core.source()
    }

    pub fn get_mut(&mut self) -> &mut S {
        self.core.source_mut()
    }
}

impl<S: MessageSource> Receive for LineInput<S> {
    type Item = String;

    fn receive(&mut self) -> Result<String> {
        self.recv()
    }
}

/// Sends one text line per message.
pub struct LineOutput<K> {
    pub(crate) core: OutputCore<K>,
}

impl<K: MessageSink> LineOutput<K> {
    pub fn new(name: impl Into<String>, sink: K) -> Self {
        Self::with_config(name, sink, &ChannelConfig::default())
    }

    pub fn with_config(name: impl Into<String>, sink: K, config: &ChannelConfig) -> Self {
        Self {
            core: OutputCore::new(name.into(), sink, config),
        }
    }

    /// Send `line` verbatim as one message. No terminator is added.
    pub fn send_line(&mut self, line: &str) -> Result<()> {
        self.core.send_message(line.as_bytes())
    }

    /// Tell the receiver no more lines follow.
    pub fn send_eof(&mut self) -> Result<()> {
        self.core.send_eof()
    }

    /// Send end-of-stream (if not yet sent) and release the transport.
    pub fn close(&mut self) -> Result<()> {
        self.core.close()
    }

    pub fn name(&self) -> &str {
        self.core.name()
    }

    pub fn state(&self) -> ChannelState {
        self.core.state()
    }

    pub fn get_ref(&self) -> &K {
        self.core.sink()
    }

    pub fn get_mut(&mut self) -> &mut K {
        self.core.sink_mut()
    }
}

impl<K: MessageSink> Deliver for LineOutput<K> {
    type Item = str;

    fn deliver(&mut self, line: &str) -> Result<()> {
        self.send_line(line)
    }

    fn send_eof(&mut self) -> Result<()> {
        LineOutput::send_eof(self)
    }

    fn close(&mut self) -> Result<()> {
        LineOutput::close(self)
    }
}
