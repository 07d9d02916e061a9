use cisio_format::{FormatDescriptor, FromTable, IntoTable, Table};
use cisio_transport::{MessageSink, MessageSource};

use crate::config::ChannelConfig;
use crate::endpoint::{ChannelState, Deliver, Incoming, InputCore, OutputCore, Receive};
use crate::error::Result;
use crate::file::check_file_record;

/// Receives a whole table per message.
///
/// The row count is discovered while decoding; columns come back as owned
/// buffers.
pub struct ArrayInput<S> {
    pub(crate) core: InputCore<S>,
    format: FormatDescriptor,
}

impl<S: MessageSource> ArrayInput<S> {
    pub fn new(name: impl Into<String>, source: S, format: FormatDescriptor) -> Self {
        Self::with_config(name, source, format, &ChannelConfig::default())
    }

    pub fn with_config(
        name: impl Into<String>,
        source: S,
        format: FormatDescriptor,
        config: &ChannelConfig,
    ) -> Self {
        Self {
            core: InputCore::new(name.into(), source, config),
            format,
        }
    }

    pub fn format(&self) -> &FormatDescriptor {
        &self.format
    }

    /// Receive one table. An empty message is a zero-row table.
    pub fn recv(&mut self) -> Result<Table> {
        let payload = self.core.recv_message()?;
        let table = self.format.decode_table(&payload)?;
        tracing::trace!(channel = %self.core.name(), rows = table.rows(), "table decoded");
        Ok(table)
    }

    /// Receive one table as a tuple of column vectors, e.g.
    /// `(Vec<String>, Vec<i64>)`. Arity and kinds are checked first.
    pub fn recv_as<T: FromTable>(&mut self) -> Result<T> {
        self.core.check_open()?;
        let kinds: Vec<_> = T::kinds().into_iter().map(Some).collect();
        self.format.check_kinds(&kinds)?;
        let table = self.recv()?;
        Ok(T::from_table(table)?)
    }

    /// Iterate over tables until end-of-stream.
    pub fn tables(&mut self) -> Incoming<'_, Self> {
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

impl<S: MessageSource> Receive for ArrayInput<S> {
    type Item = Table;

    fn receive(&mut self) -> Result<Table> {
        self.recv()
    }
}

/// Sends a whole table per message.
pub struct ArrayOutput<K> {
    pub(crate) core: OutputCore<K>,
    format: FormatDescriptor,
    pub(crate) comment_prefix: Option<String>,
}

impl<K: MessageSink> ArrayOutput<K> {
    pub fn new(name: impl Into<String>, sink: K, format: FormatDescriptor) -> Self {
        Self::with_config(name, sink, format, &ChannelConfig::default())
    }

    pub fn with_config(
        name: impl Into<String>,
        sink: K,
        format: FormatDescriptor,
        config: &ChannelConfig,
    ) -> Self {
        Self {
            core: OutputCore::new(name.into(), sink, config),
            format,
            comment_prefix: None,
        }
    }

    pub fn format(&self) -> &FormatDescriptor {
        &self.format
    }

    /// Encode every row of `table` into one message.
    pub fn send(&mut self, table: &Table) -> Result<()> {
        self.core.check_open()?;
        let payload = self.format.encode_table(table)?;
        if let Some(prefix) = &self.comment_prefix {
            check_file_record(&payload, prefix)?;
        }
        self.core.send_message(payload.as_bytes())
    }

    /// Send a tuple of column vectors as one table.
    pub fn send_columns<T: IntoTable>(&mut self, columns: T) -> Result<()> {
        let table = columns.into_table()?;
        self.send(&table)
    }

    pub fn send_eof(&mut self) -> Result<()> {
        self.core.send_eof()
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

    pub fn get_ref(&self) -> &K {
        self.core.sink()
    }

    pub fn get_mut(&mut self) -> &mut K {
        self.core.sink_mut()
    }
}

impl<K: MessageSink> Deliver for ArrayOutput<K> {
    type Item = Table;

    fn deliver(&mut self, table: &Table) -> Result<()> {
        self.send(table)
    }

    fn send_eof(&mut self) -> Result<()> {
        ArrayOutput::send_eof(self)
    }

    fn close(&mut self) -> Result<()> {
        ArrayOutput::close(self)
    }
}
