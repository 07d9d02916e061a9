use cisio_format::{split_complex, FieldKind, FieldSlot, FormatDescriptor, FromRow, IntoRow, Value};
use cisio_transport::{MessageSink, MessageSource};

use crate::config::ChannelConfig;
use crate::endpoint::{ChannelState, Deliver, Incoming, InputCore, OutputCore, Receive};
use crate::error::Result;
use crate::file::check_file_record;

/// Receives one formatted record per message.
pub struct RowInput<S> {
    pub(crate) core: InputCore<S>,
    format: FormatDescriptor,
}

impl<S: MessageSource> RowInput<S> {
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

    /// Number of fields in each row. The split layout has
    /// [`value_count`](FormatDescriptor::value_count) values instead.
    pub fn field_count(&self) -> usize {
        self.format.len()
    }

    /// Receive one row as dynamically typed values, in field order.
    pub fn recv(&mut self) -> Result<Vec<Value>> {
        let payload = self.core.recv_message()?;
        Ok(self.format.decode(&payload)?)
    }

    /// Receive one row as a tuple. Arity and kinds are checked before
    /// anything is read.
    ///
    /// A tuple with one element per field takes complex fields as
    /// [`Complex`](cisio_format::Complex); a tuple with one element per
    /// scalar takes each of them as two `f64`s.
    pub fn recv_as<T: FromRow>(&mut self) -> Result<T> {
        self.core.check_open()?;
        self.format.check_row_kinds(&T::kinds())?;
        let values = self.recv_split(T::ARITY)?;
        Ok(T::from_row(values)?)
    }

    /// Receive one row into caller-owned slots and return the number of
    /// slots written. Slots follow the same two layouts as
    /// [`recv_as`](Self::recv_as).
    ///
    /// The slot count and kinds are checked before anything is read, so a
    /// mismatch leaves the message in the transport.
    pub fn recv_into(&mut self, slots: &mut [&mut dyn FieldSlot]) -> Result<usize> {
        self.core.check_open()?;
        let kinds: Vec<Option<FieldKind>> = slots.iter().map(|s| s.expected_kind()).collect();
        self.format.check_row_kinds(&kinds)?;

        let values = self.recv_split(slots.len())?;
        let count = values.len();
        for (field, (slot, value)) in slots.iter_mut().zip(values).enumerate() {
            slot.assign(field, value)?;
        }
        Ok(count)
    }

    fn recv_split(&mut self, arity: usize) -> Result<Vec<Value>> {
        let values = self.recv()?;
        if arity == self.format.len() {
            Ok(values)
        } else {
            Ok(split_complex(values))
        }
    }

    /// Iterate over rows until end-of-stream.
    pub fn rows(&mut self) -> Incoming<'_, Self> {
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

impl<S: MessageSource> Receive for RowInput<S> {
    type Item = Vec<Value>;

    fn receive(&mut self) -> Result<Vec<Value>> {
        self.recv()
    }
}

/// Sends one formatted record per message.
pub struct RowOutput<K> {
    pub(crate) core: OutputCore<K>,
    format: FormatDescriptor,
    /// Set for file outputs: records a file input would skip are refused.
    pub(crate) comment_prefix: Option<String>,
}

impl<K: MessageSink> RowOutput<K> {
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

    pub fn field_count(&self) -> usize {
        self.format.len()
    }

    /// Encode `values` and send them as one message.
    pub fn send(&mut self, values: &[Value]) -> Result<()> {
        self.core.check_open()?;
        let record = self.format.encode(values)?;
        if let Some(prefix) = &self.comment_prefix {
            check_file_record(&record, prefix)?;
        }
        self.core.send_message(record.as_bytes())
    }

    /// Encode a tuple row and send it.
    pub fn send_row<T: IntoRow>(&mut self, row: T) -> Result<()> {
        self.send(&row.into_row())
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

impl<K: MessageSink> Deliver for RowOutput<K> {
    type Item = [Value];

    fn deliver(&mut self, row: &[Value]) -> Result<()> {
        self.send(row)
    }

    fn send_eof(&mut self) -> Result<()> {
        RowOutput::send_eof(self)
    }

    fn close(&mut self) -> Result<()> {
        RowOutput::close(self)
    }
}
