//! Text files as a transport.
//!
//! A file is a finite message stream: [`FileSource`] yields messages until
//! the end of the file, then end-of-stream. [`FileSink`] appends every
//! message verbatim. The framing decides what one message is:
//! - [`Framing::Line`]: each line, terminator included, nothing skipped
//! - [`Framing::Record`]: each line, skipping comment and empty lines
//! - [`Framing::Table`]: all remaining non-skipped lines at once
//!
//! An empty line is a bare line terminator; a line of spaces is data. Row
//! and array file outputs refuse records that would be skipped on the way
//! back in.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use cisio_format::{escape, CodecError, FormatDescriptor};
use cisio_transport::{MessageSink, MessageSource, Received, TransportError};
use tracing::{debug, trace};

use crate::array::{ArrayInput, ArrayOutput};
use crate::config::ChannelConfig;
use crate::error::{ChannelError, Result};
use crate::line::{LineInput, LineOutput};
use crate::row::{RowInput, RowOutput};

type TransportResult<T> = std::result::Result<T, TransportError>;

/// How a file is opened. Fixed for the life of the endpoint; `reopen`
/// uses the same mode again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    /// Read from the beginning.
    Read,
    /// Create or empty the file, then write.
    Truncate,
    /// Create if missing, then write after any existing content.
    Append,
}

/// What a single message is when reading a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    Line,
    Record,
    Table,
}

pub type FileLineInput = LineInput<FileSource>;
pub type FileLineOutput = LineOutput<FileSink>;
pub type FileRowInput = RowInput<FileSource>;
pub type FileRowOutput = RowOutput<FileSink>;
pub type FileArrayInput = ArrayInput<FileSource>;
pub type FileArrayOutput = ArrayOutput<FileSink>;

/// Reads messages from a text file.
pub struct FileSource {
    path: PathBuf,
    reader: BufReader<File>,
    framing: Framing,
    comment_prefix: String,
    max_message_size: usize,
    finished: bool,
}

impl FileSource {
    pub fn open(path: impl AsRef<Path>, framing: Framing) -> TransportResult<Self> {
        Self::open_with_config(path, framing, &ChannelConfig::default())
    }

    pub fn open_with_config(
        path: impl AsRef<Path>,
        framing: Framing,
        config: &ChannelConfig,
    ) -> TransportResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        debug!(path = %path.display(), ?framing, "file source opened");
        Ok(Self {
            path,
            reader: BufReader::new(file),
            framing,
            comment_prefix: config.comment_prefix.clone(),
            max_message_size: config.max_message_size,
            finished: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    pub fn mode(&self) -> FileMode {
        FileMode::Read
    }

    /// Start again from the beginning of the file.
    pub fn reopen(&mut self) -> TransportResult<()> {
        self.reader = BufReader::new(File::open(&self.path)?);
        self.finished = false;
        debug!(path = %self.path.display(), "file source reopened");
        Ok(())
    }

    /// The format string declared in the file's leading comment lines, if
    /// any: the first comment containing a `%`, with escapes still in place.
    pub fn header_format(&self) -> TransportResult<Option<String>> {
        read_header(&self.path, &self.comment_prefix).map_err(Into::into)
    }

    fn read_line(&mut self, buf: &mut Vec<u8>) -> TransportResult<usize> {
        buf.clear();
        loop {
            match self.reader.read_until(b'\n', buf) {
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            }
        }
    }

    fn is_skipped(&self, line: &[u8]) -> bool {
        skipped_line(line, &self.comment_prefix).is_some()
    }

    fn finish(&mut self) -> Received {
        self.finished = true;
        debug!(path = %self.path.display(), "end of file");
        Received::EndOfStream
    }
}

impl MessageSource for FileSource {
    fn recv(&mut self) -> TransportResult<Received> {
        if self.finished {
            return Ok(Received::EndOfStream);
        }
        let mut line = Vec::new();
        match self.framing {
            Framing::Line => {
                if self.read_line(&mut line)? == 0 {
                    return Ok(self.finish());
                }
            }
            Framing::Record => loop {
                if self.read_line(&mut line)? == 0 {
                    return Ok(self.finish());
                }
                if !self.is_skipped(&line) {
                    break;
                }
            },
            Framing::Table => {
                // The whole file is one message; the next read is end-of-stream.
                self.finished = true;
                let mut table = Vec::new();
                while self.read_line(&mut line)? > 0 {
                    if self.is_skipped(&line) {
                        continue;
                    }
                    let size = table.len() + line.len();
                    if size > self.max_message_size {
                        return Err(TransportError::MessageTooLarge {
                            size,
                            max: self.max_message_size,
                        });
                    }
                    table.extend_from_slice(&line);
                }
                line = table;
            }
        }
        trace!(path = %self.path.display(), len = line.len(), "file message read");
        Ok(Received::Message(Bytes::from(line)))
    }

    fn transport_name(&self) -> &'static str {
        "file"
    }
}

/// What kind of skipped line `line` is, if record and table framings skip
/// it.
fn skipped_line(line: &[u8], comment_prefix: &str) -> Option<&'static str> {
    if !comment_prefix.is_empty() && line.starts_with(comment_prefix.as_bytes()) {
        Some("comment")
    } else if matches!(line, b"\n" | b"\r\n") {
        Some("empty")
    } else {
        None
    }
}

/// Reject a rendered record (or table) containing a line that a file input
/// would skip.
pub(crate) fn check_file_record(
    record: &str,
    comment_prefix: &str,
) -> std::result::Result<(), CodecError> {
    for (line, text) in record.split_inclusive('\n').enumerate() {
        if let Some(kind) = skipped_line(text.as_bytes(), comment_prefix) {
            return Err(CodecError::SkippedLine { line, kind });
        }
    }
    Ok(())
}

fn read_header(path: &Path, prefix: &str) -> std::io::Result<Option<String>> {
    if prefix.is_empty() {
        return Ok(None);
    }
    let mut reader = BufReader::new(File::open(path)?);
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let Some(body) = line.strip_prefix(prefix) else {
            return Ok(None);
        };
        let body = body.trim_start_matches(' ').trim_end_matches(['\r', '\n']);
        if body.contains('%') {
            return Ok(Some(body.to_string()));
        }
    }
}

/// Writes messages to a text file, verbatim and in order.
pub struct FileSink {
    path: PathBuf,
    writer: BufWriter<File>,
    mode: FileMode,
}

impl FileSink {
    /// Open for writing. `FileMode::Read` is rejected.
    pub fn open(path: impl AsRef<Path>, mode: FileMode) -> TransportResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = open_for_write(&path, mode)?;
        debug!(path = %path.display(), ?mode, "file sink opened");
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            mode,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> FileMode {
        self.mode
    }

    /// Reopen with the original mode: truncate empties the file again,
    /// append continues after the current content.
    pub fn reopen(&mut self) -> TransportResult<()> {
        self.writer.flush()?;
        self.writer = BufWriter::new(open_for_write(&self.path, self.mode)?);
        debug!(path = %self.path.display(), mode = ?self.mode, "file sink reopened");
        Ok(())
    }

    /// True when nothing has been written to the file yet.
    pub fn is_empty(&self) -> TransportResult<bool> {
        Ok(self.writer.buffer().is_empty() && self.writer.get_ref().metadata()?.len() == 0)
    }

    /// Write a `<prefix> <escaped format>` header line if the file is still
    /// empty. Returns whether a header was written.
    pub fn write_header(&mut self, format: &FormatDescriptor, prefix: &str) -> TransportResult<bool> {
        if !self.is_empty()? {
            return Ok(false);
        }
        writeln!(self.writer, "{prefix} {}", escape(format.as_str()))?;
        self.writer.flush()?;
        Ok(true)
    }
}

fn open_for_write(path: &Path, mode: FileMode) -> std::io::Result<File> {
    let mut options = OpenOptions::new();
    match mode {
        FileMode::Read => {
            return Err(std::io::Error::new(
                ErrorKind::InvalidInput,
                "a file sink cannot be opened in read mode",
            ))
        }
        FileMode::Truncate => options.write(true).create(true).truncate(true),
        FileMode::Append => options.append(true).create(true),
    };
    options.open(path)
}

impl MessageSink for FileSink {
    fn send(&mut self, payload: &[u8]) -> TransportResult<()> {
        self.writer.write_all(payload)?;
        self.writer.flush()?;
        trace!(path = %self.path.display(), len = payload.len(), "file message written");
        Ok(())
    }

    fn send_eof(&mut self) -> TransportResult<()> {
        self.writer.flush().map_err(Into::into)
    }

    fn close(&mut self) -> TransportResult<()> {
        self.writer.flush().map_err(Into::into)
    }

    fn transport_name(&self) -> &'static str {
        "file"
    }
}

fn channel_name(path: &Path) -> String {
    path.display().to_string()
}

/// Use `format`, or fall back to the file's header line.
pub(crate) fn resolve_format(
    source: &FileSource,
    format: Option<FormatDescriptor>,
    name: &str,
) -> Result<FormatDescriptor> {
    if let Some(format) = format {
        return Ok(format);
    }
    match source.header_format()? {
        Some(header) => {
            debug!(channel = %name, format = %header, "format discovered from file header");
            Ok(FormatDescriptor::parse_escaped(&header)?)
        }
        None => Err(ChannelError::MissingFormat(name.to_string())),
    }
}

pub(crate) fn create_sink(
    path: &Path,
    mode: FileMode,
    format: Option<&FormatDescriptor>,
    config: &ChannelConfig,
) -> Result<FileSink> {
    let mut sink = FileSink::open(path, mode)?;
    if let (true, Some(format)) = (config.write_header, format) {
        sink.write_header(format, &config.comment_prefix)?;
    }
    Ok(sink)
}

impl LineInput<FileSource> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, &ChannelConfig::default())
    }

    pub fn open_with_config(path: impl AsRef<Path>, config: &ChannelConfig) -> Result<Self> {
        let source = FileSource::open_with_config(path.as_ref(), Framing::Line, config)?;
        Ok(Self::with_config(channel_name(path.as_ref()), source, config))
    }

    /// Read the file again from the start.
    pub fn reopen(&mut self) -> Result<()> {
        self.core.check_open()?;
        self.core.source_mut().reopen()?;
        self.core.reset();
        Ok(())
    }
}

impl LineOutput<FileSink> {
    pub fn create(path: impl AsRef<Path>, mode: FileMode) -> Result<Self> {
        Self::create_with_config(path, mode, &ChannelConfig::default())
    }

    pub fn create_with_config(
        path: impl AsRef<Path>,
        mode: FileMode,
        config: &ChannelConfig,
    ) -> Result<Self> {
        let sink = create_sink(path.as_ref(), mode, None, config)?;
        Ok(Self::with_config(channel_name(path.as_ref()), sink, config))
    }

    pub fn reopen(&mut self) -> Result<()> {
        self.core.check_open()?;
        self.core.sink_mut().reopen()?;
        Ok(())
    }
}

impl RowInput<FileSource> {
    /// Open a row file. Without `format`, the file's header line supplies
    /// it.
    pub fn open(path: impl AsRef<Path>, format: Option<FormatDescriptor>) -> Result<Self> {
        Self::open_with_config(path, format, &ChannelConfig::default())
    }

    pub fn open_with_config(
        path: impl AsRef<Path>,
        format: Option<FormatDescriptor>,
        config: &ChannelConfig,
    ) -> Result<Self> {
        let name = channel_name(path.as_ref());
        let source = FileSource::open_with_config(path.as_ref(), Framing::Record, config)?;
        let format = resolve_format(&source, format, &name)?;
        Ok(Self::with_config(name, source, format, config))
    }

    pub fn reopen(&mut self) -> Result<()> {
        self.core.check_open()?;
        self.core.source_mut().reopen()?;
        self.core.reset();
        Ok(())
    }
}

impl RowOutput<FileSink> {
    pub fn create(path: impl AsRef<Path>, mode: FileMode, format: FormatDescriptor) -> Result<Self> {
        Self::create_with_config(path, mode, format, &ChannelConfig::default())
    }

    pub fn create_with_config(
        path: impl AsRef<Path>,
        mode: FileMode,
        format: FormatDescriptor,
        config: &ChannelConfig,
    ) -> Result<Self> {
        let sink = create_sink(path.as_ref(), mode, Some(&format), config)?;
        let mut output = Self::with_config(channel_name(path.as_ref()), sink, format, config);
        output.comment_prefix = Some(config.comment_prefix.clone());
        Ok(output)
    }

    pub fn reopen(&mut self) -> Result<()> {
        self.core.check_open()?;
        self.core.sink_mut().reopen()?;
        Ok(())
    }
}

impl ArrayInput<FileSource> {
    /// Open a table file; the remaining content is read as one table.
    pub fn open(path: impl AsRef<Path>, format: Option<FormatDescriptor>) -> Result<Self> {
        Self::open_with_config(path, format, &ChannelConfig::default())
    }

    pub fn open_with_config(
        path: impl AsRef<Path>,
        format: Option<FormatDescriptor>,
        config: &ChannelConfig,
    ) -> Result<Self> {
        let name = channel_name(path.as_ref());
        let source = FileSource::open_with_config(path.as_ref(), Framing::Table, config)?;
        let format = resolve_format(&source, format, &name)?;
        Ok(Self::with_config(name, source, format, config))
    }

    pub fn reopen(&mut self) -> Result<()> {
        self.core.check_open()?;
        self.core.source_mut().reopen()?;
        self.core.reset();
        Ok(())
    }
}

impl ArrayOutput<FileSink> {
    pub fn create(path: impl AsRef<Path>, mode: FileMode, format: FormatDescriptor) -> Result<Self> {
        Self::create_with_config(path, mode, format, &ChannelConfig::default())
    }

    pub fn create_with_config(
        path: impl AsRef<Path>,
        mode: FileMode,
        format: FormatDescriptor,
        config: &ChannelConfig,
    ) -> Result<Self> {
        let sink = create_sink(path.as_ref(), mode, Some(&format), config)?;
        let mut output = Self::with_config(channel_name(path.as_ref()), sink, format, config);
        output.comment_prefix = Some(config.comment_prefix.clone());
        Ok(output)
    }

    pub fn reopen(&mut self) -> Result<()> {
        self.core.check_open()?;
        self.core.sink_mut().reopen()?;
        Ok(())
    }
}
