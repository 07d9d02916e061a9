//! Framed Unix socket endpoints.
//!
//! The receiving side binds the channel path and accepts its producer on the
//! first receive; the sending side connects to it.

use std::path::{Path, PathBuf};

use cisio_frame::{FrameConfig, FrameReader, FrameWriter};
use cisio_transport::{
    IpcStream, MessageSink, MessageSource, Received, TransportError, UnixDomainSocket,
};
use tracing::debug;

use crate::array::{ArrayInput, ArrayOutput};
use crate::config::ChannelConfig;
use crate::line::{LineInput, LineOutput};
use crate::row::{RowInput, RowOutput};

type TransportResult<T> = std::result::Result<T, TransportError>;

pub type SocketLineInput = LineInput<SocketSource>;
pub type SocketLineOutput = LineOutput<SocketSink>;
pub type SocketRowInput = RowInput<SocketSource>;
pub type SocketRowOutput = RowOutput<SocketSink>;
pub type SocketArrayInput = ArrayInput<SocketSource>;
pub type SocketArrayOutput = ArrayOutput<SocketSink>;

/// Bound channel socket that reads frames from one producer.
pub struct SocketSource {
    listener: UnixDomainSocket,
    reader: Option<FrameReader<IpcStream>>,
    config: FrameConfig,
}

impl SocketSource {
    pub fn bind(path: impl AsRef<Path>, config: &ChannelConfig) -> TransportResult<Self> {
        Ok(Self {
            listener: UnixDomainSocket::bind(path)?,
            reader: None,
            config: config.frame_config(),
        })
    }

    pub fn path(&self) -> &Path {
        self.listener.path()
    }

    /// True once the producer has connected.
    pub fn is_connected(&self) -> bool {
        self.reader.is_some()
    }

    fn reader(&mut self) -> TransportResult<&mut FrameReader<IpcStream>> {
        match &mut self.reader {
            Some(reader) => Ok(reader),
            slot @ None => {
                let stream = self.listener.accept()?;
                let reader = FrameReader::with_config_ipc(stream, self.config.clone())?;
                Ok(slot.insert(reader))
            }
        }
    }
}

impl MessageSource for SocketSource {
    fn recv(&mut self) -> TransportResult<Received> {
        self.reader()?.recv()
    }

    fn transport_name(&self) -> &'static str {
        "unix-socket"
    }
}

/// Connected channel socket that writes frames.
pub struct SocketSink {
    path: PathBuf,
    writer: FrameWriter<IpcStream>,
}

impl SocketSink {
    /// Connect to a bound channel socket (single attempt).
    pub fn connect(path: impl AsRef<Path>, config: &ChannelConfig) -> TransportResult<Self> {
        let path = path.as_ref().to_path_buf();
        let stream = UnixDomainSocket::connect(&path)?;
        let writer = FrameWriter::with_config_ipc(stream, config.frame_config())?;
        Ok(Self { path, writer })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MessageSink for SocketSink {
    fn send(&mut self, payload: &[u8]) -> TransportResult<()> {
        MessageSink::send(&mut self.writer, payload)
    }

    fn send_eof(&mut self) -> TransportResult<()> {
        MessageSink::send_eof(&mut self.writer)
    }

    fn close(&mut self) -> TransportResult<()> {
        MessageSink::close(&mut self.writer)?;
        self.writer.get_ref().shutdown_write()?;
        debug!(path = ?self.path, "channel socket shut down");
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "unix-socket"
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use cisio_format::{FormatDescriptor, Value};

    use super::*;
    use crate::error::ChannelError;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "cisio-sock-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
        dir
    }

    #[test]
    fn rows_between_threads() {
        let dir = temp_dir("rows");
        let path = dir.join("rows.sock");
        let config = ChannelConfig::default();
        let format = FormatDescriptor::parse("%s\t%d\n").unwrap();

        let source = SocketSource::bind(&path, &config).unwrap();
        assert!(!source.is_connected());
        let mut input = SocketRowInput::new("in", source, format.clone());

        let producer_path = path.clone();
        let producer = thread::spawn(move || {
            let sink = SocketSink::connect(&producer_path, &ChannelConfig::default()).unwrap();
            let mut output = SocketRowOutput::new("out", sink, format);
            for i in 0..10i64 {
                output.send_row((format!("r{i}"), i)).unwrap();
            }
            output.close().unwrap();
        });

        let rows: Vec<Vec<Value>> = input.rows().collect::<crate::Result<_>>().unwrap();
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[9], vec![Value::from("r9"), Value::Integer(9)]);
        assert!(input.get_ref().is_connected());
        producer.join().unwrap();
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn producer_exit_without_eof_is_transport_error() {
        let dir = temp_dir("abrupt");
        let path = dir.join("abrupt.sock");
        let source = SocketSource::bind(&path, &ChannelConfig::default()).unwrap();
        let mut input = SocketLineInput::new("in", source);

        let producer_path = path.clone();
        let producer = thread::spawn(move || {
            let sink = SocketSink::connect(&producer_path, &ChannelConfig::default()).unwrap();
            let mut output = SocketLineOutput::new("out", sink);
            output.send_line("only\n").unwrap();
        });

        assert_eq!(input.recv().unwrap(), "only\n");
        producer.join().unwrap();
        assert!(matches!(
            input.recv(),
            Err(ChannelError::Transport(TransportError::Disconnected))
        ));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn oversized_message_is_dropped_and_stream_continues() {
        let dir = temp_dir("oversize");
        let path = dir.join("big.sock");
        let small = ChannelConfig {
            max_message_size: 8,
            ..ChannelConfig::default()
        };
        let source = SocketSource::bind(&path, &small).unwrap();
        let mut input = SocketLineInput::with_config("in", source, &small);

        let producer_path = path.clone();
        let producer = thread::spawn(move || {
            let sink = SocketSink::connect(&producer_path, &ChannelConfig::default()).unwrap();
            let mut output = SocketLineOutput::new("out", sink);
            output.send_line("far too long for the reader\n").unwrap();
            output.send_line("short\n").unwrap();
            output.close().unwrap();
        });

        assert!(matches!(input.recv(), Err(ChannelError::Overflow(_))));
        assert_eq!(input.recv().unwrap(), "short\n");
        assert!(input.recv().unwrap_err().is_end_of_stream());
        producer.join().unwrap();
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn connect_without_listener_fails() {
        let dir = temp_dir("nolistener");
        assert!(matches!(
            SocketSink::connect(dir.join("none.sock"), &ChannelConfig::default()),
            Err(TransportError::Connect { .. })
        ));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
