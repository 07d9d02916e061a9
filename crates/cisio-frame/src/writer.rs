use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use cisio_transport::{IpcStream, MessageSink, TransportError};
use tracing::{debug, trace};

use crate::codec::{encode_frame, Frame, FrameConfig, FrameKind};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes complete frames to any `Write` stream.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Write a complete frame (blocking).
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.write_kind(frame.kind, frame.payload.as_ref())
    }

    /// Encode and send one data frame.
    pub fn send(&mut self, payload: &[u8]) -> Result<()> {
        self.write_kind(FrameKind::Data, payload)
    }

    /// Send the end-of-stream frame.
    pub fn send_end_of_stream(&mut self) -> Result<()> {
        self.write_kind(FrameKind::EndOfStream, &[])
    }

    fn write_kind(&mut self, kind: FrameKind, payload: &[u8]) -> Result<()> {
        if payload.len() > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: self.config.max_payload_size,
            });
        }

        self.buf.clear();
        encode_frame(kind, payload, &mut self.buf)?;

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
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

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl FrameWriter<IpcStream> {
    /// Create a frame writer for `IpcStream` and apply write timeout from config.
    pub fn with_config_ipc(
        inner: IpcStream,
        config: FrameConfig,
    ) -> std::result::Result<Self, TransportError> {
        inner.set_write_timeout(config.write_timeout)?;
        Ok(Self::with_config(inner, config))
    }
}

impl<T: Write + Send> MessageSink for FrameWriter<T> {
    fn send(&mut self, payload: &[u8]) -> std::result::Result<(), TransportError> {
        trace!(len = payload.len(), "frame send");
        FrameWriter::send(self, payload).map_err(Into::into)
    }

    fn send_eof(&mut self) -> std::result::Result<(), TransportError> {
        debug!("sending end-of-stream frame");
        self.send_end_of_stream().map_err(Into::into)
    }

    fn close(&mut self) -> std::result::Result<(), TransportError> {
        self.flush().map_err(Into::into)
    }

    fn transport_name(&self) -> &'static str {
        "framed-stream"
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::codec::decode_frame;

    fn decode_all(bytes: Vec<u8>) -> Vec<Frame> {
        let mut wire = BytesMut::from(bytes.as_slice());
        let mut frames = Vec::new();
        while let Some(frame) = decode_frame(&mut wire, usize::MAX).unwrap() {
            frames.push(frame);
        }
        frames
    }

    #[test]
    fn writes_data_then_end_of_stream() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.send(b"abcde\t5\n").unwrap();
        writer.send_end_of_stream().unwrap();

        let frames = decode_all(writer.into_inner().into_inner());
        assert_eq!(
            frames,
            vec![Frame::data(&b"abcde\t5\n"[..]), Frame::end_of_stream()]
        );
    }

    #[test]
    fn write_frame_preserves_kind() {
        let mut writer = FrameWriter::new(Cursor::new(Vec::<u8>::new()));
        writer.write_frame(&Frame::end_of_stream()).unwrap();

        let frames = decode_all(writer.into_inner().into_inner());
        assert_eq!(frames[0].kind, FrameKind::EndOfStream);
    }

    #[test]
    fn payload_too_large_rejected_before_write() {
        let cfg = FrameConfig {
            max_payload_size: 4,
            ..FrameConfig::default()
        };
        let mut writer = FrameWriter::with_config(Cursor::new(Vec::<u8>::new()), cfg);

        let err = writer.send(b"oversized").unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { size: 9, max: 4 }));
        assert!(writer.get_ref().get_ref().is_empty());
    }

    #[test]
    fn every_send_flushes() {
        let sink = FlushTrackingWriter::default();
        let flag = Arc::clone(&sink.flushed);
        let mut writer = FrameWriter::new(sink);

        writer.send(b"x").unwrap();
        assert!(flag.load(Ordering::SeqCst));
    }

    #[test]
    fn interrupted_write_is_retried() {
        let mut writer = FrameWriter::new(InterruptedOnce {
            interrupted: false,
            data: Vec::new(),
        });
        writer.send(b"retry").unwrap();
        assert!(!writer.into_inner().data.is_empty());
    }

    #[test]
    fn zero_length_write_means_closed() {
        let mut writer = FrameWriter::new(ZeroWriter);
        assert!(matches!(
            writer.send(b"x"),
            Err(FrameError::ConnectionClosed)
        ));
    }

    #[test]
    fn message_sink_errors_map_to_transport_errors() {
        let mut writer = FrameWriter::new(ZeroWriter);
        let err = MessageSink::send(&mut writer, b"x").unwrap_err();
        assert!(matches!(err, TransportError::Disconnected));
        assert_eq!(writer.transport_name(), "framed-stream");
    }

    #[derive(Default)]
    struct FlushTrackingWriter {
        flushed: Arc<AtomicBool>,
        data: Vec<u8>,
    }

    impl Write for FlushTrackingWriter {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            self.flushed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct InterruptedOnce {
        interrupted: bool,
        data: Vec<u8>,
    }

    impl Write for InterruptedOnce {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.data.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct ZeroWriter;

    impl Write for ZeroWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
