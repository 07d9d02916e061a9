use cisio_transport::TransportError;

/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame header contains an invalid magic number.
    #[error("invalid frame magic (expected 0x4349 \"CI\")")]
    InvalidMagic,

    /// The frame header names a kind this version does not know.
    #[error("unknown frame kind {kind} ({len} byte payload)")]
    UnknownKind { kind: u16, len: usize },

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended cleanly between frames.
    #[error("connection closed")]
    ConnectionClosed,

    /// The stream ended in the middle of a frame.
    #[error("connection closed mid-frame ({buffered} bytes buffered)")]
    Truncated { buffered: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;

impl From<FrameError> for TransportError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::Io(io) => TransportError::Io(io),
            FrameError::PayloadTooLarge { size, max } => {
                TransportError::MessageTooLarge { size, max }
            }
            FrameError::ConnectionClosed => TransportError::Disconnected,
            other => TransportError::Protocol(other.to_string()),
        }
    }
}
