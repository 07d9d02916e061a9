use cisio_format::{CodecError, FormatError};
use cisio_transport::TransportError;

/// Errors surfaced by channel endpoints.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The peer signalled end-of-stream. Expected terminal condition of a
    /// receive loop.
    #[error("channel {channel}: end of stream")]
    EndOfStream { channel: String },

    /// The transport failed to deliver or receive a message.
    #[error("transport error: {0}")]
    Transport(TransportError),

    /// The format string could not be parsed.
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// A received message does not match the channel's format. The message
    /// is dropped; the channel stays usable.
    #[error("parse error: {0}")]
    Parse(CodecError),

    /// A line, field or message is larger than allowed. Only the offending
    /// message is affected.
    #[error("overflow: {0}")]
    Overflow(String),

    /// The caller supplied values or slots that do not fit the format.
    /// Raised before any transport I/O.
    #[error("contract violation: {0}")]
    Contract(CodecError),

    /// The endpoint has been closed.
    #[error("channel {channel} is closed")]
    Closed { channel: String },

    /// The registry has no channel under this name.
    #[error("unknown channel {0:?}")]
    UnknownChannel(String),

    /// A row or array channel was opened without a format string and none
    /// could be discovered.
    #[error("channel {0:?} has no format string")]
    MissingFormat(String),

    /// Invalid registry or address configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ChannelError {
    /// Returns true for the end-of-stream signal.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, ChannelError::EndOfStream { .. })
    }

    /// Errors that affect a single message only; receiving may continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ChannelError::Parse(_) | ChannelError::Overflow(_))
    }
}

impl From<TransportError> for ChannelError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::MessageTooLarge { .. } => ChannelError::Overflow(err.to_string()),
            other => ChannelError::Transport(other),
        }
    }
}

impl From<CodecError> for ChannelError {
    fn from(err: CodecError) -> Self {
        if err.is_overflow() {
            ChannelError::Overflow(err.to_string())
        } else if err.is_contract() {
            ChannelError::Contract(err)
        } else {
            ChannelError::Parse(err)
        }
    }
}

impl From<std::io::Error> for ChannelError {
    fn from(err: std::io::Error) -> Self {
        ChannelError::Transport(TransportError::Io(err))
    }
}

pub type Result<T> = std::result::Result<T, ChannelError>;

#[cfg(test)]
mod tests {
    use cisio_format::FieldKind;

    use super::*;

    #[test]
    fn codec_errors_are_classified() {
        let parse: ChannelError = CodecError::TrailingBytes { offset: 3 }.into();
        assert!(matches!(parse, ChannelError::Parse(_)));
        assert!(parse.is_recoverable());

        let overflow: ChannelError = CodecError::Overflow {
            field: 0,
            len: 9,
            max: 5,
        }
        .into();
        assert!(matches!(overflow, ChannelError::Overflow(_)));

        let contract: ChannelError = CodecError::TypeMismatch {
            field: 1,
            expected: FieldKind::Integer,
            found: FieldKind::Text,
        }
        .into();
        assert!(matches!(contract, ChannelError::Contract(_)));
        assert!(!contract.is_recoverable());
    }

    #[test]
    fn oversized_transport_message_is_overflow() {
        let err: ChannelError = TransportError::MessageTooLarge { size: 10, max: 4 }.into();
        assert!(matches!(err, ChannelError::Overflow(_)));
        let err: ChannelError = TransportError::Disconnected.into();
        assert!(matches!(
            err,
            ChannelError::Transport(TransportError::Disconnected)
        ));
    }

    #[test]
    fn end_of_stream_helper() {
        let err = ChannelError::EndOfStream {
            channel: "in".to_string(),
        };
        assert!(err.is_end_of_stream());
        assert_eq!(err.to_string(), "channel in: end of stream");
    }
}
