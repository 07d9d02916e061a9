use std::time::Duration;

use cisio_frame::{FrameConfig, DEFAULT_MAX_PAYLOAD};

/// Default bound for [`crate::LineInput::recv`].
pub const DEFAULT_MAX_LINE_LEN: usize = 2048;

/// Per-endpoint limits and file-backing options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Longest line accepted by `LineInput::recv`. Default: 2048 bytes.
    pub max_line_len: usize,
    /// Largest message an endpoint sends or accepts. Default: 16 MiB.
    pub max_message_size: usize,
    /// Read timeout for socket transports.
    pub read_timeout: Option<Duration>,
    /// Write timeout for socket transports.
    pub write_timeout: Option<Duration>,
    /// Leading lines starting with this prefix form the header block of row
    /// and array files. They are skipped and carry the format header.
    pub comment_prefix: String,
    /// When true, row and array file outputs start an empty file with a
    /// format header line.
    pub write_header: bool,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            max_line_len: DEFAULT_MAX_LINE_LEN,
            max_message_size: DEFAULT_MAX_PAYLOAD,
            read_timeout: None,
            write_timeout: None,
            comment_prefix: "#".to_string(),
            write_header: false,
        }
    }
}

impl ChannelConfig {
    /// Frame settings for socket transports.
    pub fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            max_payload_size: self.max_message_size,
            read_timeout: self.read_timeout,
            write_timeout: self.write_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ChannelConfig::default();
        assert_eq!(config.max_line_len, 2048);
        assert_eq!(config.max_message_size, 16 * 1024 * 1024);
        assert_eq!(config.comment_prefix, "#");
        assert!(!config.write_header);
    }

    #[test]
    fn frame_config_follows_limits() {
        let config = ChannelConfig {
            max_message_size: 64,
            read_timeout: Some(Duration::from_millis(250)),
            ..ChannelConfig::default()
        };
        let frame = config.frame_config();
        assert_eq!(frame.max_payload_size, 64);
        assert_eq!(frame.read_timeout, Some(Duration::from_millis(250)));
        assert_eq!(frame.write_timeout, None);
    }
}
