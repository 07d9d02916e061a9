use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame header: magic (2) + length (4) + kind (2) = 8 bytes.
pub const HEADER_SIZE: usize = 8;

/// Magic bytes: "CI" (0x43 0x49).
pub const MAGIC: [u8; 2] = [0x43, 0x49];

/// Default maximum payload size: 16 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// What a frame carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// One channel message.
    Data,
    /// The sender will not send anything else.
    EndOfStream,
}

impl FrameKind {
    /// Wire value of this kind.
    pub fn as_u16(self) -> u16 {
        match self {
            FrameKind::Data => 0,
            FrameKind::EndOfStream => 1,
        }
    }

    /// Parse a wire value.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 => Some(FrameKind::Data),
            1 => Some(FrameKind::EndOfStream),
            _ => None,
        }
    }
}

/// One decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Data or end-of-stream.
    pub kind: FrameKind,
    /// The message payload (empty for end-of-stream).
    pub payload: Bytes,
}

impl Frame {
    /// A data frame.
    pub fn data(payload: impl Into<Bytes>) -> Self {
        Self {
            kind: FrameKind::Data,
            payload: payload.into(),
        }
    }

    /// An end-of-stream frame.
    pub fn end_of_stream() -> Self {
        Self {
            kind: FrameKind::EndOfStream,
            payload: Bytes::new(),
        }
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }
}

/// Encode a frame into the wire format.
///
/// ```text
/// ┌──────────────┬───────────┬──────────┬─────────────────┐
/// │ Magic (2B)   │ Length    │ Kind     │ Payload          │
/// │ 0x43 0x49    │ (4B LE)   │ (2B LE)  │ (Length bytes)   │
/// │ "CI"         │           │          │                  │
/// └──────────────┴───────────┴──────────┴─────────────────┘
/// ```
pub fn encode_frame(kind: FrameKind, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > u32::MAX as usize {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: u32::MAX as usize,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_slice(&MAGIC);
    dst.put_u32_le(payload.len() as u32);
    dst.put_u16_le(kind.as_u16());
    dst.put_slice(payload);
    Ok(())
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer. On
/// `PayloadTooLarge`/`UnknownKind` the buffer is left untouched so the caller
/// can skip the advertised frame.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Frame>> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    if src[0..2] != MAGIC {
        return Err(FrameError::InvalidMagic);
    }

    let payload_len = u32::from_le_bytes([src[2], src[3], src[4], src[5]]) as usize;
    let raw_kind = u16::from_le_bytes([src[6], src[7]]);

    if payload_len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }
    let kind = FrameKind::from_u16(raw_kind).ok_or(FrameError::UnknownKind {
        kind: raw_kind,
        len: payload_len,
    })?;

    let total = HEADER_SIZE + payload_len;
    if src.len() < total {
        return Ok(None);
    }

    src.advance(HEADER_SIZE);
    let payload = src.split_to(payload_len).freeze();

    Ok(Some(Frame { kind, payload }))
}

/// Configuration for the frame codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 16 MiB.
    pub max_payload_size: usize,
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            read_timeout: None,
            write_timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_frame_roundtrip() {
        let mut buf = BytesMut::new();
        let payload = b"abcde\t5\t1.5\t2.0-0.5j\n";

        encode_frame(FrameKind::Data, payload, &mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_SIZE + payload.len());

        let frame = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();
        assert_eq!(frame.kind, FrameKind::Data);
        assert_eq!(frame.payload.as_ref(), payload);
        assert!(buf.is_empty());
    }

    #[test]
    fn end_of_stream_frame_has_no_payload() {
        let mut buf = BytesMut::new();
        encode_frame(FrameKind::EndOfStream, b"", &mut buf).unwrap();

        let frame = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();
        assert_eq!(frame, Frame::end_of_stream());
    }

    #[test]
    fn empty_data_frame_is_distinct_from_end_of_stream() {
        let mut buf = BytesMut::new();
        encode_frame(FrameKind::Data, b"", &mut buf).unwrap();

        let frame = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();
        assert_eq!(frame.kind, FrameKind::Data);
        assert!(frame.payload.is_empty());
    }

    #[test]
    fn incomplete_header_needs_more() {
        let mut buf = BytesMut::from(&[0x43, 0x49, 0x00][..]);
        assert!(decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .is_none());
    }

    #[test]
    fn incomplete_payload_needs_more() {
        let mut buf = BytesMut::new();
        encode_frame(FrameKind::Data, b"hello", &mut buf).unwrap();
        buf.truncate(HEADER_SIZE + 2);

        assert!(decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .is_none());
    }

    #[test]
    fn invalid_magic() {
        let mut buf = BytesMut::from(&[0xFF, 0xFF, 0, 0, 0, 0, 0, 0][..]);
        let result = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD);
        assert!(matches!(result, Err(FrameError::InvalidMagic)));
    }

    #[test]
    fn unknown_kind_reports_length() {
        let mut buf = BytesMut::new();
        buf.put_slice(&MAGIC);
        buf.put_u32_le(3);
        buf.put_u16_le(9);
        buf.put_slice(b"abc");

        let result = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD);
        assert!(matches!(
            result,
            Err(FrameError::UnknownKind { kind: 9, len: 3 })
        ));
        assert_eq!(buf.len(), HEADER_SIZE + 3);
    }

    #[test]
    fn payload_too_large() {
        let mut buf = BytesMut::new();
        buf.put_slice(&MAGIC);
        buf.put_u32_le(1024 * 1024 * 32);
        buf.put_u16_le(0);

        let result = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD);
        assert!(matches!(result, Err(FrameError::PayloadTooLarge { .. })));
    }

    #[test]
    fn kind_wire_values() {
        assert_eq!(FrameKind::from_u16(0), Some(FrameKind::Data));
        assert_eq!(FrameKind::from_u16(1), Some(FrameKind::EndOfStream));
        assert_eq!(FrameKind::from_u16(2), None);
        assert_eq!(Frame::data(Bytes::from_static(b"test")).wire_size(), HEADER_SIZE + 4);
    }
}
