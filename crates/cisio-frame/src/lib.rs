//! Length-prefixed message framing for cisio stream transports.
//!
//! Every message is framed with:
//! - A 2-byte magic number ("CI") for stream synchronization
//! - A 4-byte little-endian payload length
//! - A 2-byte little-endian frame kind (data or end-of-stream)
//!
//! [`FrameReader`] and [`FrameWriter`] implement the `cisio-transport`
//! message traits, so any `Read`/`Write` pair becomes a channel transport.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_frame, encode_frame, Frame, FrameConfig, FrameKind, DEFAULT_MAX_PAYLOAD, HEADER_SIZE,
};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
