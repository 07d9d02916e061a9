//! Typed channels between independently running models.
//!
//! A model reads and writes three kinds of messages: text lines, formatted
//! rows and whole column-major tables. The format of a row is a printf-style
//! format string, parsed once into a [`FormatDescriptor`].
//!
//! # Crate Structure
//!
//! - [`transport`]: message transport contract, Unix sockets, in-memory pipes
//! - [`frame`]: length-prefixed framing with an end-of-stream marker
//! - [`format`]: format descriptors, values, tables
//! - [`channel`]: line/row/array endpoints, file backing, registry
//!
//! ```
//! use cisio::{ArrayInput, ArrayOutput, FormatDescriptor};
//!
//! let format = FormatDescriptor::parse("%d\t%d\n").unwrap();
//! let (sink, source) = cisio::transport::pipe();
//! let mut output = ArrayOutput::new("out", sink, format.clone());
//! let mut input = ArrayInput::new("in", source, format);
//!
//! output.send_columns((vec![1i64, 2, 3], vec![4i64, 5, 6])).unwrap();
//! let (a, b): (Vec<i64>, Vec<i64>) = input.recv_as().unwrap();
//! assert_eq!(a, [1, 2, 3]);
//! assert_eq!(b, [4, 5, 6]);
//! ```

/// Re-export transport types.
pub mod transport {
    pub use cisio_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use cisio_frame::*;
}

/// Re-export format descriptor types.
pub mod format {
    pub use cisio_format::*;
}

/// Re-export channel endpoint types.
pub mod channel {
    pub use cisio_channel::*;
}

pub use cisio_channel::{
    ArrayInput, ArrayOutput, ChannelAddress, ChannelConfig, ChannelError, ChannelRegistry,
    ChannelState, LineInput, LineOutput, RowInput, RowOutput,
};
pub use cisio_format::{Complex, FieldKind, FormatDescriptor, Table, Value};
