//! Typed channels between independently running models.
//!
//! Three payload shapes share one lifecycle (`Open`, `Drained`, `Closed`):
//! - [`LineInput`]/[`LineOutput`]: one text line per message
//! - [`RowInput`]/[`RowOutput`]: one formatted record per message
//! - [`ArrayInput`]/[`ArrayOutput`]: a whole column-major table per message
//!
//! Endpoints are generic over the `cisio-transport` traits, so the same
//! code runs over in-memory pipes, framed Unix sockets ([`socket`]) and
//! plain text files ([`file`]). A [`ChannelRegistry`] opens endpoints by
//! logical name.
//!
//! ```
//! use cisio_channel::{RowInput, RowOutput};
//! use cisio_format::FormatDescriptor;
//!
//! let format = FormatDescriptor::parse("%s\t%d\n").unwrap();
//! let (sink, source) = cisio_transport::pipe();
//! let mut output = RowOutput::new("out", sink, format.clone());
//! let mut input = RowInput::new("in", source, format);
//!
//! output.send_row(("apples", 3)).unwrap();
//! output.close().unwrap();
//!
//! let (name, count): (String, i64) = input.recv_as().unwrap();
//! assert_eq!((name.as_str(), count), ("apples", 3));
//! assert!(input.recv().unwrap_err().is_end_of_stream());
//! ```

pub mod array;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod file;
pub mod line;
pub mod registry;
pub mod row;

#[cfg(unix)]
pub mod socket;

pub use array::{ArrayInput, ArrayOutput};
pub use config::{ChannelConfig, DEFAULT_MAX_LINE_LEN};
pub use endpoint::{ChannelState, Deliver, Incoming, Receive};
pub use error::{ChannelError, Result};
pub use file::{
    FileArrayInput, FileArrayOutput, FileLineInput, FileLineOutput, FileMode, FileRowInput,
    FileRowOutput, FileSink, FileSource, Framing,
};
pub use line::{LineInput, LineOutput};
pub use registry::{
    ChannelAddress, ChannelRegistry, DynArrayInput, DynArrayOutput, DynLineInput, DynLineOutput,
    DynRowInput, DynRowOutput, ENV_PREFIX,
};
pub use row::{RowInput, RowOutput};

#[cfg(unix)]
pub use socket::{
    SocketArrayInput, SocketArrayOutput, SocketLineInput, SocketLineOutput, SocketRowInput,
    SocketRowOutput, SocketSink, SocketSource,
};
