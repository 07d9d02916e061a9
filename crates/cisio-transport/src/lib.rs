//! Message transport contract for cisio channels.
//!
//! Channels never touch sockets or files directly. They move whole messages
//! through two narrow traits:
//! - [`MessageSink`] accepts messages plus an explicit end-of-stream signal
//! - [`MessageSource`] yields messages until end-of-stream
//!
//! This crate also provides the stream types the reference transports are
//! built on: Unix domain sockets (Linux/macOS) and an in-process pipe.

pub mod error;
pub mod memory;
pub mod stream;
pub mod traits;

#[cfg(unix)]
pub mod uds;

pub use error::{Result, TransportError};
pub use memory::{pipe, MemorySink, MemorySource};
pub use stream::IpcStream;
pub use traits::{MessageSink, MessageSource, Received};

#[cfg(unix)]
pub use uds::UnixDomainSocket;
