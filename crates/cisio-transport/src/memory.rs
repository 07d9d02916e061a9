//! In-process message pipe.
//!
//! Useful for wiring two endpoints inside one process (tests, threads acting
//! as models). Boundaries and ordering are preserved by construction.

use std::sync::mpsc::{channel, Receiver, Sender};

use bytes::Bytes;
use tracing::trace;

use crate::error::{Result, TransportError};
use crate::traits::{MessageSink, MessageSource, Received};

enum Envelope {
    Message(Bytes),
    EndOfStream,
}

/// Sending half of an in-memory pipe.
#[derive(Debug)]
pub struct MemorySink {
    tx: Option<Sender<Envelope>>,
}

/// Receiving half of an in-memory pipe.
#[derive(Debug)]
pub struct MemorySource {
    rx: Receiver<Envelope>,
}

/// Create a connected `(sink, source)` pair.
pub fn pipe() -> (MemorySink, MemorySource) {
    let (tx, rx) = channel();
    (MemorySink { tx: Some(tx) }, MemorySource { rx })
}

impl MemorySink {
    fn deliver(&self, envelope: Envelope) -> Result<()> {
        let tx = self.tx.as_ref().ok_or(TransportError::Shutdown)?;
        tx.send(envelope).map_err(|_| TransportError::Disconnected)
    }
}

impl MessageSink for MemorySink {
    fn send(&mut self, payload: &[u8]) -> Result<()> {
        trace!(len = payload.len(), "memory pipe send");
        self.deliver(Envelope::Message(Bytes::copy_from_slice(payload)))
    }

    fn send_eof(&mut self) -> Result<()> {
        self.deliver(Envelope::EndOfStream)
    }

    fn close(&mut self) -> Result<()> {
        self.tx = None;
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "memory"
    }
}

impl MessageSource for MemorySource {
    fn recv(&mut self) -> Result<Received> {
        match self.rx.recv() {
            Ok(Envelope::Message(payload)) => Ok(Received::Message(payload)),
            Ok(Envelope::EndOfStream) => Ok(Received::EndOfStream),
            Err(_) => Err(TransportError::Disconnected),
        }
    }

    fn transport_name(&self) -> &'static str {
        "memory"
    }
}

impl std::fmt::Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Envelope::Message(payload) => write!(f, "Message({} bytes)", payload.len()),
            Envelope::EndOfStream => f.write_str("EndOfStream"),
        }
    }
}
