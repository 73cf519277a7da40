//! Terminal Sink Interception
//!
//! The VM collaborator is handed a terminal sink it writes raw output to.
//! The core wraps whatever sink the embedder supplies so that every write
//! is mirrored into the shared [`OutputBuffer`] before being forwarded for
//! display.

use std::sync::Arc;

use crate::terminal::buffer::OutputBuffer;

/// Display side of the virtual terminal, as seen by the VM
pub trait TerminalSink: Send + Sync {
    /// Write raw output bytes (already decoded to text) to the terminal
    fn write(&self, data: &str);

    /// Clear the terminal display
    fn clear(&self);
}

/// Sink adapter that mirrors every write into the output buffer
///
/// Appending happens before the forward so that a poller woken by the
/// display never observes the buffer lagging behind what is on screen.
pub struct MirrorSink<S: TerminalSink> {
    inner: S,
    buffer: Arc<OutputBuffer>,
}

impl<S: TerminalSink> MirrorSink<S> {
    /// Wrap a sink so its writes are mirrored into `buffer`
    pub fn new(inner: S, buffer: Arc<OutputBuffer>) -> Self {
        Self { inner, buffer }
    }

    /// The shared buffer this sink mirrors into
    pub fn buffer(&self) -> &Arc<OutputBuffer> {
        &self.buffer
    }
}

impl<S: TerminalSink> TerminalSink for MirrorSink<S> {
    fn write(&self, data: &str) {
        self.buffer.append(data);
        self.inner.write(data);
    }

    fn clear(&self) {
        self.inner.clear();
        self.buffer.clear();
    }
}

/// Sink that discards display output, for headless embedders
///
/// The mirror still captures everything, so the protocol works without any
/// attached display.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl TerminalSink for NullSink {
    fn write(&self, _data: &str) {}
    fn clear(&self) {}
}
