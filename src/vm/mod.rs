//! Virtual Machine Boundary
//!
//! The VM is an external collaborator: something that boots a Linux image,
//! owns a terminal, and accepts raw keystrokes. The core only needs the two
//! operations below; everything else (disk images, device emulation) is the
//! embedder's problem.

use async_trait::async_trait;

use crate::error::Result;

/// A bootable machine the core can type into
///
/// Output never comes back through this trait. The VM writes it to the
/// [`TerminalSink`] it was constructed with, and the core observes it
/// through the mirrored [`OutputBuffer`].
///
/// [`TerminalSink`]: crate::terminal::TerminalSink
/// [`OutputBuffer`]: crate::terminal::OutputBuffer
#[async_trait]
pub trait VirtualMachine: Send + Sync {
    /// Boot the machine; resolves once the VM is running (not necessarily
    /// once a shell is ready; see the session boot wait)
    async fn init(&self) -> Result<()>;

    /// Deliver raw keystrokes to the VM's terminal input
    fn send_input(&self, text: &str) -> Result<()>;
}
