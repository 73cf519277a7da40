//! Terminal Output Buffer
//!
//! Append-only mirror of everything written to the virtual terminal.
//! The buffer keeps a bounded tail of the stream and broadcasts the full
//! current content to registered listeners after every mutation.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Default retention cap in bytes (the last ~100KB of output)
pub const DEFAULT_BUFFER_CAP: usize = 100_000;

/// Listener callback invoked with the full buffer content after a mutation
pub type BufferListener = Box<dyn Fn(&str) + Send + Sync>;

/// Append-only output sink with bounded retention
///
/// Mutation and notification are decoupled: `append` updates the content
/// under the lock, then delivers snapshots to listeners outside it. A
/// listener that itself appends enqueues the new snapshot, which is
/// delivered after the current notification pass completes, so re-entrant
/// appends cannot recurse or deadlock.
pub struct OutputBuffer {
    /// Current buffer content
    content: Mutex<String>,
    /// Registered listeners, notified in registration order
    listeners: Mutex<Vec<BufferListener>>,
    /// Snapshots awaiting delivery
    pending: Mutex<VecDeque<String>>,
    /// Whether a notification pass is currently draining the queue
    draining: AtomicBool,
    /// Maximum retained bytes
    cap: usize,
}

impl std::fmt::Debug for OutputBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputBuffer")
            .field("len", &self.len())
            .field("cap", &self.cap)
            .finish()
    }
}

impl OutputBuffer {
    /// Create a buffer with the default retention cap
    pub fn new() -> Self {
        Self::with_cap(DEFAULT_BUFFER_CAP)
    }

    /// Create a buffer with a custom retention cap
    pub fn with_cap(cap: usize) -> Self {
        Self {
            content: Mutex::new(String::new()),
            listeners: Mutex::new(Vec::new()),
            pending: Mutex::new(VecDeque::new()),
            draining: AtomicBool::new(false),
            cap,
        }
    }

    /// Append a chunk of terminal output
    ///
    /// Trims from the front (oldest data first) once the cap is exceeded,
    /// then notifies all listeners with the full current buffer.
    pub fn append(&self, chunk: &str) {
        let snapshot = {
            let mut content = self.content.lock().unwrap();
            content.push_str(chunk);
            if content.len() > self.cap {
                let mut cut = content.len() - self.cap;
                while !content.is_char_boundary(cut) {
                    cut += 1;
                }
                content.drain(..cut);
            }
            content.clone()
        };
        self.enqueue_notification(snapshot);
    }

    /// Current buffer content at call time
    pub fn snapshot(&self) -> String {
        self.content.lock().unwrap().clone()
    }

    /// Current buffer length in bytes
    ///
    /// Captured before an operation and used with [`delta_since`] to
    /// compute "what's new".
    ///
    /// [`delta_since`]: OutputBuffer::delta_since
    pub fn mark(&self) -> usize {
        self.content.lock().unwrap().len()
    }

    /// Everything appended past a previously captured mark
    ///
    /// If the buffer trimmed past the mark in the meantime the delta is
    /// clamped to the current content; callers re-derive their view from the
    /// mark on every poll rather than assuming exclusive access.
    pub fn delta_since(&self, mark: usize) -> String {
        let content = self.content.lock().unwrap();
        if mark >= content.len() {
            return String::new();
        }
        let mut start = mark;
        while !content.is_char_boundary(start) {
            start += 1;
        }
        content[start..].to_string()
    }

    /// Buffer length in bytes
    pub fn len(&self) -> usize {
        self.content.lock().unwrap().len()
    }

    /// Whether the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.content.lock().unwrap().is_empty()
    }

    /// Reset to empty and notify listeners
    pub fn clear(&self) {
        {
            let mut content = self.content.lock().unwrap();
            content.clear();
        }
        self.enqueue_notification(String::new());
    }

    /// Register a listener; notified in registration order
    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.listeners.lock().unwrap().push(Box::new(listener));
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }

    /// Queue a snapshot for delivery and drain the queue if no pass is
    /// already doing so
    fn enqueue_notification(&self, snapshot: String) {
        self.pending.lock().unwrap().push_back(snapshot);

        // Only the outermost caller drains; re-entrant appends just enqueue.
        if self.draining.swap(true, Ordering::AcqRel) {
            return;
        }
        loop {
            loop {
                let next = self.pending.lock().unwrap().pop_front();
                let Some(snapshot) = next else { break };
                let listeners = self.listeners.lock().unwrap();
                for listener in listeners.iter() {
                    listener(&snapshot);
                }
            }
            self.draining.store(false, Ordering::Release);
            // A chunk may have slipped in between the last pop and the flag
            // reset; pick it up if nobody else has.
            if self.pending.lock().unwrap().is_empty()
                || self.draining.swap(true, Ordering::AcqRel)
            {
                break;
            }
        }
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}
