//! Command Channel
//!
//! Sends a line of input to the virtual terminal and watches the shared
//! output buffer for evidence the command ran. There is no end-of-command
//! marker from the shell, so "any new byte appeared past the dispatch
//! mark" is the completion heuristic; callers that need a structured
//! result additionally race on JSON appearance (see [`race`]).
//!
//! [`race`]: crate::protocol::race

use std::sync::{Arc, RwLock};
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{CommandOutcome, PendingCommand};
use crate::terminal::OutputBuffer;
use crate::vm::VirtualMachine;

/// Interval between delta checks while waiting for output
pub const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Default budget for the output wait
pub const DEFAULT_WAIT: Duration = Duration::from_millis(3000);

/// Hard cap on any single dispatch; a safety net, not the primary
/// completion signal
pub const DISPATCH_CAP: Duration = Duration::from_secs(300);

/// Resolved value when the poll budget elapses without output
pub const NO_OUTPUT_SENTINEL: &str = "Command executed";

/// Keystroke path into the VM plus the completion heuristic over the buffer
pub struct CommandChannel {
    buffer: Arc<OutputBuffer>,
    vm: RwLock<Option<Arc<dyn VirtualMachine>>>,
    poll_interval: Duration,
    dispatch_cap: Duration,
}

impl CommandChannel {
    /// Create a channel over the given buffer, with no VM bound yet
    pub fn new(buffer: Arc<OutputBuffer>) -> Self {
        Self {
            buffer,
            vm: RwLock::new(None),
            poll_interval: POLL_INTERVAL,
            dispatch_cap: DISPATCH_CAP,
        }
    }

    /// Override the poll interval and hard cap (used by tests and config)
    pub fn with_timing(mut self, poll_interval: Duration, dispatch_cap: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.dispatch_cap = dispatch_cap;
        self
    }

    /// Bind the VM this channel types into
    pub fn bind(&self, vm: Arc<dyn VirtualMachine>) {
        *self.vm.write().unwrap() = Some(vm);
    }

    /// Whether a VM is bound
    pub fn is_ready(&self) -> bool {
        self.vm.read().unwrap().is_some()
    }

    /// The buffer this channel watches
    pub fn buffer(&self) -> &Arc<OutputBuffer> {
        &self.buffer
    }

    /// Send a command and wait for output with the default budget
    pub async fn send(&self, command: &str) -> Result<String> {
        self.send_with_wait(command, DEFAULT_WAIT).await
    }

    /// Send a command and wait up to `wait` for new output
    ///
    /// Resolves with the output delta past the dispatch mark as soon as any
    /// appears, or with [`NO_OUTPUT_SENTINEL`] once `ceil(wait / poll)`
    /// ticks have elapsed. Independently, the hard dispatch cap fails the
    /// send regardless of polling state.
    pub async fn send_with_wait(&self, command: &str, wait: Duration) -> Result<String> {
        let vm = self
            .vm
            .read()
            .unwrap()
            .clone()
            .ok_or(Error::ChannelNotReady)?;

        if command.trim().is_empty() {
            return Err(Error::EmptyCommand);
        }

        let mut pending = PendingCommand::new(command, self.buffer.mark(), self.dispatch_cap);
        debug!(
            dispatch_id = %pending.id,
            mark = pending.start_mark,
            "Dispatching command: {}",
            command
        );

        vm.send_input(&format!("{}\n", command))?;

        let max_checks = ((wait.as_millis() + self.poll_interval.as_millis() - 1)
            / self.poll_interval.as_millis())
        .max(1) as u64;

        let poll = self.watch_for_delta(pending.start_mark, max_checks);

        match tokio::time::timeout(self.dispatch_cap, poll).await {
            Ok(Some(delta)) => {
                pending.resolve(CommandOutcome::Output(delta.clone()));
                Ok(delta)
            }
            Ok(None) => {
                debug!(dispatch_id = %pending.id, "No output within wait budget");
                pending.resolve(CommandOutcome::NoOutput);
                Ok(NO_OUTPUT_SENTINEL.to_string())
            }
            Err(_) => {
                warn!(dispatch_id = %pending.id, "Dispatch hit the hard cap");
                pending.resolve(CommandOutcome::TimedOut);
                Err(Error::DispatchTimeout {
                    command: command.to_string(),
                    duration: self.dispatch_cap,
                })
            }
        }
    }

    /// Poll for a non-empty delta past the mark, up to `max_checks` ticks
    async fn watch_for_delta(&self, mark: usize, max_checks: u64) -> Option<String> {
        let mut checks = 0u64;
        loop {
            tokio::time::sleep(self.poll_interval).await;
            checks += 1;

            let delta = self.buffer.delta_since(mark);
            if !delta.is_empty() {
                return Some(delta);
            }
            if checks >= max_checks {
                return None;
            }
        }
    }
}

impl std::fmt::Debug for CommandChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandChannel")
            .field("ready", &self.is_ready())
            .field("poll_interval", &self.poll_interval)
            .field("dispatch_cap", &self.dispatch_cap)
            .finish()
    }
}
