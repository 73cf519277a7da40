//! Completion Race
//!
//! Runs a command and races two completion-detection strategies: the weak
//! "new output appeared" heuristic from the command channel, and a poll for
//! a parseable JSON object in the live buffer. JSON evidence always wins;
//! the channel heuristic merely reports that *something* happened.
//!
//! States are terminal and never retried; a fresh generation starts a
//! brand-new race from a fresh buffer mark.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::Result;
use crate::protocol::channel::CommandChannel;
use crate::protocol::extract::extract_json;
use crate::terminal::OutputBuffer;

/// Interval between extraction attempts while racing
pub const JSON_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Default budget for the JSON race
pub const DEFAULT_JSON_WAIT: Duration = Duration::from_secs(60);

/// Terminal state of one command/collect cycle
#[derive(Debug, Clone, PartialEq)]
pub enum RaceOutcome {
    /// A JSON object was recovered from the output stream
    Succeeded(Value),
    /// The command ran (per the weak heuristic) but no JSON ever appeared;
    /// `raw` carries the dispatch text so the operator can be pointed at
    /// the terminal log
    Exhausted { raw: String },
    /// Dispatch failed outright with no JSON evidence at all
    Failed { reason: String },
}

impl RaceOutcome {
    /// Whether a JSON result was recovered
    pub fn is_succeeded(&self) -> bool {
        matches!(self, RaceOutcome::Succeeded(_))
    }

    /// The recovered value, if any
    pub fn value(&self) -> Option<&Value> {
        match self {
            RaceOutcome::Succeeded(value) => Some(value),
            _ => None,
        }
    }
}

/// Command runner that extracts structured results from the buffer
pub struct CompletionRace {
    buffer: Arc<OutputBuffer>,
    channel: Arc<CommandChannel>,
    json_poll: Duration,
}

impl CompletionRace {
    /// Create a race over the channel's buffer
    pub fn new(buffer: Arc<OutputBuffer>, channel: Arc<CommandChannel>) -> Self {
        Self {
            buffer,
            channel,
            json_poll: JSON_POLL_INTERVAL,
        }
    }

    /// Override the JSON poll interval (used by tests and config)
    pub fn with_json_poll(mut self, json_poll: Duration) -> Self {
        self.json_poll = json_poll;
        self
    }

    /// Run a command and collect a JSON result from its output
    ///
    /// Protocol: dispatch through the channel with `exec_wait`; concurrently
    /// poll the live buffer for an extractable object up to `json_wait`.
    /// The instant an extraction succeeds the race resolves `Succeeded`,
    /// even if the dispatch has not resolved or later fails. If the JSON
    /// poll times out, one final extraction runs against the full buffer
    /// before the outcome degrades to `Exhausted` (dispatch ok) or
    /// `Failed` (dispatch error).
    pub async fn run_and_collect(
        &self,
        command: &str,
        exec_wait: Duration,
        json_wait: Duration,
    ) -> RaceOutcome {
        info!("Running command with JSON collection: {}", command);

        let dispatch = self.channel.send_with_wait(command, exec_wait);
        let json_watch = Self::watch_for_json(&self.buffer, self.json_poll, json_wait);
        tokio::pin!(dispatch);
        tokio::pin!(json_watch);

        let mut dispatch_result: Option<Result<String>> = None;
        let mut json_timed_out = false;

        loop {
            tokio::select! {
                json = &mut json_watch, if !json_timed_out => {
                    match json {
                        Some(value) => {
                            // JSON evidence takes priority over the weak
                            // completion heuristic; the dispatch may still
                            // be pending and is simply dropped.
                            debug!("JSON appeared; race resolved");
                            return RaceOutcome::Succeeded(value);
                        }
                        None => {
                            json_timed_out = true;
                            if dispatch_result.is_some() {
                                break;
                            }
                        }
                    }
                }
                result = &mut dispatch, if dispatch_result.is_none() => {
                    dispatch_result = Some(result);
                    if json_timed_out {
                        break;
                    }
                }
            }
        }

        // JSON race exhausted its budget: one last scan over the full
        // buffer before declaring no result.
        if let Some(value) = extract_json(&self.buffer.snapshot()) {
            debug!("Fallback scan recovered a result");
            return RaceOutcome::Succeeded(value);
        }

        match dispatch_result.expect("dispatch resolved before loop exit") {
            Ok(raw) => {
                info!("No JSON recovered; command output retained for manual review");
                RaceOutcome::Exhausted { raw }
            }
            Err(e) => RaceOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }

    /// Poll the buffer for an extractable object until the budget elapses
    async fn watch_for_json(
        buffer: &Arc<OutputBuffer>,
        poll: Duration,
        budget: Duration,
    ) -> Option<Value> {
        let deadline = Instant::now() + budget;
        loop {
            if let Some(value) = extract_json(&buffer.snapshot()) {
                return Some(value);
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            tokio::time::sleep(poll.min(deadline - now)).await;
        }
    }
}

impl std::fmt::Debug for CompletionRace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionRace")
            .field("json_poll", &self.json_poll)
            .finish()
    }
}
