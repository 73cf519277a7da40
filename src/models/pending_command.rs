//! Pending Command Model
//!
//! Bookkeeping for one in-flight shell invocation: what was sent, where the
//! buffer stood at dispatch time, and how it ended. A pending command is
//! created at dispatch, resolved exactly once, and never reused.

use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

/// How a dispatched command ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// New output appeared past the dispatch mark
    Output(String),
    /// The poll budget elapsed without any new output
    NoOutput,
    /// The hard dispatch cap fired
    TimedOut,
}

/// One in-flight shell invocation
#[derive(Debug, Clone)]
pub struct PendingCommand {
    /// Unique identifier for the dispatch
    pub id: String,

    /// The command text that was sent
    pub command: String,

    /// Buffer length at dispatch time; deltas are computed past this
    pub start_mark: usize,

    /// When the command was dispatched
    pub dispatched_at: DateTime<Utc>,

    /// Hard deadline after which the dispatch is abandoned
    pub deadline: DateTime<Utc>,

    outcome: Option<CommandOutcome>,
}

impl PendingCommand {
    /// Create a pending command for a dispatch happening now
    pub fn new(command: impl Into<String>, start_mark: usize, cap: Duration) -> Self {
        let dispatched_at = Utc::now();
        let deadline = dispatched_at
            + chrono::Duration::from_std(cap).unwrap_or_else(|_| chrono::Duration::seconds(300));
        Self {
            id: Uuid::new_v4().to_string(),
            command: command.into(),
            start_mark,
            dispatched_at,
            deadline,
            outcome: None,
        }
    }

    /// Record the outcome; only the first resolution sticks
    pub fn resolve(&mut self, outcome: CommandOutcome) -> bool {
        if self.outcome.is_some() {
            return false;
        }
        self.outcome = Some(outcome);
        true
    }

    /// Whether this command has been resolved
    pub fn is_resolved(&self) -> bool {
        self.outcome.is_some()
    }

    /// The recorded outcome, if resolved
    pub fn outcome(&self) -> Option<&CommandOutcome> {
        self.outcome.as_ref()
    }
}
