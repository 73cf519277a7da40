//! Terminal Command/Response Protocol
//!
//! The mechanism that sends a shell command into an opaque virtual terminal
//! and recovers a structured result from its unframed output stream:
//! dispatch and the output-delta heuristic ([`channel`]), JSON carving
//! ([`extract`]), and the completion race that combines them ([`race`]).

pub mod channel;
pub mod extract;
pub mod race;

// Re-exports for convenience
pub use channel::{CommandChannel, DEFAULT_WAIT, DISPATCH_CAP, NO_OUTPUT_SENTINEL, POLL_INTERVAL};
pub use extract::{extract_json, MAX_NESTING_DEPTH};
pub use race::{CompletionRace, RaceOutcome, DEFAULT_JSON_WAIT, JSON_POLL_INTERVAL};
