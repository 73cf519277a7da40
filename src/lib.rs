//! credmint - Headless disposable-credential automation
//!
//! This library provides the core of a system that mints disposable
//! email/account credentials through three interchangeable backends: a
//! terminal-driven virtual machine, a disposable-mailbox REST API, and a
//! lab-credential REST API.
//!
//! ## Features
//!
//! - **Terminal protocol:** Drive an opaque virtual terminal through raw
//!   keystrokes and carve structured JSON results out of its unframed
//!   output stream
//! - **Completion racing:** Race the weak "new output appeared" heuristic
//!   against JSON appearance, with a fallback re-scan
//! - **Sessions:** Explicit context objects instead of globals; one
//!   generation in flight at a time, enforced
//! - **API backends:** Mailbox and lab clients producing the same
//!   normalized records the VM flow does
//! - **Configuration:** TOML-based configuration files
//!
//! ## Module Organization
//!
//! ### Core Functionality
//!
//! - [`terminal`] - Output buffer, sink interception, prompt detection
//! - [`protocol`] - Command channel, JSON extraction, completion race
//! - [`session`] - VM-backed generation sessions
//! - [`models`] - Data structures (AccountRecord, PendingCommand)
//! - [`mod@error`] - Error types and Result aliases
//!
//! ### Backends and Support
//!
//! - [`api`] - Mailbox and lab HTTP collaborators
//! - [`vm`] - The VirtualMachine boundary trait
//! - [`script`] - In-VM generation script staging
//! - [`projector`] - Outcome-to-record normalization
//! - [`config`] - Configuration loading and timing tables
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use credmint::{Config, GenerationRequest, GenerationSession};
//! # use credmint::error::Result;
//! # use credmint::vm::VirtualMachine;
//!
//! # async fn run(vm: Arc<dyn VirtualMachine>) -> Result<()> {
//! let config = Config::default();
//! let session = GenerationSession::new(vm, config.protocol);
//!
//! session.boot().await?;
//! let record = session
//!     .generate(&GenerationRequest::new("Ada", "Lovelace"))
//!     .await?;
//! println!("{}", serde_json::to_string_pretty(&record).unwrap());
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency Model
//!
//! Cooperative scheduling on the tokio runtime; all "concurrency" is
//! interleaved timers and pending I/O. The output buffer is the one piece
//! of shared mutable state: written by the terminal-write interception
//! point, read by any number of pollers, each re-deriving its view from a
//! stored mark.
//!
//! ## Safety and Reliability
//!
//! - **No Panics:** All fallible operations return `Result`
//! - **Bounded Memory:** The output buffer retains a capped tail
//! - **Total Projection:** Every generation attempt yields a record, even
//!   on failure
//! - **Timeout Caps:** 5-minute hard cap on any single dispatch

#[macro_use]
extern crate tracing;

pub mod config;
pub mod error;

// Core modules
pub mod protocol;
pub mod session;
pub mod terminal;
pub mod vm;

// Backend modules
pub mod api;
pub mod script;

// Model modules
pub mod models;
pub mod projector;

// Re-exports for core functionality
pub use config::{Config, LabConfig, MailboxConfig, ProtocolConfig, VmConfig};
pub use error::{Error, Result};
pub use models::{AccountRecord, AccountStatus, GenerationRequest};
pub use projector::ResultProjector;
pub use protocol::{extract_json, CommandChannel, CompletionRace, RaceOutcome};
pub use session::GenerationSession;
pub use terminal::{MirrorSink, NullSink, OutputBuffer, PromptDetector, TerminalSink};
pub use vm::VirtualMachine;

// Convenience re-exports for common types
pub use api::{LabClient, MailboxClient, RecaptchaTokens};

// Version information
/// The current version of credmint from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The application name from Cargo.toml
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// The application description from Cargo.toml
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Initialize tracing output for embedders that want it
///
/// Respects `RUST_LOG`; defaults to `info` for this crate. Safe to call
/// once per process; returns quietly if a subscriber is already set.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(concat!(env!("CARGO_PKG_NAME"), "=info")));

    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
    if result.is_ok() {
        info!("🚀 {} v{} tracing initialized", NAME, VERSION);
    }
}
