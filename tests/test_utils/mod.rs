//! Test Utilities and Mocks
//!
//! Shared across the integration, contract, and flow test targets.

pub mod canned_api;

// Re-exports for convenience
pub use canned_api::spawn_canned_api;
pub use mock_vm::{MockVm, ScriptedResponse};
