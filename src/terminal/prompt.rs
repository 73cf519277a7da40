//! Prompt Detection Logic
//!
//! Detects shell readiness in raw terminal output. Used by the boot wait to
//! decide when the VM's shell is accepting input.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::error::Result;

/// Patterns matched against the tail line of the buffer
///
/// Note: Pattern order matters! More specific patterns should come before
/// generic ones to avoid false matches.
static DEFAULT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"bash-\d+\.\d+\$ ?$",
        r"\w+@[\w.-]+:[^\n]*[$#] ?$",
        r"[$#] $",
    ]
    .iter()
    .filter_map(|pattern| match Regex::new(pattern) {
        Ok(regex) => Some(regex),
        Err(e) => {
            warn!("Failed to compile prompt pattern '{}': {}", pattern, e);
            None
        }
    })
    .collect()
});

/// Substrings accepted anywhere in the stream
const PROMPT_MARKERS: [&str; 2] = ["$ ", "# "];

/// Prompt detector over raw terminal output
///
/// The VM gives no structured "shell is ready" signal, so readiness is
/// inferred from prompt-looking text in the stream.
#[derive(Debug)]
pub struct PromptDetector {
    prompt_patterns: Vec<Regex>,
}

impl PromptDetector {
    /// Create a detector with the default shell prompt patterns
    pub fn new() -> Self {
        Self {
            prompt_patterns: DEFAULT_PATTERNS.clone(),
        }
    }

    /// Add a custom prompt pattern at runtime
    pub fn add_custom_pattern(&mut self, pattern: &str) -> Result<()> {
        let regex = Regex::new(pattern)?;
        self.prompt_patterns.push(regex);
        Ok(())
    }

    /// Whether the output contains evidence of a shell prompt
    pub fn contains_prompt(&self, output: &str) -> bool {
        if PROMPT_MARKERS.iter().any(|m| output.contains(m)) {
            return true;
        }
        let tail = output.lines().last().unwrap_or(output);
        self.prompt_patterns.iter().any(|p| p.is_match(tail))
    }

    /// Whether the output *ends* at a shell prompt
    ///
    /// Stricter than [`contains_prompt`]: the prompt must be the last thing
    /// written, i.e. the shell is idle right now.
    ///
    /// [`contains_prompt`]: PromptDetector::contains_prompt
    pub fn ends_at_prompt(&self, output: &str) -> bool {
        let tail = output.lines().last().unwrap_or(output);
        self.prompt_patterns.iter().any(|p| p.is_match(tail))
    }
}

impl Default for PromptDetector {
    fn default() -> Self {
        Self::new()
    }
}
