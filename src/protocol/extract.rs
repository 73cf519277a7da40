//! JSON Extraction from Raw Terminal Output
//!
//! The in-VM process prints its result as a JSON object somewhere in a
//! stream full of echoes, prompts, and progress chatter. There is no
//! framing, so the result has to be carved out: find the first balanced
//! brace-delimited span and try to parse it.
//!
//! A balanced-brace scanner with an explicit depth counter is used instead
//! of a regex: brace matching is not regular, and the result object nests
//! (`error_details`, provider payloads) deeper than any fixed pattern
//! tolerates.

use serde_json::Value;

/// Nesting depth bound for the scanner
///
/// Anything deeper than this in terminal output is noise, not a result.
pub const MAX_NESTING_DEPTH: usize = 32;

/// Extract the first JSON object embedded in arbitrary text
///
/// Only the first syntactically balanced `{...}` span is attempted
/// (first-match-wins); the producing process is expected to emit at most
/// one object intended for consumption. A span that balances but fails to
/// parse yields `None`: "no JSON yet" is a normal, retryable condition,
/// never an error.
pub fn extract_json(text: &str) -> Option<Value> {
    let span = first_balanced_span(text)?;
    serde_json::from_str(span).ok()
}

/// Find the first balanced `{...}` span in the text
///
/// String-aware: braces inside JSON string literals (and escaped quotes
/// inside those) do not affect the depth count.
fn first_balanced_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in text.as_bytes()[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => {
                depth += 1;
                if depth > MAX_NESTING_DEPTH {
                    return None;
                }
            }
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + 1]);
                }
            }
            _ => {}
        }
    }

    // Ran off the end with unbalanced braces: the object is still being
    // printed. The next poll will see more of it.
    None
}
