//! Result Projection
//!
//! Normalizes whatever a completion race recovered (or failed to recover)
//! into the [`AccountRecord`] schema the rest of the application consumes.
//! Projection is total: every outcome maps to a well-formed record, and
//! failures become `status = failed` records instead of errors.

use serde_json::{Map, Value};
use tracing::debug;

use crate::models::{AccountRecord, AccountStatus, GenerationRequest};
use crate::protocol::RaceOutcome;

/// Password filled in when the recovered object carries none
pub const DEFAULT_GENERATED_PASSWORD: &str = "GeneratedPassword123!";

/// Backend tag for records produced through the VM terminal
pub const VM_METHOD: &str = "vm_terminal";

/// Maps race outcomes onto account records
#[derive(Debug, Default, Clone, Copy)]
pub struct ResultProjector;

impl ResultProjector {
    /// Project a race outcome onto an account record
    ///
    /// Missing required fields are filled with deterministic defaults
    /// derived from the request; the timestamp is freshly stamped on every
    /// call. Unrecognized fields in a recovered object are carried through
    /// as extras.
    pub fn project(outcome: &RaceOutcome, request: &GenerationRequest) -> AccountRecord {
        match outcome {
            RaceOutcome::Succeeded(value) => Self::project_value(value, request),
            RaceOutcome::Exhausted { .. } => {
                debug!("Projecting exhausted outcome to a degraded record");
                let mut record = AccountRecord::new(
                    format!("{}@gmail.com", request.default_email()),
                    "Check terminal output",
                );
                record.status = AccountStatus::Completed;
                record.method = Some(VM_METHOD.to_string());
                record.first_name = Some(request.first_name.clone());
                record.last_name = Some(request.last_name.clone());
                record.note = Some(
                    "Generation completed but the JSON result could not be recovered \
                     mechanically. Check the raw terminal log; the result may also be in \
                     /tmp/account_result.json inside the VM."
                        .to_string(),
                );
                record
            }
            RaceOutcome::Failed { reason } => {
                debug!("Projecting failed outcome: {}", reason);
                let mut record = AccountRecord::failed(
                    format!("{}@gmail.com", request.default_email()),
                    reason.clone(),
                );
                record.method = Some(VM_METHOD.to_string());
                record.first_name = Some(request.first_name.clone());
                record.last_name = Some(request.last_name.clone());
                record
            }
        }
    }

    /// Project a recovered JSON object, filling gaps from the request
    fn project_value(value: &Value, request: &GenerationRequest) -> AccountRecord {
        let mut fields = match value {
            Value::Object(map) => map.clone(),
            // The scanner only yields objects, but projection stays total
            other => {
                let mut map = Map::new();
                map.insert("result".to_string(), other.clone());
                map
            }
        };

        let email = take_string(&mut fields, &["email"])
            .unwrap_or_else(|| format!("{}@gmail.com", request.default_email()));
        let password = take_string(&mut fields, &["password"])
            .unwrap_or_else(|| DEFAULT_GENERATED_PASSWORD.to_string());
        let status = take_string(&mut fields, &["status"])
            .and_then(|s| parse_status(&s))
            .unwrap_or(AccountStatus::Generated);
        let first_name = take_string(&mut fields, &["first_name", "firstName"])
            .unwrap_or_else(|| request.first_name.clone());
        let last_name = take_string(&mut fields, &["last_name", "lastName"])
            .unwrap_or_else(|| request.last_name.clone());
        let note = take_string(&mut fields, &["note"]);
        let error = take_string(&mut fields, &["error"]);

        // Always stamp fresh; a stale in-VM clock is not worth trusting
        fields.remove("timestamp");

        let mut record = AccountRecord::new(email, password);
        record.status = status;
        record.method = Some(VM_METHOD.to_string());
        record.first_name = Some(first_name);
        record.last_name = Some(last_name);
        record.note = note;
        record.error = error;
        record.extra = fields;
        record
    }
}

/// Remove and return the first present alias as a string
fn take_string(fields: &mut Map<String, Value>, aliases: &[&str]) -> Option<String> {
    for key in aliases {
        if let Some(value) = fields.remove(*key) {
            match value {
                Value::String(s) if !s.is_empty() => return Some(s),
                Value::String(_) => continue,
                other => return Some(other.to_string()),
            }
        }
    }
    None
}

fn parse_status(s: &str) -> Option<AccountStatus> {
    match s {
        "generated" => Some(AccountStatus::Generated),
        "verified" => Some(AccountStatus::Verified),
        "completed" => Some(AccountStatus::Completed),
        "failed" => Some(AccountStatus::Failed),
        _ => None,
    }
}
