//! Account Record Model
//!
//! The normalized result schema every backend produces, success or failure.
//! A generation attempt yields exactly one record; failures become records
//! with `status = failed` and an `error` field rather than escaping as
//! errors past the generation boundary.
//!
//! ## Security Note
//!
//! Records carry live credentials. They serialize for display and transfer
//! to the caller, but **should never be persisted to disk** by this crate;
//! if an embedder stores them, that is an explicit opt-in on its side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lifecycle status of a generated account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// Credentials were produced but not independently confirmed
    #[default]
    Generated,
    /// Credentials were confirmed (e.g. via an inbox verification message)
    Verified,
    /// The flow ran to completion but the result could not be recovered
    /// mechanically; the operator should check the raw log
    Completed,
    /// The flow failed; see the `error` field
    Failed,
}

/// Normalized account credentials surfaced to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Account email address
    pub email: String,

    /// Account password
    pub password: String,

    /// Outcome of the generation attempt
    pub status: AccountStatus,

    /// When this record was produced
    pub timestamp: DateTime<Utc>,

    /// Which backend produced the record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    /// Human-readable guidance for the operator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    /// What went wrong, when `status` is `failed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Provider-specific fields carried through verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AccountRecord {
    /// Create a bare record with the given credentials
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            status: AccountStatus::Generated,
            timestamp: Utc::now(),
            method: None,
            first_name: None,
            last_name: None,
            note: None,
            error: None,
            extra: Map::new(),
        }
    }

    /// Create a failed record carrying an error message
    pub fn failed(email: impl Into<String>, error: impl Into<String>) -> Self {
        let mut record = Self::new(email, String::new());
        record.status = AccountStatus::Failed;
        record.error = Some(error.into());
        record
    }

    /// Whether the attempt produced usable credentials
    pub fn is_usable(&self) -> bool {
        matches!(self.status, AccountStatus::Generated | AccountStatus::Verified)
    }

    /// Attach a provider-specific field
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Caller inputs for one generation attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Account holder first name
    pub first_name: String,

    /// Account holder last name
    pub last_name: String,

    /// Desired mailbox name; names are concatenated when absent
    pub username: Option<String>,
}

impl GenerationRequest {
    /// Create a request from first and last name
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            username: None,
        }
    }

    /// Set the desired username
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// The local part used for deterministic defaults
    pub fn default_email(&self) -> String {
        match &self.username {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => format!("{}{}", self.first_name, self.last_name),
        }
    }
}
