//! Disposable Mailbox API Client
//!
//! Drives a Gmailnator-style REST API: generate a throwaway address, push a
//! password change through a caller-supplied URL, then watch the inbox for
//! a password-related message as confirmation. No terminal involved; this
//! backend produces the same records the VM flow does, minus the scraping.

use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::config::MailboxConfig;
use crate::error::{Error, Result};
use crate::models::{AccountRecord, AccountStatus};

/// Backend tag for records produced through the mailbox API
pub const MAILBOX_METHOD: &str = "gmailnator_api";

/// One message from the inbox endpoint
///
/// The wire shape is loose; every field defaults so partial messages still
/// deserialize.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InboxMessage {
    pub subject: String,
    pub body: String,
    pub preview: String,
    pub from: String,
    pub time: String,
}

impl InboxMessage {
    /// Whether this message looks like password-change confirmation
    pub fn mentions_password_change(&self) -> bool {
        let subject = self.subject.to_lowercase();
        let body = if self.body.is_empty() {
            self.preview.to_lowercase()
        } else {
            self.body.to_lowercase()
        };
        ["password", "reset", "change"]
            .iter()
            .any(|needle| subject.contains(needle) || body.contains(needle))
    }
}

/// Inputs for one mailbox-backed generation
#[derive(Debug, Clone)]
pub struct MailboxRequest {
    /// Address-shape options forwarded to the generate endpoint
    pub options: Vec<u32>,
    /// Password to set on the new account
    pub password: String,
    /// Optional password-change endpoint template; `{email}` and
    /// `{password}` placeholders are substituted URL-encoded
    pub password_change_url: Option<String>,
}

/// Client for the disposable-mailbox API
pub struct MailboxClient {
    http: HttpClient,
    config: MailboxConfig,
    api_host: String,
}

impl MailboxClient {
    /// Create a client for the configured endpoint
    pub fn new(config: MailboxConfig) -> Result<Self> {
        let api_host = reqwest::Url::parse(&config.base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .ok_or_else(|| Error::ConfigValidationFailed {
                field: "mailbox.base_url".to_string(),
                reason: format!("'{}' is not a valid URL", config.base_url),
            })?;
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("credmint/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            config,
            api_host,
        })
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .post(format!("{}{}", self.config.base_url, path))
            .header("x-rapidapi-key", &self.config.api_key)
            .header("x-rapidapi-host", &self.api_host)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ApiStatus {
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }
        Ok(response)
    }

    /// Generate a throwaway email address
    ///
    /// Accepts `{email}` at the top level or under `data`, as the API is
    /// observed to answer both ways.
    pub async fn generate_email(&self, options: &[u32]) -> Result<String> {
        let response = self
            .post("/generate-email")
            .json(&json!({ "options": options }))
            .send()
            .await?;
        let value: Value = Self::check(response).await?.json().await?;

        value
            .get("email")
            .and_then(Value::as_str)
            .or_else(|| {
                value
                    .get("data")
                    .and_then(|d| d.get("email"))
                    .and_then(Value::as_str)
            })
            .map(str::to_string)
            .ok_or_else(|| Error::MissingField {
                field: "email".to_string(),
            })
    }

    /// Fetch the inbox for an address
    pub async fn inbox(&self, email: &str, limit: u32) -> Result<Vec<InboxMessage>> {
        let response = self
            .post("/inbox")
            .json(&json!({ "email": email, "limit": limit }))
            .send()
            .await?;
        let value: Value = Self::check(response).await?.json().await?;

        // Either {data: [...]} or a bare array
        let messages = match value.get("data") {
            Some(data) => data.clone(),
            None => value,
        };
        Ok(serde_json::from_value(messages).unwrap_or_default())
    }

    /// Fire the password-change request through the caller's endpoint
    pub async fn request_password_change(
        &self,
        url_template: &str,
        email: &str,
        password: &str,
    ) -> Result<()> {
        let url = url_template
            .replace("{email}", &urlencoding::encode(email))
            .replace("{password}", &urlencoding::encode(password));
        info!("Requesting password change via {}", url);
        let response = self
            .http
            .post(&url)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Poll the inbox until a password-related message shows up
    ///
    /// Bounded by the configured attempt count; inbox errors are logged and
    /// retried, not fatal. Returns whether confirmation was seen.
    pub async fn wait_for_verification(&self, email: &str) -> bool {
        for attempt in 1..=self.config.inbox_attempts {
            tokio::time::sleep(self.config.inbox_poll()).await;

            match self.inbox(email, self.config.inbox_limit).await {
                Ok(messages) => {
                    info!("Checked inbox ({} messages found)", messages.len());
                    let hits = messages
                        .iter()
                        .filter(|m| m.mentions_password_change())
                        .count();
                    if hits > 0 {
                        info!("Found {} password-related message(s)", hits);
                        return true;
                    }
                }
                Err(e) => warn!("Inbox check error: {}", e),
            }

            if attempt % 3 == 0 {
                info!(
                    "Still checking inbox... ({}/{} attempts)",
                    attempt, self.config.inbox_attempts
                );
            }
        }
        false
    }

    /// Run the full mailbox-backed generation flow
    ///
    /// Total: HTTP failures come back as `failed` records, never as errors.
    pub async fn generate_account(&self, request: &MailboxRequest) -> AccountRecord {
        match self.try_generate(request).await {
            Ok(record) => record,
            Err(e) => {
                warn!("Mailbox generation failed: {}", e);
                let mut record = AccountRecord::failed(String::new(), e.to_string());
                record.method = Some(MAILBOX_METHOD.to_string());
                record
            }
        }
    }

    async fn try_generate(&self, request: &MailboxRequest) -> Result<AccountRecord> {
        info!("Generating email address");
        let email = self.generate_email(&request.options).await?;
        info!("Email generated: {}", email);

        let mut password_changed = false;
        match &request.password_change_url {
            Some(url) => {
                match self
                    .request_password_change(url, &email, &request.password)
                    .await
                {
                    Ok(()) => {
                        info!("Password change request sent");
                        password_changed = true;
                    }
                    // The endpoint is best-effort; the inbox poll is the
                    // real confirmation signal
                    Err(e) => warn!("Password change request failed: {}", e),
                }
            }
            None => warn!("No password change URL provided - skipping password change"),
        }

        info!("Monitoring inbox for verification");
        let verified = self.wait_for_verification(&email).await;

        let mut record = AccountRecord::new(email, request.password.clone());
        record.status = if verified {
            AccountStatus::Verified
        } else {
            AccountStatus::Generated
        };
        record.method = Some(MAILBOX_METHOD.to_string());
        record.note = Some(
            if verified {
                "Account generated and verified via inbox"
            } else {
                "Account generated - password may need manual verification"
            }
            .to_string(),
        );
        record.extra.insert(
            "passwordSet".to_string(),
            Value::Bool(password_changed || verified),
        );
        record
            .extra
            .insert("verificationFound".to_string(), Value::Bool(verified));
        Ok(record)
    }
}

impl std::fmt::Debug for MailboxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailboxClient")
            .field("base_url", &self.config.base_url)
            .finish()
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s[..cut].to_string()
}
