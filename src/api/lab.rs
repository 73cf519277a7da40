//! Lab Credential API Client
//!
//! Starts a hands-on lab through a Qwiklabs-style endpoint and digs the
//! temporary account credentials out of the response. The response shape is
//! not stable across labs, so extraction walks every container the API has
//! been observed to use and tolerates the field-name aliases it mixes.

use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::Client as HttpClient;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::config::LabConfig;
use crate::error::{Error, Result};
use crate::models::AccountRecord;

/// Backend tag for records produced through the lab API
pub const LAB_METHOD: &str = "qwiklabs_api";

/// One credential dug out of a lab response
#[derive(Debug, Clone, Default, Serialize)]
pub struct LabCredential {
    /// Which response container it came from
    pub source: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    /// The container object, verbatim
    pub raw: Value,
}

impl LabCredential {
    /// Whether this credential identifies an account at all
    pub fn has_identity(&self) -> bool {
        self.username.is_some() || self.email.is_some() || self.password.is_some()
    }
}

/// Opaque captcha tokens forwarded to the run endpoint
#[derive(Debug, Clone, Default)]
pub struct RecaptchaTokens {
    pub v2: Option<String>,
    pub v3: Option<String>,
}

/// Client for the lab-credential API
pub struct LabClient {
    http: HttpClient,
    config: LabConfig,
}

impl LabClient {
    /// Create a client for the configured endpoint
    pub fn new(config: LabConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(60))
            .user_agent(concat!("credmint/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, config })
    }

    /// Start the configured lab and return the raw response
    ///
    /// A 403, or any error body mentioning a captcha, comes back as
    /// [`Error::CaptchaRequired`] so the caller can acquire a token and
    /// call again.
    pub async fn start_lab(&self, tokens: &RecaptchaTokens) -> Result<Value> {
        let mut url = format!(
            "{}/focuses/run/{}.json?parent={}",
            self.config.base_url,
            self.config.lab_id,
            urlencoding::encode(&self.config.parent)
        );
        if let Some(v3) = &tokens.v3 {
            url.push_str(&format!("&recaptchaV3Token={}", urlencoding::encode(v3)));
        }
        if let Some(v2) = &tokens.v2 {
            url.push_str(&format!("&recaptchaV2Token={}", urlencoding::encode(v2)));
        }

        info!("Starting lab {}", self.config.lab_id);
        let response = self
            .http
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status.as_u16() == 403 || body.to_lowercase().contains("captcha") {
                return Err(Error::CaptchaRequired);
            }
            return Err(Error::ApiStatus {
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }

        Ok(response.json().await?)
    }

    /// Walk a lab response for credential objects
    ///
    /// Containers checked, in order: `labDetails`/`lab_details` entries
    /// typed `credential`/`connectionDetails` (or carrying a
    /// `connectionDetails` key), a top-level `connectionDetails` array,
    /// `user_0`, `project_0`, and a `users` array.
    pub fn extract_credentials(data: &Value) -> Vec<LabCredential> {
        let mut credentials = Vec::new();

        let details = data
            .get("labDetails")
            .or_else(|| data.get("lab_details"))
            .and_then(Value::as_array);
        if let Some(details) = details {
            for detail in details {
                let ty = detail.get("type").and_then(Value::as_str);
                if ty == Some("credential")
                    || ty == Some("connectionDetails")
                    || detail.get("connectionDetails").is_some()
                {
                    push_if_identity(&mut credentials, credential_from(detail, "labDetails"));
                }
            }
        }

        if let Some(conns) = data.get("connectionDetails").and_then(Value::as_array) {
            for conn in conns {
                push_if_identity(&mut credentials, credential_from(conn, "connectionDetails"));
            }
        }

        if let Some(user) = data.get("user_0") {
            push_if_identity(&mut credentials, credential_from(user, "user_0"));
        }

        if let Some(project) = data.get("project_0") {
            credentials.push(LabCredential {
                source: "project_0".to_string(),
                label: "Project".to_string(),
                project_id: pluck_str(project, &["project_id", "projectId"]),
                raw: project.clone(),
                ..Default::default()
            });
        }

        if let Some(users) = data.get("users").and_then(Value::as_array) {
            for user in users {
                push_if_identity(&mut credentials, credential_from(user, "users"));
            }
        }

        credentials
    }

    /// Run the full lab-backed generation flow
    ///
    /// Total: API failures come back as `failed` records, never as errors.
    pub async fn generate_account(&self, tokens: &RecaptchaTokens) -> AccountRecord {
        let data = match self.start_lab(tokens).await {
            Ok(data) => data,
            Err(e) => {
                warn!("Lab start failed: {}", e);
                let mut record = AccountRecord::failed(String::new(), e.to_string());
                record.method = Some(LAB_METHOD.to_string());
                if matches!(e, Error::CaptchaRequired) {
                    record.note = Some(
                        "The lab API requires a captcha token; acquire one and retry"
                            .to_string(),
                    );
                }
                return record;
            }
        };

        let credentials = Self::extract_credentials(&data);
        if credentials.is_empty() {
            warn!("No credentials found in lab response");
            let mut record = AccountRecord::failed(
                String::new(),
                "No credentials found in lab response".to_string(),
            );
            record.method = Some(LAB_METHOD.to_string());
            record.note =
                Some("Check the attached response for the actual structure".to_string());
            record.extra.insert(
                "response".to_string(),
                Value::String(truncate(&data.to_string(), 1000)),
            );
            return record;
        }
        info!("Found {} credential(s)", credentials.len());

        let main = credentials
            .iter()
            .find(|c| c.username.is_some() || c.email.is_some())
            .unwrap_or(&credentials[0]);

        let email = main
            .email
            .clone()
            .or_else(|| main.username.clone())
            .unwrap_or_default();
        let mut record = AccountRecord::new(email, main.password.clone().unwrap_or_default());
        record.method = Some(LAB_METHOD.to_string());
        record.note = Some(
            "Account generated via lab API. Credentials are temporary and expire when the \
             lab ends."
                .to_string(),
        );
        if let Some(username) = &main.username {
            record
                .extra
                .insert("username".to_string(), json!(username));
        }
        // project_0 may carry the project id even when the main credential
        // does not
        let project_id = main
            .project_id
            .clone()
            .or_else(|| credentials.iter().find_map(|c| c.project_id.clone()));
        if let Some(project_id) = project_id {
            record
                .extra
                .insert("projectId".to_string(), json!(project_id));
        }
        if let Some(region) = &main.region {
            record.extra.insert("region".to_string(), json!(region));
        }
        if let Some(zone) = &main.zone {
            record.extra.insert("zone".to_string(), json!(zone));
        }
        if let Some(instance) = data
            .get("labInstanceId")
            .or_else(|| data.get("lab_instance_id"))
        {
            record
                .extra
                .insert("labInstanceId".to_string(), instance.clone());
        }
        record.extra.insert(
            "allCredentials".to_string(),
            serde_json::to_value(&credentials).unwrap_or(Value::Null),
        );
        record
    }
}

impl std::fmt::Debug for LabClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabClient")
            .field("base_url", &self.config.base_url)
            .field("lab_id", &self.config.lab_id)
            .finish()
    }
}

fn push_if_identity(credentials: &mut Vec<LabCredential>, credential: LabCredential) {
    if credential.has_identity() {
        credentials.push(credential);
    }
}

/// Build a credential from one container object, resolving field aliases
/// both at the top level and under a nested `connectionDetails`
fn credential_from(obj: &Value, source: &str) -> LabCredential {
    let conn = obj.get("connectionDetails");
    let pick = |keys: &[&str]| {
        pluck_str(obj, keys).or_else(|| conn.and_then(|c| pluck_str(c, keys)))
    };

    let mut credential = LabCredential {
        source: source.to_string(),
        label: pluck_str(obj, &["label", "name", "title"])
            .unwrap_or_else(|| "Credential".to_string()),
        username: pick(&["username", "user", "userName"]),
        password: pick(&["password", "pass", "pwd"]),
        email: pick(&["email", "emailAddress", "userEmail"]),
        project_id: pluck_str(obj, &["projectId", "project_id", "projectID"]),
        region: pluck_str(obj, &["region"]),
        zone: pluck_str(obj, &["zone"]),
        raw: obj.clone(),
    };

    // Some labs nest the account one level further down
    if let Some(user0) = obj.get("user_0") {
        credential.username = credential
            .username
            .or_else(|| pluck_str(user0, &["username", "email"]));
        credential.password = credential
            .password
            .or_else(|| pluck_str(user0, &["password"]));
        credential.email = credential
            .email
            .or_else(|| pluck_str(user0, &["email", "username"]));
    }

    credential
}

/// First present alias as a non-empty string
fn pluck_str(obj: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(s) = obj.get(*key).and_then(Value::as_str) {
            if !s.is_empty() {
                return Some(s.to_string());
            }
        }
    }
    None
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
