//! Error types and Result aliases for credmint

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Result type alias for credmint operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for credmint
#[derive(Debug)]
pub enum Error {
    // === Terminal channel errors ===
    /// No VM bound to the command channel
    ChannelNotReady,

    /// Command exceeded the hard dispatch cap
    DispatchTimeout {
        command: String,
        duration: Duration,
    },

    /// Shell prompt never appeared while waiting for the VM to boot
    ShellNotReady {
        duration: Duration,
    },

    /// Failed to deliver input to the VM
    VmInput {
        reason: String,
    },

    /// VM initialization failed
    VmInit {
        reason: String,
    },

    // === Session errors ===
    /// A generation is already in flight on this session
    GenerationInProgress,

    /// Empty command
    EmptyCommand,

    // === API collaborator errors ===
    /// HTTP transport failure talking to a collaborator
    Http {
        url: String,
        reason: String,
    },

    /// Collaborator returned a non-success status
    ApiStatus {
        status: u16,
        body: String,
    },

    /// Collaborator wants a captcha token before it will answer
    CaptchaRequired,

    /// Collaborator response was missing a field we require
    MissingField {
        field: String,
    },

    // === Configuration errors ===
    /// Failed to load configuration file
    ConfigLoadFailed {
        path: PathBuf,
        reason: String,
    },

    /// Configuration validation failed
    ConfigValidationFailed {
        field: String,
        reason: String,
    },

    // === I/O and serialization errors (kept for compatibility) ===
    /// I/O errors
    Io(std::io::Error),

    /// Serialization errors
    Serde(serde_json::Error),

    /// TOML parsing errors
    Toml(toml::de::Error),

    /// Regex compilation errors
    Regex(regex::Error),

    // === Generic fallback (use sparingly) ===
    /// Generic errors (for cases not yet categorized)
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Terminal channel errors
            Error::ChannelNotReady => {
                write!(f, "Command channel has no VM bound")
            }
            Error::DispatchTimeout { command, duration } => {
                write!(f, "Command '{}' timed out after {:?}", command, duration)
            }
            Error::ShellNotReady { duration } => {
                write!(f, "No shell prompt appeared within {:?}", duration)
            }
            Error::VmInput { reason } => {
                write!(f, "Failed to send input to VM: {}", reason)
            }
            Error::VmInit { reason } => {
                write!(f, "VM initialization failed: {}", reason)
            }

            // Session errors
            Error::GenerationInProgress => {
                write!(f, "A generation is already in progress")
            }
            Error::EmptyCommand => {
                write!(f, "Command cannot be empty")
            }

            // API collaborator errors
            Error::Http { url, reason } => {
                write!(f, "HTTP request to '{}' failed: {}", url, reason)
            }
            Error::ApiStatus { status, body } => {
                write!(f, "API returned status {}: {}", status, body)
            }
            Error::CaptchaRequired => {
                write!(f, "API requires a captcha token")
            }
            Error::MissingField { field } => {
                write!(f, "Response missing required field '{}'", field)
            }

            // Configuration errors
            Error::ConfigLoadFailed { path, reason } => {
                write!(f, "Failed to load config from '{}': {}", path.display(), reason)
            }
            Error::ConfigValidationFailed { field, reason } => {
                write!(f, "Configuration validation failed for '{}': {}", field, reason)
            }

            // I/O and serialization errors
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Serde(err) => write!(f, "Serialization error: {}", err),
            Error::Toml(err) => write!(f, "TOML parsing error: {}", err),
            Error::Regex(err) => write!(f, "Regex compilation error: {}", err),

            // Generic fallback
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Toml(err)
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::Regex(err)
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Http {
            url: err
                .url()
                .map(|u| u.to_string())
                .unwrap_or_else(|| "<unknown>".to_string()),
            reason: err.to_string(),
        }
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::Other(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::Other(err.to_string())
    }
}
