//! Configuration management for credmint
//!
//! TOML-backed configuration covering the VM image, the protocol timing
//! table, and the API collaborators. Every section has defaults matching
//! the deployed system, so a partial (or absent) config file is fine.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use crate::error::{Error, Result};

/// Main configuration structure for credmint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// VM image and resources
    pub vm: VmConfig,

    /// Protocol timing table
    pub protocol: ProtocolConfig,

    /// Disposable-mailbox API collaborator
    pub mailbox: MailboxConfig,

    /// Lab-credential API collaborator
    pub lab: LabConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::ConfigLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults on any failure
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to load configuration: {}. Using defaults", e);
                Self::default()
            }
        }
    }

    /// Validate cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if self.protocol.command_poll_ms == 0 {
            return Err(Error::ConfigValidationFailed {
                field: "protocol.command_poll_ms".to_string(),
                reason: "poll interval must be non-zero".to_string(),
            });
        }
        if self.protocol.json_poll_ms == 0 {
            return Err(Error::ConfigValidationFailed {
                field: "protocol.json_poll_ms".to_string(),
                reason: "poll interval must be non-zero".to_string(),
            });
        }
        if self.protocol.buffer_cap == 0 {
            return Err(Error::ConfigValidationFailed {
                field: "protocol.buffer_cap".to_string(),
                reason: "buffer cap must be non-zero".to_string(),
            });
        }
        Ok(())
    }
}

/// VM image and resource configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    /// Disk image location
    pub disk_image_url: String,

    /// Disk image kind as understood by the VM runtime
    pub disk_image_type: String,

    /// Guest memory in bytes
    pub memory_bytes: u64,

    /// Guest VGA memory in bytes
    pub vga_memory_bytes: u64,

    /// Whether the guest gets a network device
    pub network_enabled: bool,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            disk_image_url: "wss://disks.webvm.io/debian_large_20230522_5044875331.ext2"
                .to_string(),
            disk_image_type: "cloud".to_string(),
            memory_bytes: 512 * 1024 * 1024,
            vga_memory_bytes: 16 * 1024 * 1024,
            network_enabled: false,
        }
    }
}

/// Protocol timing table
///
/// Millisecond fields mirror the observed system's constants; the
/// `Duration` accessors are what the rest of the crate consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolConfig {
    /// Output buffer retention cap in bytes
    pub buffer_cap: usize,

    /// Delta poll interval for command dispatch
    pub command_poll_ms: u64,

    /// Default output wait per dispatch
    pub command_wait_ms: u64,

    /// Hard cap on any single dispatch
    pub dispatch_cap_secs: u64,

    /// Extraction poll interval for the JSON race
    pub json_poll_ms: u64,

    /// Default JSON race budget
    pub json_wait_ms: u64,

    /// Prompt poll interval during boot
    pub boot_poll_ms: u64,

    /// Boot wait budget
    pub boot_wait_secs: u64,

    /// Output wait while staging the generation script
    pub script_stage_wait_ms: u64,

    /// Settle delay between staging and running
    pub script_settle_ms: u64,

    /// Output wait while the generation script runs
    pub script_exec_wait_ms: u64,

    /// JSON race budget for the generation script
    pub script_json_wait_ms: u64,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            buffer_cap: 100_000,
            command_poll_ms: 200,
            command_wait_ms: 3_000,
            dispatch_cap_secs: 300,
            json_poll_ms: 500,
            json_wait_ms: 60_000,
            boot_poll_ms: 1_000,
            boot_wait_secs: 60,
            script_stage_wait_ms: 3_000,
            script_settle_ms: 1_000,
            script_exec_wait_ms: 180_000,
            script_json_wait_ms: 180_000,
        }
    }
}

impl ProtocolConfig {
    pub fn command_poll(&self) -> Duration {
        Duration::from_millis(self.command_poll_ms)
    }
    pub fn command_wait(&self) -> Duration {
        Duration::from_millis(self.command_wait_ms)
    }
    pub fn dispatch_cap(&self) -> Duration {
        Duration::from_secs(self.dispatch_cap_secs)
    }
    pub fn json_poll(&self) -> Duration {
        Duration::from_millis(self.json_poll_ms)
    }
    pub fn json_wait(&self) -> Duration {
        Duration::from_millis(self.json_wait_ms)
    }
    pub fn boot_poll(&self) -> Duration {
        Duration::from_millis(self.boot_poll_ms)
    }
    pub fn boot_wait(&self) -> Duration {
        Duration::from_secs(self.boot_wait_secs)
    }
    pub fn script_stage_wait(&self) -> Duration {
        Duration::from_millis(self.script_stage_wait_ms)
    }
    pub fn script_settle(&self) -> Duration {
        Duration::from_millis(self.script_settle_ms)
    }
    pub fn script_exec_wait(&self) -> Duration {
        Duration::from_millis(self.script_exec_wait_ms)
    }
    pub fn script_json_wait(&self) -> Duration {
        Duration::from_millis(self.script_json_wait_ms)
    }
}

/// Disposable-mailbox API collaborator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailboxConfig {
    /// API base URL
    pub base_url: String,

    /// API key sent with every request
    pub api_key: String,

    /// Seconds between inbox polls during verification
    pub inbox_poll_secs: u64,

    /// Maximum inbox polls before giving up on verification
    pub inbox_attempts: u32,

    /// Messages fetched per inbox poll
    pub inbox_limit: u32,
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            base_url: "https://gmailnator.p.rapidapi.com".to_string(),
            api_key: String::new(),
            inbox_poll_secs: 6,
            inbox_attempts: 20,
            inbox_limit: 20,
        }
    }
}

impl MailboxConfig {
    pub fn inbox_poll(&self) -> Duration {
        Duration::from_secs(self.inbox_poll_secs)
    }
}

/// Lab-credential API collaborator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabConfig {
    /// API base URL
    pub base_url: String,

    /// Lab runner to start
    pub lab_id: String,

    /// Catalog parent passed to the run endpoint
    pub parent: String,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.qwiklabs.com".to_string(),
            lab_id: "32138".to_string(),
            parent: "catalog".to_string(),
        }
    }
}
