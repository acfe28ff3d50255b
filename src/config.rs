// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Configuration for the monitor agent.
//!
//! Configuration is loaded once at startup and passed to
//! [`SyncAgent::new()`](crate::SyncAgent::new). It can be constructed
//! programmatically or deserialized from YAML.
//!
//! # Quick Start
//!
//! ```rust
//! use bolt_monitor::config::MonitorConfig;
//!
//! let config = MonitorConfig::for_testing("/tmp/heketi.db", "/heketi/db");
//! assert!(config.validate().is_ok());
//! ```
//!
//! # Configuration Structure
//!
//! ```text
//! MonitorConfig
//! ├── name: String                 # Free-form label, used in logs
//! └── conf: SyncSettings
//!     ├── filePath: PathBuf        # Local database file
//!     ├── etcdKeyPath: String      # Remote key holding the hex payload
//!     ├── endpoints: [String]      # etcd client URLs
//!     ├── timeOut: u64             # Retry interval while waiting (seconds)
//!     └── requestTimeout: String   # Per-request timeout ("5s")
//! ```
//!
//! # YAML Example
//!
//! ```yaml
//! name: heketi-db
//! conf:
//!   filePath: /var/lib/heketi/heketi.db
//!   etcdKeyPath: /heketi/db
//!   endpoints:
//!     - http://10.0.0.1:2379
//!     - http://10.0.0.2:2379
//!   timeOut: 10
//! ```

use crate::error::{AgentError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/heketi/bolt-monitor.yaml";

/// Environment variable overriding [`DEFAULT_CONFIG_PATH`].
pub const CONFIG_PATH_ENV: &str = "BOLT_MONITOR_CONFIG";

/// Top-level configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Label for this agent instance.
    #[serde(default = "default_name")]
    pub name: String,

    /// Sync settings.
    pub conf: SyncSettings,
}

/// The file/key pair to keep in sync and how to reach the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSettings {
    /// Local database file.
    pub file_path: PathBuf,

    /// Remote key holding the hex-encoded file content.
    pub etcd_key_path: String,

    /// etcd client endpoints.
    pub endpoints: Vec<String>,

    /// Seconds to sleep between file probes while neither side has data.
    #[serde(rename = "timeOut", default = "default_retry_interval_sec")]
    pub retry_interval_sec: u64,

    /// Timeout applied to every store request (humantime format).
    #[serde(default = "default_request_timeout")]
    pub request_timeout: String,
}

fn default_name() -> String {
    "bolt-monitor".to_string()
}

fn default_retry_interval_sec() -> u64 {
    10
}

fn default_request_timeout() -> String {
    "5s".to_string()
}

impl MonitorConfig {
    /// Read and parse a YAML configuration file, then validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|e| {
            AgentError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&data)
    }

    /// Load from `$BOLT_MONITOR_CONFIG`, or the default path when unset.
    pub fn load_default() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load(path)
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml(data: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(data)
            .map_err(|e| AgentError::Config(format!("invalid YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Create a minimal config for testing.
    pub fn for_testing(file_path: impl Into<PathBuf>, key_path: &str) -> Self {
        Self {
            name: "test".to_string(),
            conf: SyncSettings {
                file_path: file_path.into(),
                etcd_key_path: key_path.to_string(),
                endpoints: vec!["http://127.0.0.1:2379".to_string()],
                retry_interval_sec: 1,
                request_timeout: "500ms".to_string(),
            },
        }
    }

    /// Reject configurations the agent cannot run with.
    pub fn validate(&self) -> Result<()> {
        let conf = &self.conf;
        if conf.file_path.as_os_str().is_empty() {
            return Err(AgentError::Config("filePath must not be empty".into()));
        }
        if conf.etcd_key_path.trim().is_empty() {
            return Err(AgentError::Config("etcdKeyPath must not be empty".into()));
        }
        if conf.endpoints.is_empty() {
            return Err(AgentError::Config("endpoints must not be empty".into()));
        }
        if conf.retry_interval_sec == 0 {
            return Err(AgentError::Config("timeOut must be at least 1 second".into()));
        }
        if humantime::parse_duration(&conf.request_timeout).is_err() {
            return Err(AgentError::Config(format!(
                "requestTimeout is not a duration: {:?}",
                conf.request_timeout
            )));
        }
        Ok(())
    }

    /// Local database file.
    pub fn file_path(&self) -> &Path {
        &self.conf.file_path
    }

    /// Remote key.
    pub fn key_path(&self) -> &str {
        &self.conf.etcd_key_path
    }

    /// etcd endpoints.
    pub fn endpoints(&self) -> &[String] {
        &self.conf.endpoints
    }

    /// Sleep between file probes in the wait branch.
    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.conf.retry_interval_sec)
    }

    /// Parse the request timeout string to a Duration.
    pub fn request_timeout(&self) -> Duration {
        humantime::parse_duration(&self.conf.request_timeout).unwrap_or(Duration::from_secs(5))
    }
}
