// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Error types for the monitor agent.
//!
//! Errors are categorized by the side of the sync that failed (remote store,
//! local filesystem, wire decoding, change notifications) and carry enough
//! context to identify the failing operation in logs.
//!
//! # Error Categories
//!
//! | Error Type | Retryable | Description |
//! |------------|-----------|-------------|
//! | `Store` | Yes | Network errors and timeouts against etcd |
//! | `Io` | Yes | Local stat/read/write failure other than absence |
//! | `Watch` | Yes | Change subscription could not be established |
//! | `StateChanged` | Yes | File or key changed between the two existence probes |
//! | `Decode` | No | Stored value is not valid hex |
//! | `Config` | No | Configuration invalid (fatal at startup) |
//!
//! "Not found" is not an error: a missing key or file is an expected
//! outcome (`Ok(None)` / `Ok(false)`) that drives the reconcile decision table.
//!
//! # Retry Behavior
//!
//! Nothing here ends the process except `Config`. The agent logs the error and
//! re-runs reconciliation; [`AgentError::is_retryable()`] only tells whether
//! the next attempt can be expected to succeed without operator action.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;

/// Errors that can occur while reconciling or monitoring.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Remote store request failed (transport error or request timeout).
    #[error("Store error ({operation} {key}): {message}")]
    Store {
        operation: String,
        key: String,
        message: String,
    },

    /// Local filesystem failure other than "does not exist".
    #[error("I/O error ({operation} {}): {source}", path.display())]
    Io {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The stored value could not be decoded back into bytes.
    ///
    /// Not retryable - the value at the key is corrupt until someone rewrites it.
    #[error("Decode error ({key}): {message}")]
    Decode { key: String, message: String },

    /// Change subscription could not be established.
    #[error("Watch error ({}): {message}", path.display())]
    Watch { path: PathBuf, message: String },

    /// Observed state changed between two probes of the same attempt.
    #[error("State changed during reconcile: {0}")]
    StateChanged(String),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AgentError {
    /// Create a store error from any displayable transport failure.
    pub fn store(
        operation: impl Into<String>,
        key: impl Into<String>,
        source: impl std::fmt::Display,
    ) -> Self {
        Self::Store {
            operation: operation.into(),
            key: key.into(),
            message: source.to_string(),
        }
    }

    /// Create an I/O error for an operation on `path`.
    pub fn io(operation: impl Into<String>, path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: path.to_path_buf(),
            source,
        }
    }

    /// Create a watch error for `path`.
    pub fn watch(path: &Path, message: impl std::fmt::Display) -> Self {
        Self::Watch {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }

    /// Short, stable label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Store { .. } => "store",
            Self::Io { .. } => "io",
            Self::Decode { .. } => "decode",
            Self::Watch { .. } => "watch",
            Self::StateChanged(_) => "state_changed",
            Self::Config(_) => "config",
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store { .. } => true,
            Self::Io { .. } => true,
            Self::Watch { .. } => true,
            Self::StateChanged(_) => true,
            Self::Decode { .. } => false, // Corrupt value at the source
            Self::Config(_) => false,
        }
    }
}
