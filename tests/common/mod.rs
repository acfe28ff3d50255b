//! Shared test utilities for the reconcile, monitor and agent tests.
//!
//! This module provides:
//! - In-memory StoreClient that records calls and injects failures
//! - Manually driven ChangeSource
//! - FileProbe with failing stat
//! - etcd testcontainer setup
//! - Filesystem helpers

#![allow(dead_code)] // Not every test binary uses every helper

pub mod containers;
pub mod failing_files;
pub mod mock_changes;
pub mod mock_store;

pub use containers::*;
pub use failing_files::*;
pub use mock_changes::*;
pub use mock_store::*;

use bolt_monitor::MonitorConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Key used by all tests.
pub const TEST_KEY: &str = "/heketi/db";

/// Config for a database file inside `dir`, with a 1s wait interval.
pub fn test_config(dir: &Path) -> MonitorConfig {
    MonitorConfig::for_testing(db_path(dir), TEST_KEY)
}

pub fn db_path(dir: &Path) -> PathBuf {
    dir.join("heketi.db")
}

/// Poll `check` every 5ms until it returns true (panics after 5s).
pub async fn eventually<F>(what: &str, mut check: F)
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !check() {
        assert!(tokio::time::Instant::now() < deadline, "timed out waiting for {}", what);
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
