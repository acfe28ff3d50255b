// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! bolt-monitor daemon entry point.
//!
//! Reads the YAML config from `$BOLT_MONITOR_CONFIG` (default
//! `/etc/heketi/bolt-monitor.yaml`), connects to etcd and runs the agent until
//! interrupted. Log verbosity follows `RUST_LOG` (default `info`).

use bolt_monitor::{EtcdStore, MonitorConfig, RetryConfig, SyncAgent};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match MonitorConfig::load_default() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Error getting config values");
            return ExitCode::FAILURE;
        }
    };

    info!(
        name = %config.name,
        path = %config.file_path().display(),
        key = %config.key_path(),
        "Configuration loaded"
    );

    let store = match EtcdStore::connect_with_retry(
        config.endpoints(),
        config.request_timeout(),
        &RetryConfig::daemon(),
    )
    .await
    {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "Error connecting to etcd");
            return ExitCode::FAILURE;
        }
    };

    let agent = SyncAgent::new(config, Arc::new(store));

    tokio::select! {
        _ = agent.run() => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                error!(error = %e, "Failed to listen for shutdown signal");
                return ExitCode::FAILURE;
            }
            info!("Interrupted, exiting");
        }
    }

    ExitCode::SUCCESS
}
