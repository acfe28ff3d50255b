// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Reconciliation: decide the sync direction from current truth.
//!
//! Each attempt:
//! 1. Probes the local file and the remote key independently
//! 2. Maps the pair through [`Action::decide`]
//! 3. Performs at most one write (push or pull), waiting for the file first
//!    when neither side has data
//!
//! Nothing is remembered between attempts. A failed attempt is simply run
//! again by the agent; whatever changed in the meantime is picked up by the
//! fresh probes.

use super::types::{Action, ExistencePair};
use super::upload_file;
use crate::codec;
use crate::config::MonitorConfig;
use crate::error::{AgentError, Result};
use crate::file::FileProbe;
use crate::metrics;
use crate::store::StoreClient;
use std::sync::Arc;
use tracing::{debug, info, info_span, Instrument};

/// Drives the push / pull / wait decision for one file/key pair.
pub struct ReconcileEngine<S: StoreClient, F: FileProbe> {
    config: MonitorConfig,
    store: Arc<S>,
    files: Arc<F>,
}

impl<S: StoreClient, F: FileProbe> ReconcileEngine<S, F> {
    pub fn new(config: MonitorConfig, store: Arc<S>, files: Arc<F>) -> Self {
        Self {
            config,
            store,
            files,
        }
    }

    /// Observe both sides. Transport and I/O errors are returned, never
    /// coerced into "absent".
    pub async fn probe(&self) -> Result<ExistencePair> {
        let key = self.config.key_path();
        let key_exists = self
            .store
            .exists(key)
            .await
            .map_err(|e| AgentError::store("exists", key, e))?;
        let file_exists = self.files.exists(self.config.file_path()).await?;
        Ok(ExistencePair::new(file_exists, key_exists))
    }

    /// Run one reconcile attempt and return the action that was applied.
    ///
    /// On `Ok` both the file and the key exist and monitoring may start.
    pub async fn reconcile(&self) -> Result<Action> {
        let span = info_span!(
            "reconcile",
            path = %self.config.file_path().display(),
            key = %self.config.key_path()
        );

        async move {
            let pair = self.probe().await?;
            let action = Action::decide(pair);
            debug!(file_exists = pair.file_exists, key_exists = pair.key_exists, %action, "Probed");

            match action {
                Action::StartMonitoring => {
                    info!("File and key both exist, starting monitor");
                }
                Action::PushThenMonitor => {
                    info!("Key missing, sending file to etcd");
                    self.push().await?;
                }
                Action::PullThenMonitor => {
                    info!("File missing, rendering it from etcd");
                    self.pull().await?;
                }
                Action::WaitAndRetry => {
                    info!(
                        interval_sec = self.config.retry_interval().as_secs(),
                        "Neither file nor key exists, waiting for the file"
                    );
                    self.wait_for_file().await?;
                    info!("File appeared, sending it to etcd");
                    self.push().await?;
                }
            }

            metrics::record_reconcile_action(action.as_str());
            Ok(action)
        }
        .instrument(span)
        .await
    }

    /// Upload the whole local file to the key. Returns the payload size.
    pub async fn push(&self) -> Result<usize> {
        upload_file(
            self.store.as_ref(),
            self.files.as_ref(),
            self.config.file_path(),
            self.config.key_path(),
        )
        .await
    }

    /// Download the key and atomically write it to the local file.
    ///
    /// Invalid hex is rejected before anything touches the filesystem.
    pub async fn pull(&self) -> Result<usize> {
        let key = self.config.key_path();
        let result: Result<usize> = async {
            let value = self
                .store
                .get(key)
                .await
                .map_err(|e| AgentError::store("get", key, e))?
                .ok_or_else(|| {
                    AgentError::StateChanged(format!("key {} disappeared before pull", key))
                })?;
            let payload = codec::decode(key, &value)?;
            let len = payload.len();
            self.files
                .write_atomic(self.config.file_path(), payload)
                .await?;
            Ok(len)
        }
        .await;

        match &result {
            Ok(len) => {
                metrics::record_pull(true, *len);
                info!(bytes = *len, "File rendered from etcd");
            }
            Err(_) => metrics::record_pull(false, 0),
        }
        result
    }

    /// Sleep `retry_interval`, then re-probe the file only; repeat until it exists.
    pub async fn wait_for_file(&self) -> Result<()> {
        let path = self.config.file_path();
        let interval = self.config.retry_interval();
        loop {
            tokio::time::sleep(interval).await;
            let found = self.files.exists(path).await?;
            metrics::record_wait_poll(found);
            if found {
                return Ok(());
            }
            debug!("File still missing");
        }
    }
}
