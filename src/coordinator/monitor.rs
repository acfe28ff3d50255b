// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Monitoring: push every local modification to the store.
//!
//! The sync loop:
//! 1. Opens a change subscription on the database file
//! 2. For each notification, re-reads the whole file and overwrites the key
//! 3. Returns when the subscription can't be opened or closes
//!
//! # Delivery Semantics
//!
//! Notifications are handled strictly in arrival order, one upload at a time;
//! the ones that arrive during a slow upload wait in the subscription queue.
//!
//! A failed upload is logged and dropped. It is not retried and it does not
//! stop the loop: the next modification uploads the full file again, which
//! covers the lost change. A restart with both sides present does not re-push,
//! so a change whose upload failed and that is never followed by another write
//! stays local until the next one.

use super::types::MonitorExit;
use super::upload_file;
use crate::config::MonitorConfig;
use crate::file::FileProbe;
use crate::metrics;
use crate::store::StoreClient;
use crate::watch::{ChangeEvent, ChangeSource};
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};

/// Pushes local file changes to the store for as long as the subscription lives.
pub struct SyncLoop<S: StoreClient, F: FileProbe, C: ChangeSource> {
    config: MonitorConfig,
    store: Arc<S>,
    files: Arc<F>,
    changes: Arc<C>,
}

impl<S: StoreClient, F: FileProbe, C: ChangeSource> SyncLoop<S, F, C> {
    pub fn new(config: MonitorConfig, store: Arc<S>, files: Arc<F>, changes: Arc<C>) -> Self {
        Self {
            config,
            store,
            files,
            changes,
        }
    }

    /// Run one monitor session. Returns only when the subscription fails.
    pub async fn run(&self) -> MonitorExit {
        let path = self.config.file_path();
        let span = info_span!("monitor", path = %path.display(), key = %self.config.key_path());

        async move {
            let mut subscription = match self.changes.subscribe(path) {
                Ok(subscription) => subscription,
                Err(e) => {
                    warn!(error = %e, "Could not subscribe to file changes");
                    metrics::record_monitor_exit("subscribe_failed");
                    return MonitorExit::SubscribeFailed(e);
                }
            };

            info!("Waiting for file changes");
            let mut uploads = 0u64;
            let mut failures = 0u64;

            while let Some(event) = subscription.next().await {
                metrics::set_queue_depth(subscription.pending());
                if self.handle(&event).await {
                    uploads += 1;
                } else {
                    failures += 1;
                }
            }

            metrics::set_queue_depth(0);
            metrics::record_monitor_exit("subscription_ended");
            info!(uploads, failures, "Change subscription closed");
            MonitorExit::SubscriptionEnded { uploads, failures }
        }
        .instrument(span)
        .await
    }

    /// Upload the file for one notification. Errors are logged, not returned.
    async fn handle(&self, event: &ChangeEvent) -> bool {
        debug!(
            queued_ms = event.observed_at.elapsed().as_millis() as u64,
            "File changed"
        );
        match upload_file(
            self.store.as_ref(),
            self.files.as_ref(),
            self.config.file_path(),
            self.config.key_path(),
        )
        .await
        {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, retryable = e.is_retryable(), "Error occurred during data syncing");
                false
            }
        }
    }
}
