// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Agent coordinator.
//!
//! Ties together:
//! - Reconciliation via [`ReconcileEngine`]
//! - Change monitoring via [`SyncLoop`]
//! - Backoff between failed iterations via [`RetryConfig`]
//!
//! # Architecture
//!
//! [`SyncAgent`] is an explicit state machine (see [`AgentState`]):
//! 1. `Init` moves straight to `Reconcile`
//! 2. `Reconcile` probes both sides and pushes, pulls or waits; on error it
//!    backs off and stays in `Reconcile`
//! 3. `Monitor` runs a sync loop session; when the subscription fails or
//!    closes, control returns to `Reconcile`
//!
//! Every transition is a single [`SyncAgent::step()`], so restart behaviour
//! can be driven from tests without real notifications.

mod monitor;
mod reconcile;
mod types;

pub use monitor::SyncLoop;
pub use reconcile::ReconcileEngine;
pub use types::{Action, AgentState, ExistencePair, MonitorExit};

use crate::codec;
use crate::config::MonitorConfig;
use crate::error::{AgentError, Result};
use crate::file::{FileProbe, LocalFile};
use crate::metrics;
use crate::resilience::RetryConfig;
use crate::store::StoreClient;
use crate::watch::{ChangeSource, NotifyChangeSource};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Read the whole file, hex-encode it and overwrite `key`.
///
/// Shared by the push branch of reconcile and by every sync loop upload.
pub(crate) async fn upload_file<S: StoreClient, F: FileProbe>(
    store: &S,
    files: &F,
    path: &Path,
    key: &str,
) -> Result<usize> {
    let start = Instant::now();
    let result: Result<Vec<u8>> = async {
        let payload = files.read(path).await?;
        store
            .set(key, codec::encode(&payload))
            .await
            .map_err(|e| AgentError::store("set", key, e))?;
        Ok(payload)
    }
    .await;

    match result {
        Ok(payload) => {
            metrics::record_upload(true, payload.len(), start.elapsed());
            debug!(
                bytes = payload.len(),
                fingerprint = %codec::fingerprint(&payload),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "File uploaded"
            );
            Ok(payload.len())
        }
        Err(e) => {
            metrics::record_upload(false, 0, start.elapsed());
            Err(e)
        }
    }
}

/// The sidecar agent keeping one file and one etcd key in sync.
///
/// Store, filesystem and change source are injected so tests can replace
/// any of them.
pub struct SyncAgent<S, F = LocalFile, C = NotifyChangeSource>
where
    S: StoreClient,
    F: FileProbe,
    C: ChangeSource,
{
    reconciler: ReconcileEngine<S, F>,
    sync_loop: SyncLoop<S, F, C>,

    /// Backoff between failed iterations
    retry: RetryConfig,

    /// Failed iterations since the last productive monitor session
    consecutive_failures: usize,

    state_tx: watch::Sender<AgentState>,
    state_rx: watch::Receiver<AgentState>,
}

impl<S: StoreClient> SyncAgent<S> {
    /// Create an agent using the local filesystem and the platform notifier.
    pub fn new(config: MonitorConfig, store: Arc<S>) -> Self {
        Self::with_components(
            config,
            store,
            Arc::new(LocalFile::new()),
            Arc::new(NotifyChangeSource::new()),
        )
    }
}

impl<S, F, C> SyncAgent<S, F, C>
where
    S: StoreClient,
    F: FileProbe,
    C: ChangeSource,
{
    /// Create an agent from explicit components.
    pub fn with_components(
        config: MonitorConfig,
        store: Arc<S>,
        files: Arc<F>,
        changes: Arc<C>,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(AgentState::Init);
        Self {
            reconciler: ReconcileEngine::new(config.clone(), Arc::clone(&store), Arc::clone(&files)),
            sync_loop: SyncLoop::new(config, store, files, changes),
            retry: RetryConfig::daemon(),
            consecutive_failures: 0,
            state_tx,
            state_rx,
        }
    }

    /// Replace the backoff used between failed iterations.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Get current agent state.
    pub fn state(&self) -> AgentState {
        *self.state_rx.borrow()
    }

    /// Get a receiver to watch state changes.
    pub fn state_receiver(&self) -> watch::Receiver<AgentState> {
        self.state_rx.clone()
    }

    /// Failed iterations since the last monitor session that uploaded something.
    pub fn consecutive_failures(&self) -> usize {
        self.consecutive_failures
    }

    fn transition(&self, next: AgentState) -> AgentState {
        let _ = self.state_tx.send(next);
        metrics::set_agent_state(&next.to_string());
        next
    }

    async fn back_off(&mut self) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        let delay = self.retry.delay_for_attempt(self.consecutive_failures);
        debug!(
            consecutive_failures = self.consecutive_failures,
            delay_ms = delay.as_millis() as u64,
            "Backing off before reconciling again"
        );
        tokio::time::sleep(delay).await;
    }

    /// Perform one state transition and return the new state.
    pub async fn step(&mut self) -> AgentState {
        match self.state() {
            AgentState::Init => self.transition(AgentState::Reconcile),

            AgentState::Reconcile => {
                let outcome = self.reconciler.reconcile().await;
                match outcome {
                    Ok(action) => {
                        debug!(%action, "Reconciled");
                        self.transition(AgentState::Monitor)
                    }
                    Err(e) => {
                        metrics::record_reconcile_error(e.kind());
                        if e.is_retryable() {
                            warn!(error = %e, "Reconcile attempt failed");
                        } else {
                            error!(error = %e, "Reconcile attempt failed, needs attention");
                        }
                        self.back_off().await;
                        self.transition(AgentState::Reconcile)
                    }
                }
            }

            AgentState::Monitor => {
                let exit = self.sync_loop.run().await;
                if exit.made_progress() {
                    self.consecutive_failures = 0;
                } else {
                    self.back_off().await;
                }
                info!(reason = exit.reason(), "Monitor stopped, reconciling again");
                self.transition(AgentState::Reconcile)
            }
        }
    }

    /// Run forever. Termination is external.
    pub async fn run(mut self) {
        info!("Starting bolt monitor");
        loop {
            self.step().await;
        }
    }
}
