// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! File change notifications.
//!
//! A [`ChangeSource`] turns "the database file was modified" into a stream of
//! [`ChangeEvent`]s for the sync loop. Each [`Subscription`] is single-use:
//! once it yields `None` the caller must go back through reconciliation and
//! subscribe again.
//!
//! # Queueing
//!
//! Events travel through an unbounded `tokio::sync::mpsc` channel, so a slow
//! upload never causes a notification to be dropped; they queue and are
//! processed in arrival order. The cost is unbounded memory growth if uploads
//! stay slower than writes for a long time. [`Subscription::pending()`] is
//! exported as a gauge so that case is visible.

use crate::error::{AgentError, Result};
use crate::metrics;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::any::Any;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

/// A single "file modified" notification.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    /// Path the notification was raised for.
    pub path: PathBuf,
    /// When the event was received from the OS.
    pub observed_at: Instant,
}

impl ChangeEvent {
    /// Create an event stamped with the current time.
    pub fn now(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            observed_at: Instant::now(),
        }
    }
}

/// An open change subscription.
///
/// Holds whatever keeps the underlying watcher alive; dropping the
/// subscription stops delivery.
pub struct Subscription {
    events: mpsc::UnboundedReceiver<ChangeEvent>,
    _guard: Option<Box<dyn Any + Send>>,
}

impl Subscription {
    /// Wrap a receiver with no extra resources to keep alive.
    pub fn new(events: mpsc::UnboundedReceiver<ChangeEvent>) -> Self {
        Self {
            events,
            _guard: None,
        }
    }

    /// Wrap a receiver together with the watcher that feeds it.
    pub fn with_guard(events: mpsc::UnboundedReceiver<ChangeEvent>, guard: impl Any + Send) -> Self {
        Self {
            events,
            _guard: Some(Box::new(guard)),
        }
    }

    /// Wait for the next notification.
    ///
    /// Returns `None` once the source has closed; the subscription cannot be
    /// resumed after that.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        self.events.recv().await
    }

    /// Number of notifications queued but not yet consumed.
    pub fn pending(&self) -> usize {
        self.events.len()
    }
}

/// Source of change notifications for a single path.
pub trait ChangeSource: Send + Sync + 'static {
    /// Start watching `path`. Fails if the watch cannot be established.
    fn subscribe(&self, path: &Path) -> Result<Subscription>;
}

/// [`ChangeSource`] backed by the platform notifier (inotify, FSEvents, ...).
///
/// Only modification events for the exact path are forwarded. When the file
/// is removed or renamed away the OS watch is gone, so the subscription is
/// closed and the agent falls back to reconciliation.
#[derive(Debug, Clone, Default)]
pub struct NotifyChangeSource;

impl NotifyChangeSource {
    /// Create a notifier-backed change source.
    pub fn new() -> Self {
        Self
    }
}

/// What to do with a raw notify event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Disposition {
    /// Forward as a change.
    Forward,
    /// Not interesting (access, other path, ...).
    Ignore,
    /// The watched file is gone; end the subscription.
    Close,
}

pub(crate) fn classify(event: &Event, watched: &Path) -> Disposition {
    // Queue overflow: modifications may have been lost, upload the whole file
    if event.need_rescan() {
        return Disposition::Forward;
    }
    // inotify on a single file reports an empty path list for some events
    let ours = event.paths.is_empty() || event.paths.iter().any(|p| p == watched);
    if !ours {
        return Disposition::Ignore;
    }
    match event.kind {
        EventKind::Modify(notify::event::ModifyKind::Name(_)) => Disposition::Close,
        EventKind::Modify(_) => Disposition::Forward,
        EventKind::Remove(_) => Disposition::Close,
        _ => Disposition::Ignore,
    }
}

impl ChangeSource for NotifyChangeSource {
    fn subscribe(&self, path: &Path) -> Result<Subscription> {
        let watched = path.to_path_buf();
        let (tx, rx) = mpsc::unbounded_channel();

        let callback_path = watched.clone();
        let mut sender = Some(tx);
        let mut watcher = RecommendedWatcher::new(
            move |result: notify::Result<Event>| {
                if sender.is_none() {
                    return;
                }
                match result {
                    Ok(event) => match classify(&event, &callback_path) {
                        Disposition::Forward => {
                            metrics::record_change_event();
                            trace!(kind = ?event.kind, "File modified");
                            let delivered = sender
                                .as_ref()
                                .map(|tx| tx.send(ChangeEvent::now(callback_path.clone())).is_ok())
                                .unwrap_or(false);
                            if !delivered {
                                // Receiver dropped: the subscription is over
                                sender = None;
                            }
                        }
                        Disposition::Close => {
                            info!(
                                path = %callback_path.display(),
                                kind = ?event.kind,
                                "Watched file removed, closing subscription"
                            );
                            sender = None;
                        }
                        Disposition::Ignore => {}
                    },
                    Err(e) => {
                        warn!(path = %callback_path.display(), error = %e, "File watcher error");
                    }
                }
            },
            Config::default(),
        )
        .map_err(|e| AgentError::watch(&watched, format!("failed to create watcher: {}", e)))?;

        watcher
            .watch(&watched, RecursiveMode::NonRecursive)
            .map_err(|e| AgentError::watch(&watched, format!("failed to watch: {}", e)))?;

        debug!(path = %watched.display(), "Change subscription established");
        Ok(Subscription::with_guard(rx, watcher))
    }
}
