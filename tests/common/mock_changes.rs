//! Test-driven ChangeSource.
//!
//! Notifications are pushed by the test with [`ManualChangeSource::notify()`]
//! and the subscription is ended with [`ManualChangeSource::close()`], so the
//! sync loop and the agent can be exercised without the OS notifier.

use bolt_monitor::error::{AgentError, Result};
use bolt_monitor::watch::{ChangeEvent, ChangeSource, Subscription};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;

pub struct ManualChangeSource {
    current: Mutex<Option<(PathBuf, mpsc::UnboundedSender<ChangeEvent>)>>,
    failing_subscribes: AtomicUsize,
    subscribe_calls: AtomicUsize,
}

impl ManualChangeSource {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
            failing_subscribes: AtomicUsize::new(0),
            subscribe_calls: AtomicUsize::new(0),
        }
    }

    /// Make the next `n` subscribe() calls fail.
    pub fn fail_next_subscribes(&self, n: usize) {
        self.failing_subscribes.store(n, Ordering::SeqCst);
    }

    /// Total subscribe() calls, including failed ones.
    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }

    /// Whether a subscription is currently open.
    pub fn is_subscribed(&self) -> bool {
        self.current.lock().unwrap().is_some()
    }

    /// Deliver one "file modified" notification. Returns false if nobody listens.
    pub fn notify(&self) -> bool {
        let guard = self.current.lock().unwrap();
        match guard.as_ref() {
            Some((path, tx)) => tx.send(ChangeEvent::now(path.clone())).is_ok(),
            None => false,
        }
    }

    /// End the current subscription.
    pub fn close(&self) {
        self.current.lock().unwrap().take();
    }

    /// Wait until a subscription is open (panics after 5s).
    pub async fn wait_for_subscriber(&self) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while !self.is_subscribed() {
            assert!(
                tokio::time::Instant::now() < deadline,
                "no subscriber within 5s"
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

impl Default for ManualChangeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeSource for ManualChangeSource {
    fn subscribe(&self, path: &Path) -> Result<Subscription> {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);

        let should_fail = self
            .failing_subscribes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(AgentError::watch(path, "simulated: inotify watch limit reached"));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        *self.current.lock().unwrap() = Some((path.to_path_buf(), tx));
        Ok(Subscription::new(rx))
    }
}
