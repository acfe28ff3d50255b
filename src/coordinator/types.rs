//! Agent state and reconcile decision types.
//!
//! # State Transitions
//!
//! ```text
//!         step()
//! Init ───────────→ Reconcile ←──────────────┐
//!                     │    ↺ (attempt failed: │
//!                     │       backoff, retry) │
//!          (action    │                       │ (subscription failed
//!           applied)  ↓                       │  or ended)
//!                   Monitor ─────────────────┘
//! ```
//!
//! There is no terminal state; the agent runs until the process is killed.
//!
//! # Decision Table
//!
//! | file | key | [`Action`] |
//! |------|-----|------------|
//! | yes  | yes | `StartMonitoring` |
//! | yes  | no  | `PushThenMonitor` |
//! | no   | yes | `PullThenMonitor` |
//! | no   | no  | `WaitAndRetry` |

use crate::error::AgentError;

/// State of the agent's driver loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    /// Created, nothing probed yet.
    Init,

    /// Deciding sync direction from current file/key existence.
    Reconcile,

    /// Both sides exist; local changes are being pushed.
    Monitor,
}

impl std::fmt::Display for AgentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentState::Init => write!(f, "Init"),
            AgentState::Reconcile => write!(f, "Reconcile"),
            AgentState::Monitor => write!(f, "Monitor"),
        }
    }
}

/// Result of the two existence probes of one reconcile attempt.
///
/// The probes are not atomic with respect to each other; a pair is only
/// meaningful for the attempt that produced it and is never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExistencePair {
    pub file_exists: bool,
    pub key_exists: bool,
}

impl ExistencePair {
    pub fn new(file_exists: bool, key_exists: bool) -> Self {
        Self {
            file_exists,
            key_exists,
        }
    }
}

/// What a reconcile attempt does before handing off to monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Both exist. The remote value is assumed current; nothing is compared.
    StartMonitoring,
    /// Only the file exists: upload it.
    PushThenMonitor,
    /// Only the key exists: download it into the file.
    PullThenMonitor,
    /// Neither exists: poll the file until it appears, then push.
    WaitAndRetry,
}

impl Action {
    /// Map an existence pair to its action. Total over all four inputs.
    pub fn decide(pair: ExistencePair) -> Self {
        match (pair.file_exists, pair.key_exists) {
            (true, true) => Action::StartMonitoring,
            (true, false) => Action::PushThenMonitor,
            (false, true) => Action::PullThenMonitor,
            (false, false) => Action::WaitAndRetry,
        }
    }

    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::StartMonitoring => "start_monitoring",
            Action::PushThenMonitor => "push_then_monitor",
            Action::PullThenMonitor => "pull_then_monitor",
            Action::WaitAndRetry => "wait_and_retry",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a monitor session returned.
#[derive(Debug)]
pub enum MonitorExit {
    /// The change subscription could not be opened.
    SubscribeFailed(AgentError),

    /// The subscription closed after delivering zero or more notifications.
    SubscriptionEnded {
        /// Notifications whose upload succeeded.
        uploads: u64,
        /// Notifications whose upload failed (not retried).
        failures: u64,
    },
}

impl MonitorExit {
    /// Whether at least one upload reached the store during the session.
    pub fn made_progress(&self) -> bool {
        matches!(self, MonitorExit::SubscriptionEnded { uploads, .. } if *uploads > 0)
    }

    /// Stable label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            MonitorExit::SubscribeFailed(_) => "subscribe_failed",
            MonitorExit::SubscriptionEnded { .. } => "subscription_ended",
        }
    }
}
