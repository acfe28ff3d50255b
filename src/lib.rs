//! # Bolt Monitor
//!
//! A sidecar agent that keeps one local database file and one etcd key in
//! sync, so a freshly provisioned node can recover the database from etcd and
//! an existing node's writes are copied off-box as they happen.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────────┐
//! │                             bolt-monitor                              │
//! │                                                                       │
//! │  ┌──────────────┐   probe    ┌───────────────┐   push / pull          │
//! │  │  FileProbe   │◄──────────►│ ReconcileEngine│◄─────────────┐        │
//! │  │ (local file) │            └───────────────┘               │        │
//! │  └──────────────┘                   │ ok                     ▼        │
//! │         ▲                           ▼                 ┌────────────┐  │
//! │         │ read            ┌─────────────────┐  set    │ StoreClient│  │
//! │         └─────────────────│    SyncLoop     │────────►│   (etcd)   │  │
//! │                           └─────────────────┘         └────────────┘  │
//! │                                   ▲ unbounded queue                   │
//! │                           ┌─────────────────┐                         │
//! │                           │  ChangeSource   │                         │
//! │                           │    (notify)     │                         │
//! │                           └─────────────────┘                         │
//! └───────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Reconcile, Then Monitor
//!
//! 1. **Reconcile**: whichever side has data wins. File only: push it. Key
//!    only: pull it. Neither: wait for the file. Both: no comparison, go
//!    straight to monitoring.
//! 2. **Monitor**: every modification of the file re-uploads the whole file
//!    as hex. If the subscription dies, reconcile again.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bolt_monitor::{EtcdStore, MonitorConfig, RetryConfig, SyncAgent};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), bolt_monitor::AgentError> {
//!     let config = MonitorConfig::load("/etc/heketi/bolt-monitor.yaml")?;
//!     let store = EtcdStore::connect_with_retry(
//!         config.endpoints(),
//!         config.request_timeout(),
//!         &RetryConfig::daemon(),
//!     )
//!     .await?;
//!
//!     // Runs until the process is killed
//!     SyncAgent::new(config, Arc::new(store)).run().await;
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod file;
pub mod metrics;
pub mod resilience;
pub mod store;
pub mod watch;

// Re-exports for convenience
pub use config::MonitorConfig;
pub use coordinator::{Action, AgentState, ExistencePair, MonitorExit, ReconcileEngine, SyncAgent, SyncLoop};
pub use error::{AgentError, Result};
pub use file::{FileProbe, LocalFile};
pub use resilience::RetryConfig;
pub use store::{EtcdStore, StoreClient, StoreError};
pub use watch::{ChangeEvent, ChangeSource, NotifyChangeSource, Subscription};
