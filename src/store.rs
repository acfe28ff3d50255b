// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Remote store integration.
//!
//! Defines the capability the agent needs from the key-value store and the
//! etcd v3 implementation used in production.
//!
//! # Example
//!
//! ```rust,no_run
//! use bolt_monitor::store::{BoxFuture, StoreClient};
//! use std::collections::HashMap;
//! use std::sync::Mutex;
//!
//! struct MapStore(Mutex<HashMap<String, String>>);
//!
//! impl StoreClient for MapStore {
//!     fn get(&self, key: &str) -> BoxFuture<'_, Option<String>> {
//!         let value = self.0.lock().unwrap().get(key).cloned();
//!         Box::pin(async move { Ok(value) })
//!     }
//!
//!     fn set(&self, key: &str, value: String) -> BoxFuture<'_, ()> {
//!         self.0.lock().unwrap().insert(key.to_string(), value);
//!         Box::pin(async move { Ok(()) })
//!     }
//! }
//! ```

use crate::error::{AgentError, Result};
use crate::metrics;
use crate::resilience::RetryConfig;
use etcd_client::{Client, ConnectOptions, GetOptions};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::{info, warn};

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Type alias for boxed async futures (reduces trait signature complexity).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = StoreResult<T>> + Send + 'a>>;

/// Transport-level store failure (network error or request timeout).
///
/// A missing key is never a `StoreError`; `get` returns `Ok(None)` instead.
#[derive(Debug, Clone)]
pub struct StoreError(pub String);

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for StoreError {}

/// What the agent needs from the remote key-value store.
///
/// Single-key operations only; no transactions. Implementations apply their
/// own per-request timeout and report it as a [`StoreError`].
pub trait StoreClient: Send + Sync + 'static {
    /// Fetch the value at `key`, or `None` when the key does not exist.
    fn get(&self, key: &str) -> BoxFuture<'_, Option<String>>;

    /// Overwrite the value at `key`.
    fn set(&self, key: &str, value: String) -> BoxFuture<'_, ()>;

    /// Check whether `key` exists.
    ///
    /// Default implementation fetches the value and discards it.
    fn exists(&self, key: &str) -> BoxFuture<'_, bool> {
        let key = key.to_string();
        Box::pin(async move { Ok(self.get(&key).await?.is_some()) })
    }
}

/// etcd v3 store client.
///
/// The underlying [`etcd_client::Client`] is cheap to clone and balances
/// requests across all configured endpoints.
#[derive(Clone)]
pub struct EtcdStore {
    client: Client,
    request_timeout: Duration,
}

impl EtcdStore {
    /// Connect once to the given endpoints.
    pub async fn connect(endpoints: &[String], request_timeout: Duration) -> StoreResult<Self> {
        let options = ConnectOptions::new()
            .with_timeout(request_timeout)
            .with_connect_timeout(request_timeout);
        let client = Client::connect(endpoints, Some(options))
            .await
            .map_err(|e| StoreError(format!("connect failed: {}", e)))?;
        Ok(Self {
            client,
            request_timeout,
        })
    }

    /// Connect with exponential backoff.
    ///
    /// With [`RetryConfig::daemon()`] this never gives up.
    pub async fn connect_with_retry(
        endpoints: &[String],
        request_timeout: Duration,
        retry_config: &RetryConfig,
    ) -> Result<Self> {
        info!(endpoints = ?endpoints, "Connecting to etcd");
        let mut attempt = 0;

        loop {
            attempt += 1;

            let conn_result = tokio::time::timeout(
                retry_config.connection_timeout,
                Self::connect(endpoints, request_timeout),
            )
            .await;

            let err_msg = match conn_result {
                Ok(Ok(store)) => {
                    metrics::record_store_connection(true);
                    if attempt > 1 {
                        info!(attempt, "Connected to etcd after retry");
                    } else {
                        info!("Connected to etcd");
                    }
                    return Ok(store);
                }
                Ok(Err(e)) => e.to_string(),
                Err(_) => format!(
                    "connection timed out after {:?}",
                    retry_config.connection_timeout
                ),
            };

            metrics::record_store_connection(false);

            if attempt >= retry_config.max_attempts {
                return Err(AgentError::store(
                    "connect",
                    endpoints.join(","),
                    format!("failed after {} attempts: {}", attempt, err_msg),
                ));
            }

            let delay = retry_config.delay_for_attempt(attempt);
            warn!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err_msg,
                "etcd connection attempt failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn timed<T, F>(&self, operation: &str, fut: F) -> StoreResult<T>
    where
        F: Future<Output = std::result::Result<T, etcd_client::Error>>,
    {
        match tokio::time::timeout(self.request_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(StoreError(format!("{} failed: {}", operation, e))),
            Err(_) => Err(StoreError(format!(
                "{} timed out after {:?}",
                operation, self.request_timeout
            ))),
        }
    }
}

/// Stored bytes as text.
///
/// Invalid UTF-8 becomes U+FFFD, which is never hex, so a corrupt value is
/// reported by the codec as a decode error instead of a transport failure.
fn value_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

impl StoreClient for EtcdStore {
    fn get(&self, key: &str) -> BoxFuture<'_, Option<String>> {
        let key = key.to_string();
        let mut client = self.client.clone();
        Box::pin(async move {
            let resp = self.timed("get", client.get(key, None)).await?;
            Ok(resp.kvs().first().map(|kv| value_text(kv.value())))
        })
    }

    fn set(&self, key: &str, value: String) -> BoxFuture<'_, ()> {
        let key = key.to_string();
        let mut client = self.client.clone();
        Box::pin(async move {
            self.timed("put", client.put(key, value, None)).await?;
            Ok(())
        })
    }

    fn exists(&self, key: &str) -> BoxFuture<'_, bool> {
        let key = key.to_string();
        let mut client = self.client.clone();
        Box::pin(async move {
            let resp = self
                .timed("count", client.get(key, Some(GetOptions::new().with_count_only())))
                .await?;
            Ok(resp.count() > 0)
        })
    }
}
