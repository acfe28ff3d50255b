//! Mock StoreClient for testing.
//!
//! Keeps values in memory, records every call, and can be told to fail or to
//! slow down so fault isolation and ordering can be asserted.

use bolt_monitor::store::{BoxFuture, StoreClient, StoreError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

/// A recorded set() call.
#[derive(Debug, Clone)]
pub struct SetCall {
    pub key: String,
    pub value: String,
}

/// In-memory store that records all calls.
///
/// # Example
/// ```rust,ignore
/// let store = MockStore::new();
/// store.fail_next_sets(1);
///
/// // Use in tests...
///
/// assert_eq!(store.sets().await.len(), 2);
/// ```
pub struct MockStore {
    values: RwLock<HashMap<String, String>>,
    /// Successful set() calls, in order
    sets: RwLock<Vec<SetCall>>,
    /// Number of upcoming set() calls that should fail
    failing_sets: AtomicUsize,
    /// Whether get()/exists() fail
    failing_reads: AtomicBool,
    /// Artificial latency for set(), in milliseconds
    set_delay_ms: AtomicUsize,
    exists_calls: AtomicUsize,
    get_calls: AtomicUsize,
    attempted_sets: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            sets: RwLock::new(Vec::new()),
            failing_sets: AtomicUsize::new(0),
            failing_reads: AtomicBool::new(false),
            set_delay_ms: AtomicUsize::new(0),
            exists_calls: AtomicUsize::new(0),
            get_calls: AtomicUsize::new(0),
            attempted_sets: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Create a store that already holds `value` at `key`.
    pub async fn with_value(key: &str, value: &str) -> Self {
        let store = Self::new();
        store.put_value(key, value).await;
        store
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Seed a value without recording a set() call.
    pub async fn put_value(&self, key: &str, value: &str) {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
    }

    /// Make the next `n` set() calls fail with a transport error.
    pub fn fail_next_sets(&self, n: usize) {
        self.failing_sets.store(n, Ordering::SeqCst);
    }

    /// Make get()/exists() fail until turned off again.
    pub fn fail_reads(&self, fail: bool) {
        self.failing_reads.store(fail, Ordering::SeqCst);
    }

    /// Slow every set() down by `delay`.
    pub fn set_delay(&self, delay: Duration) {
        self.set_delay_ms
            .store(delay.as_millis() as usize, Ordering::SeqCst);
    }

    // =========================================================================
    // Query Methods
    // =========================================================================

    /// Current value at `key`.
    pub async fn value(&self, key: &str) -> Option<String> {
        self.values.read().await.get(key).cloned()
    }

    /// All successful set() calls, in order.
    pub async fn sets(&self) -> Vec<SetCall> {
        self.sets.read().await.clone()
    }

    /// set() calls including the failed ones.
    pub fn attempted_sets(&self) -> usize {
        self.attempted_sets.load(Ordering::SeqCst)
    }

    pub fn exists_calls(&self) -> usize {
        self.exists_calls.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    /// Highest number of set() calls observed running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn read_failure(&self) -> Option<StoreError> {
        if self.failing_reads.load(Ordering::SeqCst) {
            Some(StoreError("simulated: connection refused".to_string()))
        } else {
            None
        }
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreClient for MockStore {
    fn get(&self, key: &str) -> BoxFuture<'_, Option<String>> {
        let key = key.to_string();
        Box::pin(async move {
            self.get_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(err) = self.read_failure() {
                return Err(err);
            }
            Ok(self.values.read().await.get(&key).cloned())
        })
    }

    fn exists(&self, key: &str) -> BoxFuture<'_, bool> {
        let key = key.to_string();
        Box::pin(async move {
            self.exists_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(err) = self.read_failure() {
                return Err(err);
            }
            Ok(self.values.read().await.contains_key(&key))
        })
    }

    fn set(&self, key: &str, value: String) -> BoxFuture<'_, ()> {
        let key = key.to_string();
        Box::pin(async move {
            self.attempted_sets.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            let delay = self.set_delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay as u64)).await;
            }

            let should_fail = self
                .failing_sets
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();

            let result = if should_fail {
                Err(StoreError("simulated: deadline exceeded".to_string()))
            } else {
                self.values.write().await.insert(key.clone(), value.clone());
                self.sets.write().await.push(SetCall { key, value });
                Ok(())
            };

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_sets() {
        let store = MockStore::new();
        store.set("/k", "00".to_string()).await.unwrap();

        let sets = store.sets().await;
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].key, "/k");
        assert_eq!(store.value("/k").await.as_deref(), Some("00"));
    }

    #[tokio::test]
    async fn test_mock_fail_next_sets() {
        let store = MockStore::new();
        store.fail_next_sets(1);

        assert!(store.set("/k", "01".into()).await.is_err());
        assert!(store.set("/k", "02".into()).await.is_ok());
        assert_eq!(store.attempted_sets(), 2);
        assert_eq!(store.sets().await.len(), 1);
    }
}
