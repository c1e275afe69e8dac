//! TTL cache contract and request coalescing.
//!
//! Values are stored as opaque JSON blobs inside an envelope carrying the
//! write timestamp and TTL; expiry happens lazily on read. `SingleFlight`
//! coalesces concurrent computations for the same key so only one network
//! fetch runs per key at a time.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OnceCell};

/// Stored cache entry: opaque value plus TTL metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Envelope {
    value: serde_json::Value,
    timestamp_ms: u64,
    ttl_ms: u64,
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Async key-value cache with per-entry TTL, expiring lazily on read.
pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Option<serde_json::Value>> + Send;
    fn set(
        &self,
        key: &str,
        value: serde_json::Value,
        ttl: Duration,
    ) -> impl Future<Output = ()> + Send;
}

/// Fetch and deserialize a cached value. A malformed entry is treated as a
/// miss rather than an error, so stale schema changes degrade gracefully.
pub async fn get_typed<C: Cache, T: DeserializeOwned>(cache: &C, key: &str) -> Option<T> {
    let value = cache.get(key).await?;
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            tracing::warn!(key = %key, error = %err, "malformed cache entry, treating as miss");
            None
        }
    }
}

/// Serialize and store a value under the given TTL.
pub async fn set_typed<C: Cache, T: Serialize>(cache: &C, key: &str, value: &T, ttl: Duration) {
    match serde_json::to_value(value) {
        Ok(json) => cache.set(key, json, ttl).await,
        Err(err) => {
            tracing::warn!(key = %key, error = %err, "failed to serialize cache value");
        }
    }
}

/// In-memory cache implementation of the contract.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Envelope>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Option<serde_json::Value> {
        let mut entries = self.entries.lock().await;
        let entry = entries.get(key)?;
        if now_ms() > entry.timestamp_ms + entry.ttl_ms {
            tracing::debug!(key = %key, "cache entry expired");
            entries.remove(key);
            return None;
        }
        Some(entry.value.clone())
    }

    async fn set(&self, key: &str, value: serde_json::Value, ttl: Duration) {
        let envelope = Envelope {
            value,
            timestamp_ms: now_ms(),
            ttl_ms: ttl.as_millis() as u64,
        };
        self.entries.lock().await.insert(key.to_string(), envelope);
    }
}

/// Coalesces concurrent computations for the same key onto one in-flight
/// future. The per-key cell moves through Unstarted -> InFlight -> Done;
/// second-and-later callers attach to the existing computation instead of
/// starting their own.
#[derive(Debug, Default)]
pub struct SingleFlight<T> {
    cells: Mutex<HashMap<String, Arc<OnceCell<T>>>>,
}

impl<T: Clone> SingleFlight<T> {
    pub fn new() -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
        }
    }

    /// Run `make` for this key, or await the already-running computation.
    pub async fn run<F, Fut>(&self, key: &str, make: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let cell = {
            let mut cells = self.cells.lock().await;
            cells
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };
        cell.get_or_init(make).await.clone()
    }

    /// Drop the completed (or pending) cell so the next caller recomputes.
    pub async fn forget(&self, key: &str) {
        self.cells.lock().await.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_set_get_roundtrip() {
        let cache = MemoryCache::new();
        set_typed(&cache, "k", &vec![1u32, 2, 3], Duration::from_secs(60)).await;

        let value: Option<Vec<u32>> = get_typed(&cache, "k").await;
        assert_eq!(value, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn test_miss_on_unknown_key() {
        let cache = MemoryCache::new();
        assert!(cache.get("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_expiry_is_lazy_on_read() {
        let cache = MemoryCache::new();
        cache
            .set("k", serde_json::json!("v"), Duration::from_millis(0))
            .await;

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(cache.get("k").await.is_none());
        // Expired entry was removed by the read
        assert!(cache.entries.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_entry_is_a_miss() {
        let cache = MemoryCache::new();
        cache
            .set("k", serde_json::json!("not a number"), Duration::from_secs(60))
            .await;

        let value: Option<u64> = get_typed(&cache, "k").await;
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_single_flight_deduplicates() {
        let flights = SingleFlight::<u64>::new();
        let calls = AtomicUsize::new(0);

        let make = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            42u64
        };

        let (a, b) = tokio::join!(flights.run("k", make), flights.run("k", make));
        assert_eq!(a, 42);
        assert_eq!(b, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_single_flight_forget_recomputes() {
        let flights = SingleFlight::<u64>::new();
        let calls = AtomicUsize::new(0);

        let make = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            7u64
        };

        assert_eq!(flights.run("k", make).await, 7);
        assert_eq!(flights.run("k", make).await, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        flights.forget("k").await;
        assert_eq!(flights.run("k", make).await, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
