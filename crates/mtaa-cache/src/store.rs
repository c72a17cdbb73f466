//! Cache store trait and the in-memory implementation.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mtaa_core::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::entry::{CacheEntry, CacheStats};

/// Trait for TTL cache stores.
///
/// Expiry is lazy: `get` hides expired entries but does not delete them,
/// so `peek` can still hand them out as a degraded fallback. Storage is
/// reclaimed by a later `set` on the same key, `invalidate`, or an explicit
/// `purge_expired`.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get an unexpired entry. Anything else (absent, expired, unreadable)
    /// is a miss.
    async fn get(&self, key: &str) -> Option<CacheEntry>;

    /// Get an entry whether or not it has expired.
    async fn peek(&self, key: &str) -> Option<CacheEntry>;

    /// Store a value, replacing any existing entry for the key.
    async fn set(&self, key: &str, value: serde_json::Value, ttl: Duration) -> Result<CacheEntry>;

    /// Remove an entry. No-op if absent.
    async fn invalidate(&self, key: &str) -> Result<()>;

    /// Remove expired and unreadable entries, returning how many went.
    async fn purge_expired(&self) -> Result<usize>;

    /// Remove every entry.
    async fn clear(&self) -> Result<()>;

    /// Describe the current contents.
    async fn stats(&self) -> Result<CacheStats>;
}

/// Read an unexpired entry and decode it. Undecodable payloads are misses.
pub async fn get_typed<T: DeserializeOwned>(store: &dyn CacheStore, key: &str) -> Option<T> {
    let entry = store.get(key).await?;
    decode(entry)
}

/// Read an entry regardless of expiry and decode it.
pub async fn peek_typed<T: DeserializeOwned>(store: &dyn CacheStore, key: &str) -> Option<T> {
    let entry = store.peek(key).await?;
    decode(entry)
}

/// Encode and store a value.
pub async fn set_typed<T: Serialize + ?Sized>(
    store: &dyn CacheStore,
    key: &str,
    value: &T,
    ttl: Duration,
) -> Result<CacheEntry> {
    let value = serde_json::to_value(value)?;
    store.set(key, value, ttl).await
}

fn decode<T: DeserializeOwned>(entry: CacheEntry) -> Option<T> {
    match serde_json::from_value(entry.value) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Cache entry {} has an unexpected payload, treating as miss: {}", entry.key, e);
            None
        }
    }
}

const SHARDS: usize = 16;

type Shard = RwLock<HashMap<String, CacheEntry>>;

/// In-memory implementation of CacheStore.
///
/// Keys are spread over independently locked shards, so writers to one key
/// rarely contend with readers of another.
pub struct InMemoryCacheStore {
    shards: Arc<Vec<Shard>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryCacheStore {
    /// Create an empty store on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty store on a custom clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let shards = (0..SHARDS).map(|_| RwLock::new(HashMap::new())).collect();
        Self {
            shards: Arc::new(shards),
            clock,
        }
    }

    fn shard(&self, key: &str) -> &Shard {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let index = (hasher.finish() % SHARDS as u64) as usize;
        &self.shards[index]
    }
}

impl Default for InMemoryCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> Option<CacheEntry> {
        let shard = self.shard(key).read().await;

        match shard.get(key) {
            Some(entry) if entry.is_valid_at(self.clock.now()) => {
                debug!("Cache hit for key: {}", key);
                Some(entry.clone())
            }
            Some(_) => {
                debug!("Cache expired for key: {}", key);
                None
            }
            None => {
                debug!("Cache miss for key: {}", key);
                None
            }
        }
    }

    async fn peek(&self, key: &str) -> Option<CacheEntry> {
        self.shard(key).read().await.get(key).cloned()
    }

    async fn set(&self, key: &str, value: serde_json::Value, ttl: Duration) -> Result<CacheEntry> {
        let entry = CacheEntry::new(key, value, self.clock.now(), ttl);

        self.shard(key)
            .write()
            .await
            .insert(key.to_string(), entry.clone());

        debug!("Cached data with key: {}, TTL: {:?}", key, ttl);
        Ok(entry)
    }

    async fn invalidate(&self, key: &str) -> Result<()> {
        if self.shard(key).write().await.remove(key).is_some() {
            debug!("Invalidated cache for key: {}", key);
        }
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize> {
        let now = self.clock.now();
        let mut removed = 0;

        for shard in self.shards.iter() {
            let mut shard = shard.write().await;
            let before = shard.len();
            shard.retain(|_, entry| entry.is_valid_at(now));
            removed += before - shard.len();
        }

        debug!("Purged {} expired cache entries", removed);
        Ok(removed)
    }

    async fn clear(&self) -> Result<()> {
        for shard in self.shards.iter() {
            shard.write().await.clear();
        }
        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats> {
        let now = self.clock.now();
        let mut entries = Vec::new();

        for shard in self.shards.iter() {
            entries.extend(shard.read().await.values().cloned());
        }

        Ok(CacheStats::collect(&entries, 0, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::Utc;

    fn store_with_clock() -> (InMemoryCacheStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        (InMemoryCacheStore::with_clock(clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let store = InMemoryCacheStore::new();

        store
            .set("key1", serde_json::json!({"value": 42}), Duration::from_secs(60))
            .await
            .unwrap();

        let entry = store.get("key1").await;
        assert!(entry.is_some());
        assert_eq!(entry.unwrap().value["value"], 42);
    }

    #[tokio::test]
    async fn test_expired_entry_is_miss_but_still_present() {
        let (store, clock) = store_with_clock();

        store
            .set("food_nairobi", serde_json::json!(["Kibanda"]), Duration::from_secs(60))
            .await
            .unwrap();

        clock.advance(Duration::from_secs(61));

        assert!(store.get("food_nairobi").await.is_none());
        let stale = store.peek("food_nairobi").await.unwrap();
        assert_eq!(stale.value, serde_json::json!(["Kibanda"]));
        assert_eq!(store.stats().await.unwrap().expired_entries, 1);
    }

    #[tokio::test]
    async fn test_set_overwrites_and_refreshes() {
        let (store, clock) = store_with_clock();

        store.set("key1", serde_json::json!("v1"), Duration::from_secs(10)).await.unwrap();
        clock.advance(Duration::from_secs(20));
        store.set("key1", serde_json::json!("v2"), Duration::from_secs(10)).await.unwrap();

        let current = store.get("key1").await.unwrap();
        assert_eq!(current.value, "v2");
        assert_eq!(current.created_at, clock.now());
    }

    #[tokio::test]
    async fn test_invalidate() {
        let store = InMemoryCacheStore::new();

        store.set("key1", serde_json::json!("value"), Duration::from_secs(60)).await.unwrap();
        store.invalidate("key1").await.unwrap();
        store.invalidate("never-set").await.unwrap();

        assert!(store.get("key1").await.is_none());
        assert!(store.peek("key1").await.is_none());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let (store, clock) = store_with_clock();

        store.set("short", serde_json::json!(1), Duration::from_secs(5)).await.unwrap();
        store.set("long", serde_json::json!(2), Duration::from_secs(500)).await.unwrap();
        clock.advance(Duration::from_secs(10));

        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert!(store.peek("short").await.is_none());
        assert!(store.get("long").await.is_some());

        store.clear().await.unwrap();
        assert_eq!(store.stats().await.unwrap().total_entries, 0);
    }

    #[tokio::test]
    async fn test_typed_helpers() {
        let store = InMemoryCacheStore::new();

        set_typed(&store, "names", &vec!["a".to_string(), "b".to_string()], Duration::from_secs(60))
            .await
            .unwrap();

        let names: Vec<String> = get_typed(&store, "names").await.unwrap();
        assert_eq!(names, vec!["a", "b"]);

        // Wrong shape decodes as a miss rather than an error.
        let wrong: Option<u64> = get_typed(&store, "names").await;
        assert!(wrong.is_none());
    }
}
