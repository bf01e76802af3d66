use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;

use super::provider::{KvError, KvStore};
use crate::clock::{SharedClock, SystemClock};

/// In-memory key-value store.
///
/// Expired entries are never returned. A read drops its own key once expired;
///  every write sweeps all expired entries.
#[derive(Debug, Clone)]
pub struct MemoryKvStore {
    inner: Arc<RwLock<HashMap<String, Entry>>>,
    clock: SharedClock,
}

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<OffsetDateTime>,
}

impl Entry {
    fn is_live(&self, now: OffsetDateTime) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> KvError {
    KvError::Backend(format!("failed to acquire lock: {}", e))
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: SharedClock) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    /// Number of entries physically held, including expired ones not yet dropped
    pub fn entry_count(&self) -> usize {
        self.inner.read().map(|map| map.len()).unwrap_or_default()
    }
}

impl Default for MemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let now = self.clock.now();
        {
            let inner = self.inner.read().map_err(poisoned)?;
            match inner.get(key) {
                None => return Ok(None),
                Some(entry) if entry.is_live(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        // expired: drop it, unless it was rewritten in between
        let mut inner = self.inner.write().map_err(poisoned)?;
        if inner.get(key).is_some_and(|entry| !entry.is_live(now)) {
            inner.remove(key);
        }
        Ok(None)
    }

    async fn put(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), KvError> {
        let now = self.clock.now();
        let expires_at = ttl.map(|ttl| now + ttl);
        let mut inner = self.inner.write().map_err(poisoned)?;
        inner.retain(|_, entry| entry.is_live(now));
        inner.insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), KvError> {
        let mut inner = self.inner.write().map_err(poisoned)?;
        inner.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryKvStore::new();
        assert_eq!(store.get("a").await.unwrap(), None);

        store.put("a", "1".into(), None).await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));

        store.put("a", "2".into(), None).await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("2"));

        store.delete("a").await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), None);

        // deleting twice is fine
        store.delete("a").await.unwrap();
    }

    #[tokio::test]
    async fn test_ttl_eviction() {
        let clock = ManualClock::starting_now();
        let store = MemoryKvStore::with_clock(Arc::new(clock.clone()));

        store
            .put("k", "v".into(), Some(Duration::from_secs(60)))
            .await
            .unwrap();
        store.put("forever", "v".into(), None).await.unwrap();

        clock.advance(Duration::from_secs(59));
        assert!(store.get("k").await.unwrap().is_some());

        clock.advance(Duration::from_secs(1));
        assert!(store.get("k").await.unwrap().is_none());
        assert!(store.get("forever").await.unwrap().is_some());

        // the expired entry was dropped on access
        assert_eq!(store.entry_count(), 1);
    }

    #[tokio::test]
    async fn test_writes_evict_unread_expired_entries() {
        let clock = ManualClock::starting_now();
        let store = MemoryKvStore::with_clock(Arc::new(clock.clone()));

        for i in 0..50 {
            store
                .put(&format!("old:{}", i), "v".into(), Some(Duration::from_secs(300)))
                .await
                .unwrap();
        }
        store.put("forever", "v".into(), None).await.unwrap();
        assert_eq!(store.entry_count(), 51);

        // none of the old keys is ever read again
        clock.advance(Duration::from_secs(30 * 24 * 60 * 60));
        store
            .put("new", "v".into(), Some(Duration::from_secs(300)))
            .await
            .unwrap();

        assert_eq!(store.entry_count(), 2);
        assert!(store.get("forever").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_put_resets_ttl() {
        let clock = ManualClock::starting_now();
        let store = MemoryKvStore::with_clock(Arc::new(clock.clone()));

        store
            .put("k", "v1".into(), Some(Duration::from_secs(10)))
            .await
            .unwrap();
        clock.advance(Duration::from_secs(8));
        store
            .put("k", "v2".into(), Some(Duration::from_secs(10)))
            .await
            .unwrap();
        clock.advance(Duration::from_secs(8));

        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));
    }
}
