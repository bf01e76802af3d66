use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::{SharedClock, SystemClock};
use crate::crypto::Envelope;
use crate::gate::SecretId;
use crate::store::{KvError, KvStore};

use super::locks::IdLocks;
use super::record::{SecretState, StoredSecret, ViewOutcome};
use super::validate::NewSecret;
use super::LifecycleError;

pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Owns every stored secret's lifecycle.
///
/// Cheap to clone; clones share the store and the per-id locks. All reads and
///  writes of a record go through one of these, so a process must build a single
///  manager per store and hand out clones.
#[derive(Debug, Clone)]
pub struct SecretManager {
    store: Arc<dyn KvStore>,
    clock: SharedClock,
    locks: Arc<IdLocks>,
    store_timeout: Duration,
}

impl SecretManager {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            locks: Arc::new(IdLocks::default()),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Bound every store call by `timeout`
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    pub fn store_timeout(&self) -> Duration {
        self.store_timeout
    }

    async fn bounded<T>(
        &self,
        op: impl Future<Output = Result<T, KvError>>,
    ) -> Result<T, KvError> {
        tokio::time::timeout(self.store_timeout, op)
            .await
            .map_err(|_| KvError::Timeout(self.store_timeout))?
    }

    /// Validate and store a new secret.
    ///
    /// # Returns
    /// * `Ok(id)` - The fresh identifier the secret is now stored under
    /// * `Err(LifecycleError::Validation)` - Nothing was written
    pub async fn create(&self, new: NewSecret) -> Result<SecretId, LifecycleError> {
        new.validate()?;

        let id = SecretId::generate();
        let ttl = Duration::from_secs(new.ttl_seconds);
        let record = StoredSecret::new(
            new.ciphertext,
            new.nonce,
            new.view_limit,
            ttl,
            self.clock.now(),
        );
        let value = encode_record(&record)?;

        self.bounded(self.store.put(&id.storage_key(), value, Some(ttl)))
            .await?;

        tracing::info!(
            %id,
            view_limit = record.view_limit,
            expires_at = %record.expires_at,
            "secret created"
        );
        Ok(id)
    }

    /// Consume one view of a secret and return its payload.
    ///
    /// Across any number of concurrent callers this hands out the payload at most
    ///  `viewLimit` times. The view that reaches the limit deletes the record
    ///  before returning.
    ///
    /// # Returns
    /// * `Err(LifecycleError::NotFound)` - Malformed id, never existed, burned or
    ///   expired. Malformed ids never reach the store.
    pub async fn retrieve_and_consume_view(&self, id: &str) -> Result<Envelope, LifecycleError> {
        let id = SecretId::parse(id).ok_or(LifecycleError::NotFound)?;
        let key = id.storage_key();

        let _guard = self.locks.lock(&id).await;

        let Some(raw) = self.bounded(self.store.get(&key)).await? else {
            return Err(LifecycleError::NotFound);
        };
        let record = decode_record(&raw)?;
        let now = self.clock.now();

        let record = match record.state_at(now) {
            SecretState::Active(record) => record,
            SecretState::Gone => {
                self.bounded(self.store.delete(&key)).await?;
                tracing::info!(%id, "secret expired on access");
                return Err(LifecycleError::NotFound);
            }
        };

        match record.consume_view(now) {
            ViewOutcome::Burned(envelope) => {
                self.bounded(self.store.delete(&key)).await?;
                tracing::info!(%id, "secret burned");
                Ok(envelope)
            }
            ViewOutcome::Viewed {
                record,
                ttl,
                envelope,
            } => {
                let value = encode_record(&record)?;
                self.bounded(self.store.put(&key, value, Some(ttl))).await?;
                tracing::debug!(
                    %id,
                    view_count = record.view_count,
                    view_limit = record.view_limit,
                    "secret viewed"
                );
                Ok(envelope)
            }
        }
    }

    /// Remove a secret regardless of its remaining views. Malformed ids are a no-op.
    pub async fn delete(&self, id: &str) -> Result<(), LifecycleError> {
        let Some(id) = SecretId::parse(id) else {
            return Ok(());
        };
        let _guard = self.locks.lock(&id).await;
        self.bounded(self.store.delete(&id.storage_key())).await?;
        tracing::info!(%id, "secret deleted");
        Ok(())
    }
}

fn encode_record(record: &StoredSecret) -> Result<String, KvError> {
    serde_json::to_string(record).map_err(|e| KvError::Backend(format!("encode record: {}", e)))
}

fn decode_record(raw: &str) -> Result<StoredSecret, KvError> {
    serde_json::from_str(raw).map_err(|e| KvError::Backend(format!("corrupt record: {}", e)))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::clock::ManualClock;
    use crate::crypto;
    use crate::store::MemoryKvStore;

    /// Counts calls and records put TTLs; optionally stalls reads to widen races
    #[derive(Debug, Default)]
    struct InstrumentedStore {
        inner: MemoryKvStore,
        calls: AtomicUsize,
        ttls: Mutex<Vec<Option<Duration>>>,
        read_delay: Option<Duration>,
    }

    impl InstrumentedStore {
        fn slow(read_delay: Duration) -> Self {
            Self {
                read_delay: Some(read_delay),
                ..Default::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn last_ttl(&self) -> Option<Duration> {
            self.ttls.lock().unwrap().last().copied().flatten()
        }
    }

    #[async_trait]
    impl KvStore for InstrumentedStore {
        async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let value = self.inner.get(key).await;
            if let Some(delay) = self.read_delay {
                tokio::time::sleep(delay).await;
            }
            value
        }

        async fn put(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), KvError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.ttls.lock().unwrap().push(ttl);
            self.inner.put(key, value, ttl).await
        }

        async fn delete(&self, key: &str) -> Result<(), KvError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.delete(key).await
        }
    }

    #[derive(Debug)]
    struct HangingStore;

    #[async_trait]
    impl KvStore for HangingStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, KvError> {
            std::future::pending().await
        }

        async fn put(&self, _key: &str, _value: String, _ttl: Option<Duration>) -> Result<(), KvError> {
            std::future::pending().await
        }

        async fn delete(&self, _key: &str) -> Result<(), KvError> {
            std::future::pending().await
        }
    }

    #[derive(Debug)]
    struct FailingStore;

    #[async_trait]
    impl KvStore for FailingStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, KvError> {
            Err(KvError::Backend("down".into()))
        }

        async fn put(&self, _key: &str, _value: String, _ttl: Option<Duration>) -> Result<(), KvError> {
            Err(KvError::Backend("down".into()))
        }

        async fn delete(&self, _key: &str) -> Result<(), KvError> {
            Err(KvError::Backend("down".into()))
        }
    }

    fn new_secret(view_limit: u32, ttl_seconds: u64) -> NewSecret {
        let (envelope, _key) = crypto::encrypt("hunter2").unwrap();
        NewSecret::new(envelope, view_limit, ttl_seconds)
    }

    #[tokio::test]
    async fn test_create_writes_record_with_ttl() {
        let store = Arc::new(InstrumentedStore::default());
        let manager = SecretManager::new(store.clone());

        let id = manager.create(new_secret(2, 600)).await.unwrap();

        assert_eq!(store.last_ttl(), Some(Duration::from_secs(600)));
        let raw = store.inner.get(&id.storage_key()).await.unwrap().unwrap();
        let record: StoredSecret = serde_json::from_str(&raw).unwrap();
        assert_eq!(record.view_count, 0);
        assert_eq!(record.view_limit, 2);
        assert_eq!(
            record.expires_at - record.created_at,
            time::Duration::seconds(600)
        );
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_without_writing() {
        let store = Arc::new(InstrumentedStore::default());
        let manager = SecretManager::new(store.clone());

        let err = manager.create(new_secret(11, 600)).await.unwrap_err();
        assert!(matches!(err, LifecycleError::Validation(_)));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_malformed_id_never_reaches_store() {
        let store = Arc::new(InstrumentedStore::default());
        let manager = SecretManager::new(store.clone());

        for id in [
            "",
            "not-a-uuid",
            "../../etc/passwd",
            "secret:123",
            // version 1
            "6ba7b810-9dad-11d1-80b4-00c04fd430c8",
            // no hyphens
            "550e8400e29b41d4a716446655440000",
        ] {
            let err = manager.retrieve_and_consume_view(id).await.unwrap_err();
            assert!(matches!(err, LifecycleError::NotFound), "{id:?}");
            manager.delete(id).await.unwrap();
        }
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_id_not_found() {
        let manager = SecretManager::new(Arc::new(MemoryKvStore::new()));
        let err = manager
            .retrieve_and_consume_view(&SecretId::generate().to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::NotFound));
    }

    #[tokio::test]
    async fn test_burn_after_limit() {
        let store = Arc::new(MemoryKvStore::new());
        let manager = SecretManager::new(store.clone());
        let new = new_secret(3, 300);
        let expected = Envelope {
            ciphertext: new.ciphertext.clone(),
            nonce: new.nonce.clone(),
        };
        let id = manager.create(new).await.unwrap().to_string();

        for _ in 0..3 {
            let envelope = manager.retrieve_and_consume_view(&id).await.unwrap();
            assert_eq!(envelope, expected);
        }
        for _ in 0..3 {
            assert!(matches!(
                manager.retrieve_and_consume_view(&id).await,
                Err(LifecycleError::NotFound)
            ));
        }
        // physically removed, not just hidden
        assert_eq!(store.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_uppercase_id_accepted() {
        let manager = SecretManager::new(Arc::new(MemoryKvStore::new()));
        let id = manager.create(new_secret(1, 300)).await.unwrap();
        assert!(manager
            .retrieve_and_consume_view(&id.to_string().to_uppercase())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_expiry_deletes_on_access() {
        // the store's own clock never moves, so only the manager can expire the record
        let store = Arc::new(MemoryKvStore::new());
        let clock = ManualClock::starting_now();
        let manager = SecretManager::new(store.clone()).with_clock(Arc::new(clock.clone()));

        let id = manager.create(new_secret(10, 300)).await.unwrap().to_string();
        manager.retrieve_and_consume_view(&id).await.unwrap();

        clock.advance(Duration::from_secs(300));
        assert!(matches!(
            manager.retrieve_and_consume_view(&id).await,
            Err(LifecycleError::NotFound)
        ));
        assert_eq!(store.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_rewrite_keeps_expiry_and_floors_ttl() {
        let store = Arc::new(InstrumentedStore::default());
        let clock = ManualClock::starting_now();
        let manager = SecretManager::new(store.clone()).with_clock(Arc::new(clock.clone()));

        let id = manager.create(new_secret(5, 300)).await.unwrap();
        let key = id.storage_key();
        let id = id.to_string();
        let created: StoredSecret =
            serde_json::from_str(&store.inner.get(&key).await.unwrap().unwrap()).unwrap();

        clock.advance(Duration::from_millis(10_200));
        manager.retrieve_and_consume_view(&id).await.unwrap();
        assert_eq!(store.last_ttl(), Some(Duration::from_secs(290)));

        let viewed: StoredSecret =
            serde_json::from_str(&store.inner.get(&key).await.unwrap().unwrap()).unwrap();
        assert_eq!(viewed.view_count, 1);
        assert_eq!(viewed.expires_at, created.expires_at);
        assert_eq!(viewed.created_at, created.created_at);

        clock.advance(Duration::from_millis(289_300));
        manager.retrieve_and_consume_view(&id).await.unwrap();
        assert_eq!(store.last_ttl(), Some(Duration::from_secs(60)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_views_never_exceed_limit() {
        for (view_limit, readers) in [(1u32, 16usize), (3, 20), (10, 8)] {
            let store = Arc::new(InstrumentedStore::slow(Duration::from_millis(5)));
            let manager = SecretManager::new(store);
            let id = manager
                .create(new_secret(view_limit, 300))
                .await
                .unwrap()
                .to_string();

            let tasks: Vec<_> = (0..readers)
                .map(|_| {
                    let manager = manager.clone();
                    let id = id.clone();
                    tokio::spawn(async move { manager.retrieve_and_consume_view(&id).await })
                })
                .collect();

            let mut successes = 0;
            for result in futures::future::join_all(tasks).await {
                match result.unwrap() {
                    Ok(_) => successes += 1,
                    Err(LifecycleError::NotFound) => {}
                    Err(e) => panic!("unexpected error: {e}"),
                }
            }
            assert_eq!(successes, readers.min(view_limit as usize));
        }
    }

    #[tokio::test]
    async fn test_store_timeout_surfaces_as_storage_error() {
        let manager = SecretManager::new(Arc::new(HangingStore))
            .with_store_timeout(Duration::from_millis(20));

        let err = manager.create(new_secret(1, 300)).await.unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::Storage(KvError::Timeout(_))
        ));

        let err = manager
            .retrieve_and_consume_view(&SecretId::generate().to_string())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LifecycleError::Storage(KvError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_backend_failure_is_storage_error() {
        let manager = SecretManager::new(Arc::new(FailingStore));
        assert!(matches!(
            manager.create(new_secret(1, 300)).await,
            Err(LifecycleError::Storage(KvError::Backend(_)))
        ));
    }

    #[tokio::test]
    async fn test_corrupt_record_is_storage_error() {
        let store = Arc::new(MemoryKvStore::new());
        let manager = SecretManager::new(store.clone());
        let id = SecretId::generate();
        store
            .put(&id.storage_key(), "{not json".into(), None)
            .await
            .unwrap();

        assert!(matches!(
            manager.retrieve_and_consume_view(&id.to_string()).await,
            Err(LifecycleError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn test_explicit_delete() {
        let store = Arc::new(MemoryKvStore::new());
        let manager = SecretManager::new(store.clone());
        let id = manager.create(new_secret(10, 300)).await.unwrap().to_string();

        manager.delete(&id).await.unwrap();
        assert!(matches!(
            manager.retrieve_and_consume_view(&id).await,
            Err(LifecycleError::NotFound)
        ));
        assert_eq!(store.entry_count(), 0);
    }
}
