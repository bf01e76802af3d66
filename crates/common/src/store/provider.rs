use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum KvError {
    /// The backend could not complete the operation
    #[error("store backend error: {0}")]
    Backend(String),
    /// The backend did not answer within the configured bound
    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),
}

/// A key-value store with per-key atomicity and optional time-based eviction.
///
/// Implementations make no multi-key or compare-and-swap guarantees. Callers that
///  need read-modify-write semantics on a key must serialize access themselves.
#[async_trait]
pub trait KvStore: Send + Sync + Debug + 'static {
    /// Fetch a value.
    ///
    /// # Returns
    /// * `Ok(None)` - The key was never written, was deleted, or has been evicted
    async fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Arguments
    /// * `ttl` - Evict the entry this long after the write; `None` keeps it until deleted
    async fn put(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), KvError>;

    /// Remove a value. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), KvError>;
}
