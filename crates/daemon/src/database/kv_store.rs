use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::Row;
use time::OffsetDateTime;

use common::clock::{SharedClock, SystemClock};
use common::store::{KvError, KvStore};

use super::Database;

/// [`KvStore`] over the `kv` table.
///
/// Rows carry an absolute expiry in unix milliseconds. Expired rows are never
///  returned; a read deletes its own row once expired and every write sweeps all
///  expired rows, so rows that are never read again still go.
#[derive(Debug, Clone)]
pub struct SqliteKvStore {
    db: Database,
    clock: SharedClock,
}

impl SqliteKvStore {
    pub fn new(db: Database) -> Self {
        Self::with_clock(db, Arc::new(SystemClock))
    }

    pub fn with_clock(db: Database, clock: SharedClock) -> Self {
        Self { db, clock }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn now_ms(&self) -> i64 {
        unix_ms(self.clock.now())
    }

    /// Drop every expired row, returning how many went
    pub async fn purge_expired(&self) -> Result<u64, KvError> {
        let result = sqlx::query("DELETE FROM kv WHERE expires_at IS NOT NULL AND expires_at <= ?")
            .bind(self.now_ms())
            .execute(&*self.db)
            .await
            .map_err(backend)?;
        Ok(result.rows_affected())
    }
}

fn unix_ms(at: OffsetDateTime) -> i64 {
    i64::try_from(at.unix_timestamp_nanos() / 1_000_000).unwrap_or(i64::MAX)
}

fn backend(e: sqlx::Error) -> KvError {
    KvError::Backend(e.to_string())
}

#[async_trait]
impl KvStore for SqliteKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let row = sqlx::query("SELECT value, expires_at FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&*self.db)
            .await
            .map_err(backend)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let value: String = row.try_get("value").map_err(backend)?;
        let expires_at: Option<i64> = row.try_get("expires_at").map_err(backend)?;

        let now = self.now_ms();
        match expires_at {
            Some(at) if at <= now => {
                sqlx::query("DELETE FROM kv WHERE key = ? AND expires_at <= ?")
                    .bind(key)
                    .bind(now)
                    .execute(&*self.db)
                    .await
                    .map_err(backend)?;
                Ok(None)
            }
            _ => Ok(Some(value)),
        }
    }

    async fn put(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), KvError> {
        let now = self.clock.now();
        let expires_at = ttl.map(|ttl| unix_ms(now + ttl));

        let mut tx = self.db.begin().await.map_err(backend)?;
        sqlx::query("DELETE FROM kv WHERE expires_at IS NOT NULL AND expires_at <= ?")
            .bind(unix_ms(now))
            .execute(&mut *tx)
            .await
            .map_err(backend)?;
        sqlx::query(
            r#"
            INSERT INTO kv (key, value, expires_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(expires_at)
        .execute(&mut *tx)
        .await
        .map_err(backend)?;
        tx.commit().await.map_err(backend)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), KvError> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&*self.db)
            .await
            .map_err(backend)?;
        Ok(())
    }
}
