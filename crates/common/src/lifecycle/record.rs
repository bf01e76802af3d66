use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::crypto::Envelope;

/// Shortest store TTL ever written for a live record
pub const MIN_STORE_TTL: Duration = Duration::from_secs(60);

/// What the store holds under `secret:{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSecret {
    pub ciphertext: String,
    pub nonce: String,
    pub view_limit: u32,
    pub view_count: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Where a record stands at a given instant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretState {
    Active(StoredSecret),
    /// Burned or expired. Callers never learn which.
    Gone,
}

/// The result of consuming one view of an active record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewOutcome {
    /// The view limit is now reached: delete, then hand out the payload
    Burned(Envelope),
    /// Views remain: write back `record` with a store TTL of `ttl`
    Viewed {
        record: StoredSecret,
        ttl: Duration,
        envelope: Envelope,
    },
}

impl StoredSecret {
    pub fn new(
        ciphertext: String,
        nonce: String,
        view_limit: u32,
        ttl: Duration,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            ciphertext,
            nonce,
            view_limit,
            view_count: 0,
            expires_at: now + ttl,
            created_at: now,
        }
    }

    pub fn state_at(self, now: OffsetDateTime) -> SecretState {
        if now >= self.expires_at || self.view_count >= self.view_limit {
            SecretState::Gone
        } else {
            SecretState::Active(self)
        }
    }

    /// Remaining lifetime as a store TTL: whole seconds, rounded up, never under a minute
    pub fn store_ttl_at(&self, now: OffsetDateTime) -> Duration {
        let remaining_ms = (self.expires_at - now).whole_milliseconds().max(0);
        let secs = u64::try_from((remaining_ms + 999) / 1000).unwrap_or(u64::MAX);
        Duration::from_secs(secs).max(MIN_STORE_TTL)
    }

    fn envelope(&self) -> Envelope {
        Envelope {
            ciphertext: self.ciphertext.clone(),
            nonce: self.nonce.clone(),
        }
    }

    /// Count one view. Only meaningful on a record that is [`SecretState::Active`].
    pub fn consume_view(mut self, now: OffsetDateTime) -> ViewOutcome {
        self.view_count += 1;
        let envelope = self.envelope();
        if self.view_count >= self.view_limit {
            ViewOutcome::Burned(envelope)
        } else {
            let ttl = self.store_ttl_at(now);
            ViewOutcome::Viewed {
                record: self,
                ttl,
                envelope,
            }
        }
    }
}
