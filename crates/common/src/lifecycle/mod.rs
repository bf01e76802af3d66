//! Secret lifecycle
//!
//! A stored secret is created once, may be read up to its view limit, and is gone
//!  after the last permitted view or once its expiry passes, whichever comes first.
//!
//! ```text
//! create ──> Active(0) ──view──> Active(1) ──view──> ... ──last view──> Gone
//!              │                                                  ▲
//!              └───────────────── now >= expiresAt ───────────────┘
//! ```
//!
//! Burned and expired records are indistinguishable to callers: both surface as
//!  [`LifecycleError::NotFound`].

mod locks;
mod manager;
mod record;
mod validate;

use crate::store::KvError;

pub use locks::{IdLocks, DEFAULT_LOCK_STRIPES};
pub use manager::{SecretManager, DEFAULT_STORE_TIMEOUT};
pub use record::{SecretState, StoredSecret, ViewOutcome, MIN_STORE_TTL};
pub use validate::{
    NewSecret, ValidationError, MAX_CIPHERTEXT_LENGTH, MAX_TTL_SECONDS, MAX_VIEW_LIMIT,
    MIN_TTL_SECONDS, MIN_VIEW_LIMIT, NONCE_LENGTH,
};

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("invalid secret: {0}")]
    Validation(#[from] ValidationError),
    #[error("secret not found or already burned")]
    NotFound,
    #[error("storage error: {0}")]
    Storage(#[from] KvError),
}
