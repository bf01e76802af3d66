/**
 * Injectable source of the current time,
 *  so expiry can be driven by tests.
 */
pub mod clock;
/**
 * Cryptographic types and operations.
 *  - AES-256-GCM sealing under random keys
 *  - PBKDF2 passphrase key derivation
 *  - Random password generation
 */
pub mod crypto;
/**
 * Checks applied before anything reaches the store:
 *  identifier validation and constant-time
 *  bearer authentication.
 */
pub mod gate;
/**
 * Create / retrieve-and-burn / expire state machine
 *  for stored secrets.
 */
pub mod lifecycle;
/**
 * Key-value store abstraction the lifecycle
 *  manager runs over, plus an in-memory engine.
 */
pub mod store;
/**
 * URL-safe packing of keys and salts into
 *  share-link fragments.
 */
pub mod transport;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::clock::{Clock, SharedClock, SystemClock};
    pub use crate::crypto::{CryptoError, Envelope, Salt, Secret};
    pub use crate::gate::{AdminGate, SecretId, Unauthorized};
    pub use crate::lifecycle::{LifecycleError, NewSecret, SecretManager, ValidationError};
    pub use crate::store::{KvError, KvStore, MemoryKvStore};
    pub use crate::transport::{KeyFragment, ShareLink, TransportError};
    pub use crate::version::build_info;
}
