//! Cryptographic primitives for Deadrop
//!
//! Everything in this module runs on the client: the creator encrypts before
//!  uploading and the reader decrypts after downloading. The server stores
//!  ciphertext and never holds a key.
//!
//! - **Random mode**: a fresh AES-256-GCM key per secret; the key is carried in the
//!   share link fragment.
//! - **Passphrase mode**: the key is derived with PBKDF2-HMAC-SHA256 (100k iterations)
//!   from a passphrase and a random 128-bit salt; only the salt is carried in the
//!   fragment and the passphrase is communicated separately.
//!
//! # Failure model
//!
//! Decryption has one failure, [`CryptoError::Integrity`]. Wrong key, wrong
//!  passphrase, wrong nonce and modified ciphertext are all reported the same way.

mod envelope;
mod passphrase;
mod password;
mod secret;

pub use envelope::{decrypt, decrypt_with_passphrase, encrypt, encrypt_with_passphrase, Envelope};
pub use passphrase::{
    derive_key_from_passphrase, open_with_passphrase, seal_with_passphrase, Salt,
    PBKDF2_ITERATIONS, SALT_SIZE,
};
pub use password::{generate_random_password, DEFAULT_PASSWORD_LENGTH, PASSWORD_CHARSET};
pub use secret::{Sealed, Secret, NONCE_SIZE, SECRET_SIZE, TAG_SIZE};

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Authentication failed. Deliberately carries no detail.
    #[error("integrity check failed")]
    Integrity,
    #[error("encryption failed")]
    Encrypt,
    #[error("system random number generator failed: {0}")]
    Rng(String),
    #[error("invalid {what} length, expected {expected}, got {actual}")]
    InvalidLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}
