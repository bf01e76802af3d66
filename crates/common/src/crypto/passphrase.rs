//! Passphrase mode
//!
//! A key is derived with PBKDF2-HMAC-SHA256 from a passphrase and a random salt. Only
//!  the salt travels in the link; the passphrase is communicated separately, so both
//!  the link and the passphrase are needed to decrypt.

use std::ops::Deref;

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

use super::secret::{random_bytes, Sealed, Secret, SECRET_SIZE};
use super::CryptoError;

/// PBKDF2 iteration count. Part of the protocol: changing it breaks every
///  outstanding passphrase link.
pub const PBKDF2_ITERATIONS: u32 = 100_000;
/// Size of the PBKDF2 salt in bytes (128 bits)
pub const SALT_SIZE: usize = 16;

/// Random PBKDF2 salt carried in the link fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Salt([u8; SALT_SIZE]);

impl Deref for Salt {
    type Target = [u8; SALT_SIZE];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<[u8; SALT_SIZE]> for Salt {
    fn from(bytes: [u8; SALT_SIZE]) -> Self {
        Salt(bytes)
    }
}

impl Salt {
    pub fn generate() -> Result<Self, CryptoError> {
        Ok(Self(random_bytes()?))
    }

    pub fn from_slice(data: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; SALT_SIZE] = data.try_into().map_err(|_| CryptoError::InvalidLength {
            what: "salt",
            expected: SALT_SIZE,
            actual: data.len(),
        })?;
        Ok(bytes.into())
    }

    pub fn bytes(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl Secret {
    /// Re-derive the key for `passphrase` under a known salt
    pub fn derive(passphrase: &str, salt: &Salt) -> Self {
        let mut key = [0u8; SECRET_SIZE];
        pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt.bytes(), PBKDF2_ITERATIONS, &mut key);
        let secret = Secret::from(key);
        zeroize::Zeroize::zeroize(&mut key);
        secret
    }
}

/// Derive a fresh key from `passphrase` under a newly generated salt
pub fn derive_key_from_passphrase(passphrase: &str) -> Result<(Secret, Salt), CryptoError> {
    let salt = Salt::generate()?;
    Ok((Secret::derive(passphrase, &salt), salt))
}

/// Seal `plaintext` under a key derived from `passphrase`
pub fn seal_with_passphrase(
    plaintext: &[u8],
    passphrase: &str,
) -> Result<(Sealed, Salt), CryptoError> {
    let (key, salt) = derive_key_from_passphrase(passphrase)?;
    Ok((key.seal(plaintext)?, salt))
}

/// Open a payload sealed in passphrase mode.
///
/// A wrong passphrase is reported exactly like a corrupted ciphertext.
pub fn open_with_passphrase(
    sealed: &Sealed,
    salt: &Salt,
    passphrase: &str,
) -> Result<Vec<u8>, CryptoError> {
    Secret::derive(passphrase, salt).open(sealed)
}
