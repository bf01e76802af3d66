//! Content encryption using AES-256-GCM
//!
//! Every shared secret is sealed under its own freshly generated [`Secret`]. The key
//!  never leaves the client: it travels to the reader in a link fragment, while the
//!  server only ever stores the [`Sealed`] ciphertext and nonce.

use std::fmt;
use std::ops::Deref;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key};
use zeroize::Zeroize;

use super::CryptoError;

/// Size of an AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;
/// Size of an AES-256-GCM key in bytes (256 bits)
pub const SECRET_SIZE: usize = 32;
/// Size of the AES-GCM authentication tag appended to every ciphertext
pub const TAG_SIZE: usize = 16;

/// Fill a buffer from the operating system CSPRNG
pub(crate) fn random_bytes<const N: usize>() -> Result<[u8; N], CryptoError> {
    let mut buff = [0u8; N];
    getrandom::getrandom(&mut buff).map_err(|e| CryptoError::Rng(e.to_string()))?;
    Ok(buff)
}

/// A 256-bit symmetric key for AES-256-GCM
///
/// Keys are generated per secret and never reused. The bytes are wiped when the
///  key is dropped.
///
/// ```ignore
/// let secret = Secret::generate()?;
/// let sealed = secret.seal(b"hunter2")?;
/// let plaintext = secret.open(&sealed)?;
/// assert_eq!(plaintext, b"hunter2");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Secret([u8; SECRET_SIZE]);

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl Deref for Secret {
    type Target = [u8; SECRET_SIZE];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<[u8; SECRET_SIZE]> for Secret {
    fn from(bytes: [u8; SECRET_SIZE]) -> Self {
        Secret(bytes)
    }
}

impl Secret {
    /// Generate a new random key using the system CSPRNG
    pub fn generate() -> Result<Self, CryptoError> {
        Ok(Self(random_bytes()?))
    }

    /// Create a key from a byte slice
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidLength`] unless the slice is exactly
    ///  `SECRET_SIZE` bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, CryptoError> {
        let bytes: [u8; SECRET_SIZE] = data.try_into().map_err(|_| CryptoError::InvalidLength {
            what: "key",
            expected: SECRET_SIZE,
            actual: data.len(),
        })?;
        Ok(bytes.into())
    }

    pub fn bytes(&self) -> &[u8] {
        self.0.as_ref()
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(self.bytes()))
    }

    /// Encrypt `plaintext` under a fresh random nonce.
    ///
    /// The returned ciphertext carries the 16 byte authentication tag.
    pub fn seal(&self, plaintext: &[u8]) -> Result<Sealed, CryptoError> {
        let nonce: [u8; NONCE_SIZE] = random_bytes()?;
        let ciphertext = self
            .cipher()
            .encrypt(aes_gcm::Nonce::from_slice(&nonce), plaintext)
            .map_err(|_| CryptoError::Encrypt)?;

        Ok(Sealed { ciphertext, nonce })
    }

    /// Decrypt and authenticate a sealed payload.
    ///
    /// Any authentication failure (wrong key, wrong nonce, modified ciphertext)
    ///  yields [`CryptoError::Integrity`] and nothing else.
    pub fn open(&self, sealed: &Sealed) -> Result<Vec<u8>, CryptoError> {
        self.cipher()
            .decrypt(
                aes_gcm::Nonce::from_slice(&sealed.nonce),
                sealed.ciphertext.as_ref(),
            )
            .map_err(|_| CryptoError::Integrity)
    }
}

/// Raw AEAD output: ciphertext (with tag) and the nonce it was sealed under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    pub ciphertext: Vec<u8>,
    pub nonce: [u8; NONCE_SIZE],
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_seal_open() {
        let secret = Secret::generate().unwrap();
        let data = b"hello world, this is a test message for encryption";

        let sealed = secret.seal(data).unwrap();
        assert_eq!(sealed.ciphertext.len(), data.len() + TAG_SIZE);

        let opened = secret.open(&sealed).unwrap();
        assert_eq!(data.as_slice(), opened.as_slice());
    }

    #[test]
    fn test_fresh_nonce_per_seal() {
        let secret = Secret::generate().unwrap();
        let a = secret.seal(b"same").unwrap();
        let b = secret.seal(b"same").unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_fresh_key_per_generate() {
        let a = Secret::generate().unwrap();
        let b = Secret::generate().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_secret_size_validation() {
        assert!(Secret::from_slice(&[1u8; 16]).is_err());
        assert!(Secret::from_slice(&[1u8; 64]).is_err());
        assert!(Secret::from_slice(&[1u8; SECRET_SIZE]).is_ok());
    }

    #[test]
    fn test_wrong_key_is_integrity_error() {
        let secret = Secret::generate().unwrap();
        let other = Secret::generate().unwrap();
        let sealed = secret.seal(b"for your eyes only").unwrap();

        assert!(matches!(other.open(&sealed), Err(CryptoError::Integrity)));
    }

    #[test]
    fn test_every_bit_flip_is_detected() {
        let secret = Secret::generate().unwrap();
        let sealed = secret.seal(b"tamper me").unwrap();

        for i in 0..sealed.ciphertext.len() * 8 {
            let mut tampered = sealed.clone();
            tampered.ciphertext[i / 8] ^= 1 << (i % 8);
            assert!(matches!(secret.open(&tampered), Err(CryptoError::Integrity)));
        }

        for i in 0..NONCE_SIZE * 8 {
            let mut tampered = sealed.clone();
            tampered.nonce[i / 8] ^= 1 << (i % 8);
            assert!(matches!(secret.open(&tampered), Err(CryptoError::Integrity)));
        }
    }

    #[test]
    fn test_truncated_ciphertext() {
        let secret = Secret::generate().unwrap();
        let mut sealed = secret.seal(b"abc").unwrap();
        sealed.ciphertext.truncate(TAG_SIZE - 1);
        assert!(matches!(secret.open(&sealed), Err(CryptoError::Integrity)));
    }

    #[test]
    fn test_empty_plaintext() {
        let secret = Secret::generate().unwrap();
        let sealed = secret.seal(b"").unwrap();
        assert_eq!(sealed.ciphertext.len(), TAG_SIZE);
        assert!(secret.open(&sealed).unwrap().is_empty());
    }

    #[test]
    fn test_debug_is_redacted() {
        let secret = Secret::from([7u8; SECRET_SIZE]);
        assert_eq!(format!("{:?}", secret), "Secret(<redacted>)");
    }
}
