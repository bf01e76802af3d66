//! Transport-encoded AEAD payloads
//!
//! An [`Envelope`] is the only thing a server ever sees: base64url ciphertext and
//!  nonce. The key (or the passphrase salt) travels out of band.

use serde::{Deserialize, Serialize};

use super::passphrase::{open_with_passphrase, seal_with_passphrase, Salt};
use super::secret::{Sealed, Secret, NONCE_SIZE};
use super::CryptoError;
use crate::transport;

/// Ciphertext and nonce as they are uploaded to and returned by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub ciphertext: String,
    pub nonce: String,
}

impl From<&Sealed> for Envelope {
    fn from(sealed: &Sealed) -> Self {
        Self {
            ciphertext: transport::encode(&sealed.ciphertext),
            nonce: transport::encode(&sealed.nonce),
        }
    }
}

impl Envelope {
    /// Decode back into raw AEAD output.
    ///
    /// Undecodable input is an integrity failure: a reader cannot tell a mangled
    ///  envelope from a forged one, and must not try to.
    pub fn to_sealed(&self) -> Result<Sealed, CryptoError> {
        let ciphertext =
            transport::decode(&self.ciphertext).map_err(|_| CryptoError::Integrity)?;
        let nonce: [u8; NONCE_SIZE] = transport::decode(&self.nonce)
            .map_err(|_| CryptoError::Integrity)?
            .try_into()
            .map_err(|_| CryptoError::Integrity)?;
        Ok(Sealed { ciphertext, nonce })
    }
}

/// Encrypt `plaintext` under a freshly generated key.
pub fn encrypt(plaintext: &str) -> Result<(Envelope, Secret), CryptoError> {
    let key = Secret::generate()?;
    let sealed = key.seal(plaintext.as_bytes())?;
    Ok((Envelope::from(&sealed), key))
}

pub fn decrypt(envelope: &Envelope, key: &Secret) -> Result<String, CryptoError> {
    let plaintext = key.open(&envelope.to_sealed()?)?;
    String::from_utf8(plaintext).map_err(|_| CryptoError::Integrity)
}

/// Encrypt `plaintext` under a key derived from `passphrase`.
pub fn encrypt_with_passphrase(
    plaintext: &str,
    passphrase: &str,
) -> Result<(Envelope, Salt), CryptoError> {
    let (sealed, salt) = seal_with_passphrase(plaintext.as_bytes(), passphrase)?;
    Ok((Envelope::from(&sealed), salt))
}

pub fn decrypt_with_passphrase(
    envelope: &Envelope,
    salt: &Salt,
    passphrase: &str,
) -> Result<String, CryptoError> {
    let plaintext = open_with_passphrase(&envelope.to_sealed()?, salt, passphrase)?;
    String::from_utf8(plaintext).map_err(|_| CryptoError::Integrity)
}
