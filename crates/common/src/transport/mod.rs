//! Key transport encoding
//!
//! Keys and salts travel to the reader in the fragment of a share link
//!  (`{base}/view/{id}#{fragment}`). Browsers never send the fragment to a server,
//!  which keeps the server key-blind.
//!
//! All binary values use unpadded base64url, which needs no further URL escaping
//!  and decodes back to exactly the bytes that were encoded.

mod fragment;
mod link;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

pub use fragment::{KeyFragment, PASSPHRASE_MARKER};
pub use link::{ShareLink, VIEW_PATH};

/// Encode bytes as unpadded base64url
pub fn encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode unpadded base64url. Padding and non-canonical trailing bits are rejected,
///  so every accepted string has exactly one preimage.
pub fn decode(encoded: &str) -> Result<Vec<u8>, TransportError> {
    Ok(URL_SAFE_NO_PAD.decode(encoded)?)
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid base64url encoding: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("invalid key material: {0}")]
    KeyMaterial(#[from] crate::crypto::CryptoError),
    #[error("share link has no key fragment")]
    MissingFragment,
    #[error("share link does not point at a secret: {0}")]
    InvalidLink(String),
    #[error("invalid share link url: {0}")]
    Url(#[from] url::ParseError),
}

#[cfg(test)]
mod test {
    use super::*;

    fn is_url_safe(s: &str) -> bool {
        s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    }

    #[test]
    fn test_roundtrip_all_lengths() {
        // every length mod 3 and every byte value
        let bytes: Vec<u8> = (0..=255u8).cycle().take(1024).collect();
        for len in 0..64 {
            let encoded = encode(&bytes[..len]);
            assert!(is_url_safe(&encoded));
            assert_eq!(decode(&encoded).unwrap(), &bytes[..len]);
        }
        let encoded = encode(&bytes);
        assert_eq!(decode(&encoded).unwrap(), bytes);
    }

    #[test]
    fn test_rejects_padding_and_foreign_alphabet() {
        assert!(decode("YQ==").is_err());
        assert!(decode("a+b/").is_err());
        assert!(decode("YQ").is_ok());
    }

    #[test]
    fn test_rejects_non_canonical_trailing_bits() {
        // "YQ" is canonical for [0x61]; "YR" sets trailing bits
        assert!(decode("YR").is_err());
    }
}
