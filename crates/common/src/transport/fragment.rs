use std::fmt;
use std::str::FromStr;

use super::{decode, encode, TransportError};
use crate::crypto::{Salt, Secret};

/// Marks a fragment that carries a PBKDF2 salt instead of a key.
///
/// `:` never appears in base64url, so the marker cannot collide with a raw key.
pub const PASSPHRASE_MARKER: &str = "p:";

/// Key material carried in a share link fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyFragment {
    /// Random mode: the AES key itself
    Key(Secret),
    /// Passphrase mode: the salt; the passphrase is shared separately
    Passphrase(Salt),
}

impl KeyFragment {
    pub fn requires_passphrase(&self) -> bool {
        matches!(self, KeyFragment::Passphrase(_))
    }
}

impl fmt::Display for KeyFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyFragment::Key(key) => f.write_str(&encode(key.bytes())),
            KeyFragment::Passphrase(salt) => {
                write!(f, "{}{}", PASSPHRASE_MARKER, encode(salt.bytes()))
            }
        }
    }
}

impl FromStr for KeyFragment {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix('#').unwrap_or(s);
        match s.strip_prefix(PASSPHRASE_MARKER) {
            Some(salt) => Ok(KeyFragment::Passphrase(Salt::from_slice(&decode(salt)?)?)),
            None => Ok(KeyFragment::Key(Secret::from_slice(&decode(s)?)?)),
        }
    }
}
