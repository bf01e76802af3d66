//! Access gate
//!
//! Two cheap checks that run before anything touches storage:
//! - secret identifiers must be canonical UUID v4 strings
//! - privileged writes must present the admin bearer token, compared in constant time

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use uuid::{Uuid, Variant};

/// Namespace prefix for secret records in the key-value store
pub const SECRET_KEY_PREFIX: &str = "secret:";
/// Scheme expected in the `Authorization` header of privileged writes
pub const BEARER_PREFIX: &str = "Bearer ";

const UUID_STR_LEN: usize = 36;

/// Identifier of a stored secret: a random UUID v4.
///
/// Carries no information about content, key or policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SecretId(Uuid);

impl SecretId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Accept only the canonical hyphenated v4 form (any hex case).
    pub fn parse(s: &str) -> Option<Self> {
        if s.len() != UUID_STR_LEN {
            return None;
        }
        let uuid = Uuid::try_parse(s).ok()?;
        if uuid.get_version_num() != 4 || uuid.get_variant() != Variant::RFC4122 {
            return None;
        }
        Some(Self(uuid))
    }

    /// Key of this secret's record in the store
    pub fn storage_key(&self) -> String {
        format!("{}{}", SECRET_KEY_PREFIX, self)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for SecretId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("malformed secret id")]
pub struct InvalidId;

impl FromStr for SecretId {
    type Err = InvalidId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or(InvalidId)
    }
}

impl TryFrom<String> for SecretId {
    type Error = InvalidId;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<SecretId> for String {
    fn from(id: SecretId) -> Self {
        id.to_string()
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("Unauthorized")]
pub struct Unauthorized;

/// OR together the XOR of every byte pair. Consumes the whole iterator no matter
///  where the first difference is.
fn accumulate_diff<I>(pairs: I) -> u8
where
    I: IntoIterator<Item = (u8, u8)>,
{
    pairs
        .into_iter()
        .fold(0u8, |acc, (expected, actual)| acc | (expected ^ actual))
}

/// Compare two byte strings without an early exit on the first mismatch.
///
/// A length mismatch returns `false` immediately; the expected length is not
///  treated as secret.
pub fn constant_time_eq(expected: &[u8], actual: &[u8]) -> bool {
    if expected.len() != actual.len() {
        return false;
    }
    let diff = accumulate_diff(expected.iter().copied().zip(actual.iter().copied()));
    bool::from(diff.ct_eq(&0u8))
}

/// Guards privileged writes with a bearer token
#[derive(Clone)]
pub struct AdminGate {
    /// `Bearer {secret}`, or `None` when no admin secret is configured
    expected: Option<Vec<u8>>,
}

impl fmt::Debug for AdminGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminGate")
            .field("configured", &self.expected.is_some())
            .finish()
    }
}

impl AdminGate {
    /// An empty secret counts as unconfigured.
    pub fn new(admin_secret: Option<&str>) -> Self {
        let expected = admin_secret
            .filter(|s| !s.is_empty())
            .map(|s| format!("{}{}", BEARER_PREFIX, s).into_bytes());
        Self { expected }
    }

    pub fn is_configured(&self) -> bool {
        self.expected.is_some()
    }

    /// Check a raw `Authorization` header value
    pub fn authorize(&self, authorization: Option<&str>) -> Result<(), Unauthorized> {
        let Some(expected) = &self.expected else {
            return Err(Unauthorized);
        };
        let actual = authorization.unwrap_or_default().as_bytes();
        if constant_time_eq(expected, actual) {
            Ok(())
        } else {
            Err(Unauthorized)
        }
    }
}
