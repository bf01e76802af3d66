use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::crypto::Envelope;
use crate::transport;

/// Longest accepted ciphertext, in base64url characters
pub const MAX_CIPHERTEXT_LENGTH: usize = 20_000;
/// A 96-bit nonce is always 16 unpadded base64url characters
pub const NONCE_LENGTH: usize = 16;
pub const MIN_VIEW_LIMIT: u32 = 1;
pub const MAX_VIEW_LIMIT: u32 = 10;
/// Five minutes
pub const MIN_TTL_SECONDS: u64 = 300;
/// Thirty days
pub const MAX_TTL_SECONDS: u64 = 2_592_000;

/// Why a create request was refused. Every variant names the offending field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("request body must be a JSON object")]
    NotAnObject,
    #[error("{field} is required")]
    Missing { field: &'static str },
    #[error("{field} must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("ciphertext must not be empty")]
    EmptyCiphertext,
    #[error("ciphertext must be at most 20000 characters")]
    CiphertextTooLong,
    #[error("{field} must be base64url")]
    NotBase64Url { field: &'static str },
    #[error("nonce must be exactly 16 base64url characters")]
    NonceLength,
    #[error("viewLimit must be an integer between 1 and 10")]
    ViewLimitRange,
    #[error("ttlSeconds must be an integer between 300 and 2592000")]
    TtlRange,
}

impl ValidationError {
    /// The request field the error is about
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::NotAnObject => "body",
            ValidationError::Missing { field }
            | ValidationError::WrongType { field, .. }
            | ValidationError::NotBase64Url { field } => field,
            ValidationError::EmptyCiphertext | ValidationError::CiphertextTooLong => {
                "ciphertext"
            }
            ValidationError::NonceLength => "nonce",
            ValidationError::ViewLimitRange => "viewLimit",
            ValidationError::TtlRange => "ttlSeconds",
        }
    }
}

/// A request to store a new secret
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSecret {
    pub ciphertext: String,
    pub nonce: String,
    pub view_limit: u32,
    pub ttl_seconds: u64,
}

impl NewSecret {
    pub fn new(envelope: Envelope, view_limit: u32, ttl_seconds: u64) -> Self {
        Self {
            ciphertext: envelope.ciphertext,
            nonce: envelope.nonce,
            view_limit,
            ttl_seconds,
        }
    }

    /// Parse and validate an untrusted JSON body.
    ///
    /// Unknown keys are ignored. Numbers must be integral (`3` and `3.0` both pass,
    ///  `"3"` and `3.5` do not).
    pub fn from_value(value: &Value) -> Result<Self, ValidationError> {
        let body = value.as_object().ok_or(ValidationError::NotAnObject)?;

        let new = Self {
            ciphertext: string_field(body, "ciphertext")?,
            nonce: string_field(body, "nonce")?,
            view_limit: integer_field(body, "viewLimit")?
                .and_then(|n| u32::try_from(n).ok())
                .ok_or(ValidationError::ViewLimitRange)?,
            ttl_seconds: integer_field(body, "ttlSeconds")?
                .and_then(|n| u64::try_from(n).ok())
                .ok_or(ValidationError::TtlRange)?,
        };
        new.validate()?;
        Ok(new)
    }

    /// Check every field against its bounds
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.ciphertext.is_empty() {
            return Err(ValidationError::EmptyCiphertext);
        }
        if self.ciphertext.len() > MAX_CIPHERTEXT_LENGTH {
            return Err(ValidationError::CiphertextTooLong);
        }
        if transport::decode(&self.ciphertext).is_err() {
            return Err(ValidationError::NotBase64Url {
                field: "ciphertext",
            });
        }

        if self.nonce.len() != NONCE_LENGTH {
            return Err(ValidationError::NonceLength);
        }
        if transport::decode(&self.nonce).is_err() {
            return Err(ValidationError::NotBase64Url { field: "nonce" });
        }

        if !(MIN_VIEW_LIMIT..=MAX_VIEW_LIMIT).contains(&self.view_limit) {
            return Err(ValidationError::ViewLimitRange);
        }
        if !(MIN_TTL_SECONDS..=MAX_TTL_SECONDS).contains(&self.ttl_seconds) {
            return Err(ValidationError::TtlRange);
        }
        Ok(())
    }
}

fn string_field(body: &Map<String, Value>, field: &'static str) -> Result<String, ValidationError> {
    match body.get(field) {
        None | Some(Value::Null) => Err(ValidationError::Missing { field }),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ValidationError::WrongType {
            field,
            expected: "a string",
        }),
    }
}

/// `Ok(None)` for a number that is not an integer, so the caller reports its range
fn integer_field(
    body: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<i64>, ValidationError> {
    match body.get(field) {
        None | Some(Value::Null) => Err(ValidationError::Missing { field }),
        Some(Value::Number(n)) => Ok(n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        })),
        Some(_) => Err(ValidationError::WrongType {
            field,
            expected: "an integer",
        }),
    }
}
