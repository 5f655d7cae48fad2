//! Authentication Models
//!
//! Session validity as seen by the client, and the helpers that read
//! credentials out of untyped auth responses.

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::api::RequestError;

/// Outcome of probing the stored session against the backend
#[derive(Debug, Clone, PartialEq)]
pub enum SessionValidation {
    /// The probe request succeeded
    Valid,
    /// No token is stored; nothing was sent
    Missing,
    /// The stored token failed local expiry evaluation and was cleared
    Expired,
    /// The probe request failed
    Invalid(RequestError),
}

impl SessionValidation {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Machine-readable reason for a failed validation
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            Self::Valid => None,
            Self::Missing => Some("missing"),
            Self::Expired => Some("expired"),
            Self::Invalid(_) => Some("invalid"),
        }
    }

    pub fn error(&self) -> Option<&RequestError> {
        match self {
            Self::Invalid(error) => Some(error),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct ValidationRepr<'a> {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a RequestError>,
}

/// Serializes as `{"ok":true}` or `{"ok":false,"reason":…,"error":…}`
impl Serialize for SessionValidation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ValidationRepr {
            ok: self.is_ok(),
            reason: self.reason(),
            error: self.error(),
        }
        .serialize(serializer)
    }
}

/// Session validity, re-derived on demand from the store and an optional probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No token stored
    Anonymous,
    /// Token stored, not known to be expired, not confirmed by the backend
    Unverified,
    /// Backend accepted the token
    Verified,
    /// Token expired locally or rejected with 401
    Invalid,
}

impl From<&SessionValidation> for SessionState {
    fn from(validation: &SessionValidation) -> Self {
        match validation {
            SessionValidation::Valid => Self::Verified,
            SessionValidation::Missing => Self::Anonymous,
            SessionValidation::Expired => Self::Invalid,
            SessionValidation::Invalid(error) if error.status == Some(401) => Self::Invalid,
            // Transport or server failures say nothing about the credential.
            SessionValidation::Invalid(_) => Self::Unverified,
        }
    }
}

/// Read a user id from an untyped value.
///
/// Accepts integers, integral floats and numeric strings (surrounding
/// whitespace ignored). Everything else, including empty strings, is `None`.
pub fn parse_user_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().and_then(integral)),
        Value::String(text) => parse_user_id_str(text),
        _ => None,
    }
}

/// String form of [`parse_user_id`], used for the persisted representation
pub fn parse_user_id_str(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.parse::<i64>()
        .ok()
        .or_else(|| text.parse::<f64>().ok().and_then(integral))
}

fn integral(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}
