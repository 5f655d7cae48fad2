//! Bearer Token Claims
//!
//! Reads the claims segment of a stored bearer token and evaluates its expiry.
//! Signatures are never checked here: the backend owns verification, the client
//! only looks at `exp` to decide whether a stored credential is still usable.

use base64::{
    Engine, alphabet,
    engine::{GeneralPurpose, GeneralPurposeConfig},
};
use chrono::Utc;
use serde_json::{Map, Value};

/// Tokens are treated as expired this many seconds before their literal `exp`
pub const EXPIRY_SKEW_SECS: i64 = 30;

/// Standard alphabet, accepting non-zero trailing bits in the final character
const CLAIMS_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Decoded claims of a bearer token, kept as an untyped JSON object
pub type Claims = Map<String, Value>;

/// Decode the claims (second) segment of a dot-separated token.
///
/// The segment is base64url without padding; it is translated to the standard
/// alphabet, padded to a multiple of four and parsed as JSON. Any failure along
/// the way yields `None` instead of an error.
pub fn decode_claims(token: &str) -> Option<Claims> {
    let mut segments = token.split('.');
    segments.next()?;
    let payload = segments.next()?;

    let mut standard: String = payload
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    let padding = (4 - standard.len() % 4) % 4;
    standard.extend(std::iter::repeat_n('=', padding));

    let bytes = CLAIMS_ENGINE.decode(standard.as_bytes()).ok()?;
    match serde_json::from_slice::<Value>(&bytes).ok()? {
        Value::Object(claims) => Some(claims),
        _ => None,
    }
}

/// The `exp` claim in seconds since the epoch, when present and numeric
pub fn expires_at(claims: &Claims) -> Option<f64> {
    claims.get("exp").and_then(Value::as_f64)
}

/// Whether `token` is expired at `now` (seconds since the epoch).
///
/// Undecodable tokens and tokens without a numeric `exp` are reported as
/// not expired.
pub fn is_token_expired_at(token: &str, now: i64) -> bool {
    match decode_claims(token).as_ref().and_then(expires_at) {
        Some(exp) => now as f64 >= exp - EXPIRY_SKEW_SECS as f64,
        None => false,
    }
}

/// Whether `token` is expired right now
pub fn is_token_expired(token: &str) -> bool {
    is_token_expired_at(token, Utc::now().timestamp())
}
