//! # Authentication Module
//!
//! Client-side view of the bearer credential: claims decoding and expiry
//! evaluation for stored tokens, plus the session validity model the UI
//! branches on.

pub mod jwt;
pub mod models;

pub use jwt::{Claims, EXPIRY_SKEW_SECS, decode_claims, is_token_expired, is_token_expired_at};
pub use models::{SessionState, SessionValidation, parse_user_id, parse_user_id_str};
