//! # API Module
//!
//! Gateway to the AssetShare REST backend. Every operation returns a
//! [`RequestResult`]; nothing raised inside the gateway reaches the caller.
//!
//! - `client`: request primitive, headers, response parsing
//! - `error`: error normalization and the `{data}` / `{error}` envelope
//! - `resources`: generic CRUD and the legacy asset endpoints
//! - `auth`: register, login, logout, current user, session validation
//! - `reviews`: review reads keyed by listing

pub mod auth;
pub mod client;
pub mod error;
pub mod resources;
pub mod reviews;

pub use client::{ApiClient, RequestOptions};
pub use error::{ApiError, Envelope, RequestError, RequestResult};
pub use resources::resource;
