//! # AssetShare Client
//!
//! Client-side API and session layer for the AssetShare rental marketplace.
//!
//! ## Architecture
//! - `session`: the persisted bearer token and user id, expiry checks and
//!   change notifications
//! - `api`: authenticated requests against the REST backend, error
//!   normalization and the resource-oriented operations
//! - `auth`: token claims decoding and the session validity model
//! - `config`: environment configuration
//!
//! ## Usage
//! ```no_run
//! use assetshare_client::api::{ApiClient, resource};
//! use assetshare_client::session::SessionStore;
//! use serde_json::json;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() {
//! let client = ApiClient::new("https://api.example/api", SessionStore::in_memory());
//! let cancel = CancellationToken::new();
//!
//! if client.login(json!({ "email": "ana@example.com", "password": "..." }), &cancel).await.is_ok() {
//!     match client.get(resource::LISTING, 5, &cancel).await {
//!         Ok(listing) => println!("{listing}"),
//!         Err(error) => eprintln!("{}", error.describe("GET /Listing/5")),
//!     }
//! }
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod session;

#[cfg(test)]
mod test_support;
