//! Generic CRUD over named backend collections, plus the legacy `/assets`
//! endpoints.
//!
//! Payloads pass through verbatim; the backend owns every schema.

use std::fmt::Display;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::api::client::{ApiClient, RequestOptions};
use crate::api::error::RequestResult;

/// Known collection names. Paths are case-sensitive.
pub mod resource {
    pub const USER: &str = "User";
    pub const LISTING: &str = "Listing";
    pub const MACHINE: &str = "Machine";
    pub const BOOKING: &str = "Booking";
    pub const REVIEW: &str = "Review";
}

const ASSETS_PATH: &str = "/assets";

impl ApiClient {
    /// `GET /<resource>`
    pub async fn list(&self, resource: &str, cancel: &CancellationToken) -> RequestResult {
        self.call(&format!("/{resource}"), RequestOptions::get().with_cancel(cancel))
            .await
    }

    /// `GET /<resource>/<id>`
    pub async fn get(
        &self,
        resource: &str,
        id: impl Display,
        cancel: &CancellationToken,
    ) -> RequestResult {
        self.call(
            &format!("/{resource}/{id}"),
            RequestOptions::get().with_cancel(cancel),
        )
        .await
    }

    /// `POST /<resource>`
    pub async fn create(
        &self,
        resource: &str,
        payload: Value,
        cancel: &CancellationToken,
    ) -> RequestResult {
        self.call(
            &format!("/{resource}"),
            RequestOptions::post().with_body(payload).with_cancel(cancel),
        )
        .await
    }

    /// `PUT /<resource>/<id>`
    pub async fn update(
        &self,
        resource: &str,
        id: impl Display,
        payload: Value,
        cancel: &CancellationToken,
    ) -> RequestResult {
        self.call(
            &format!("/{resource}/{id}"),
            RequestOptions::put().with_body(payload).with_cancel(cancel),
        )
        .await
    }

    /// `DELETE /<resource>/<id>`
    pub async fn delete(
        &self,
        resource: &str,
        id: impl Display,
        cancel: &CancellationToken,
    ) -> RequestResult {
        self.call(
            &format!("/{resource}/{id}"),
            RequestOptions::delete().with_cancel(cancel),
        )
        .await
    }

    pub async fn list_assets(&self, cancel: &CancellationToken) -> RequestResult {
        self.call(ASSETS_PATH, RequestOptions::get().with_cancel(cancel))
            .await
    }

    pub async fn get_asset(&self, id: impl Display, cancel: &CancellationToken) -> RequestResult {
        self.call(
            &format!("{ASSETS_PATH}/{id}"),
            RequestOptions::get().with_cancel(cancel),
        )
        .await
    }

    pub async fn create_asset(&self, payload: Value, cancel: &CancellationToken) -> RequestResult {
        self.call(
            ASSETS_PATH,
            RequestOptions::post().with_body(payload).with_cancel(cancel),
        )
        .await
    }
}
