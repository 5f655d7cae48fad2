//! Review reads keyed by listing.

use std::fmt::Display;

use tokio_util::sync::CancellationToken;

use crate::api::client::{ApiClient, RequestOptions};
use crate::api::error::RequestResult;

impl ApiClient {
    /// `GET /Review/Listing/<listing_id>`
    pub async fn reviews_for_listing(
        &self,
        listing_id: impl Display,
        cancel: &CancellationToken,
    ) -> RequestResult {
        self.call(
            &format!("/Review/Listing/{listing_id}"),
            RequestOptions::get().with_cancel(cancel),
        )
        .await
    }

    /// `GET /Review/Rating/<listing_id>`
    pub async fn average_rating(
        &self,
        listing_id: impl Display,
        cancel: &CancellationToken,
    ) -> RequestResult {
        self.call(
            &format!("/Review/Rating/{listing_id}"),
            RequestOptions::get().with_cancel(cancel),
        )
        .await
    }
}
