//! Auth endpoints and session validation.
//!
//! Register and login are the only calls that write the session as a side
//! effect of a response. Logout always clears the local session, whether or
//! not the backend could be reached.

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::client::{ApiClient, RequestOptions};
use crate::api::error::RequestResult;
use crate::auth::{SessionState, SessionValidation, is_token_expired, parse_user_id};

const REGISTER_PATH: &str = "/Auth/register";
const LOGIN_PATH: &str = "/Auth/login";
const LOGOUT_PATH: &str = "/Auth/logout";
const ME_PATH: &str = "/Auth/me";

impl ApiClient {
    /// `POST /Auth/register`, storing the returned credentials
    pub async fn register(&self, payload: Value, cancel: &CancellationToken) -> RequestResult {
        self.authenticate(REGISTER_PATH, payload, cancel).await
    }

    /// `POST /Auth/login`, storing the returned credentials
    pub async fn login(&self, payload: Value, cancel: &CancellationToken) -> RequestResult {
        self.authenticate(LOGIN_PATH, payload, cancel).await
    }

    async fn authenticate(
        &self,
        path: &str,
        payload: Value,
        cancel: &CancellationToken,
    ) -> RequestResult {
        let data = self
            .call(path, RequestOptions::post().with_body(payload).with_cancel(cancel))
            .await?;
        self.store_credentials(&data);
        Ok(data)
    }

    fn store_credentials(&self, data: &Value) {
        let Some(body) = data.as_object() else {
            return;
        };

        if let Some(token) = body.get("token") {
            match token.as_str() {
                Some(token) => {
                    self.session().set_token(Some(token));
                    info!("Stored session token");
                }
                None => {
                    self.session().set_token(None);
                    info!("Removed session token: response token is not a string");
                }
            }
        }
        if let Some(user_id) = body.get("userId") {
            let user_id = parse_user_id(user_id);
            self.session().set_user_id(user_id);
            info!(?user_id, "Stored session user id");
        }
    }

    /// `POST /Auth/logout`, then clear the local session unconditionally
    pub async fn logout(&self, cancel: &CancellationToken) -> RequestResult {
        let result = self
            .call(LOGOUT_PATH, RequestOptions::post().with_cancel(cancel))
            .await;
        self.session().clear();
        info!(server_ack = result.is_ok(), "Logged out");
        result
    }

    /// `GET /Auth/me`
    pub async fn current_user(&self, cancel: &CancellationToken) -> RequestResult {
        self.call(ME_PATH, RequestOptions::get().with_cancel(cancel))
            .await
    }

    /// Check the stored session.
    ///
    /// No request is made when there is no token or the token is locally
    /// expired (the latter also clears the session). Otherwise `/Auth/me` is
    /// probed; only a 401 clears the session, other failures leave it intact.
    pub async fn validate_session(&self, cancel: &CancellationToken) -> SessionValidation {
        let Some(token) = self.session().token() else {
            return SessionValidation::Missing;
        };

        if is_token_expired(&token) {
            self.session().clear();
            info!("Stored session expired");
            return SessionValidation::Expired;
        }

        match self.current_user(cancel).await {
            Ok(_) => SessionValidation::Valid,
            Err(error) => {
                if error.status == Some(401) {
                    self.session().clear();
                    info!("Stored session rejected by backend");
                }
                SessionValidation::Invalid(error)
            }
        }
    }

    /// Validate the session and map the outcome onto [`SessionState`]
    pub async fn session_state(&self, cancel: &CancellationToken) -> SessionState {
        SessionState::from(&self.validate_session(cancel).await)
    }
}
