//! HTTP client for the AssetShare backend.
//!
//! [`ApiClient::send`] is the single place network I/O happens. It builds the
//! URL from the configured base, attaches JSON and bearer headers, races the
//! exchange against the caller's cancellation token and turns non-2xx
//! responses into [`ApiError::Http`].

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::error::{ApiError, HTTP_FAILURE_MESSAGE, RequestError, RequestResult};
use crate::config::Config;
use crate::session::SessionStore;

/// Per-request settings for [`ApiClient::send`]
#[derive(Debug, Clone)]
pub struct RequestOptions {
    method: Method,
    body: Option<Value>,
    headers: HeaderMap,
    cancel: Option<CancellationToken>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::new(Method::GET)
    }
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            body: None,
            headers: HeaderMap::new(),
            cancel: None,
        }
    }

    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    pub fn put() -> Self {
        Self::new(Method::PUT)
    }

    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    /// JSON body; `null` sends no body at all
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Extra header, applied after the automatic ones so it can override them
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_cancel(mut self, cancel: &CancellationToken) -> Self {
        self.cancel = Some(cancel.clone());
        self
    }
}

/// Gateway to the backend REST API
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: SessionStore,
}

impl ApiClient {
    pub fn new(base_url: &str, session: SessionStore) -> Self {
        Self::with_http_client(Client::new(), base_url, session)
    }

    pub fn with_http_client(http: Client, base_url: &str, session: SessionStore) -> Self {
        let base_url = base_url.strip_suffix('/').unwrap_or(base_url).to_string();
        Self {
            http,
            base_url,
            session,
        }
    }

    /// Client for the configured backend, with the session persisted to the
    /// configured file
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.api_base_url, SessionStore::file(&config.session_file))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Perform one request and return the parsed payload.
    ///
    /// JSON responses are parsed as JSON. Anything else is read as text and
    /// parsed as JSON when possible, otherwise returned as a string. Statuses
    /// outside 200-299 become [`ApiError::Http`] carrying the body's `message`
    /// and the whole body as details. Cancelling the token drops the in-flight
    /// exchange and yields [`ApiError::Aborted`].
    pub async fn send(&self, path: &str, options: RequestOptions) -> Result<Value, ApiError> {
        let RequestOptions {
            method,
            body,
            headers,
            cancel,
        } = options;
        let url = self.url(path);
        debug!(%method, %url, "sending request");

        let result = match cancel {
            Some(cancel) => {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(ApiError::Aborted),
                    result = self.exchange(method.clone(), &url, body, headers) => result,
                }
            }
            None => self.exchange(method.clone(), &url, body, headers).await,
        };

        match &result {
            Ok(_) => {}
            Err(ApiError::Aborted) => debug!(%method, %url, "request cancelled"),
            Err(e) => warn!(%method, %url, error = %e, "request failed"),
        }
        result
    }

    /// [`send`](Self::send) flattened into a [`RequestResult`]
    pub(crate) async fn call(&self, path: &str, options: RequestOptions) -> RequestResult {
        self.send(path, options).await.map_err(RequestError::from)
    }

    fn build_request(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
        extra_headers: HeaderMap,
    ) -> Result<RequestBuilder, ApiError> {
        let body = body.filter(|body| !is_empty_body(body));

        let mut headers = HeaderMap::new();
        if body.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        if let Some(token) = self.session.token() {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        headers.extend(extra_headers);

        let mut request = self.http.request(method, url).headers(headers);
        if let Some(body) = body {
            request = request.body(serde_json::to_vec(&body)?);
        }
        Ok(request)
    }

    async fn exchange(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
        headers: HeaderMap,
    ) -> Result<Value, ApiError> {
        let request = self.build_request(method, url, body, headers)?;
        let response = request.send().await.map_err(ApiError::Transport)?;
        let status = response.status();
        let payload = parse_body(response).await?;

        if !status.is_success() {
            return Err(ApiError::Http {
                status,
                message: failure_message(&payload),
                details: payload,
            });
        }
        Ok(payload)
    }
}

/// Bodies that are sent as no body at all: `null`, `false`, `0` and `""`
fn is_empty_body(body: &Value) -> bool {
    match body {
        Value::Null | Value::Bool(false) => true,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

async fn parse_body(response: Response) -> Result<Value, ApiError> {
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|content_type| content_type.contains("application/json"));

    if is_json {
        let bytes = response.bytes().await.map_err(ApiError::Body)?;
        return Ok(serde_json::from_slice(&bytes)?);
    }

    // Some servers mislabel JSON; fall back to the raw text.
    let text = response.text().await.map_err(ApiError::Body)?;
    Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
}

fn failure_message(payload: &Value) -> String {
    match payload.as_object().and_then(|body| body.get("message")) {
        Some(Value::String(message)) => message.clone(),
        Some(other) => other.to_string(),
        None => HTTP_FAILURE_MESSAGE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::api::error::{ABORTED_MESSAGE, GENERIC_FAILURE_MESSAGE};
    use crate::test_support::{MockBackend, Reply, closed_base_url};
    use serde_json::json;

    #[test]
    fn test_trailing_slash_is_stripped() {
        let client = ApiClient::new("https://api.example/api/", SessionStore::in_memory());

        assert_eq!(client.base_url(), "https://api.example/api");
        assert_eq!(client.url("/Listing/5"), "https://api.example/api/Listing/5");
    }

    #[test]
    fn test_from_config_persists_session_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            api_base_url: "https://api.example/api".to_string(),
            session_file: dir.path().join("session.json"),
        };

        let client = ApiClient::from_config(&config);
        client.session().set_token(Some("T"));

        assert_eq!(client.base_url(), "https://api.example/api");
        assert_eq!(
            SessionStore::file(&config.session_file).token().as_deref(),
            Some("T")
        );
    }

    #[test]
    fn test_failure_message() {
        assert_eq!(failure_message(&json!({ "message": "bad" })), "bad");
        assert_eq!(failure_message(&json!({ "message": 12 })), "12");
        assert_eq!(failure_message(&json!({ "error": "bad" })), HTTP_FAILURE_MESSAGE);
        assert_eq!(failure_message(&json!("message")), HTTP_FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn test_success_returns_parsed_json() {
        let backend = MockBackend::new();
        backend.on("GET", "/api/Listing", Reply::json(200, json!([{ "id": 1 }])));
        let base = backend.start().await;
        let client = ApiClient::new(&base, SessionStore::in_memory());

        let data = client.send("/Listing", RequestOptions::get()).await.unwrap();
        assert_eq!(data, json!([{ "id": 1 }]));
    }

    #[tokio::test]
    async fn test_anonymous_get_sends_no_auth_or_content_type() {
        let backend = MockBackend::new();
        backend.on("GET", "/api/User", Reply::json(200, json!([])));
        let base = backend.start().await;
        let client = ApiClient::new(&base, SessionStore::in_memory());

        client.send("/User", RequestOptions::get()).await.unwrap();

        let request = backend.last_request().unwrap();
        assert_eq!(request.header("authorization"), None);
        assert_eq!(request.header("content-type"), None);
        assert!(request.body.is_empty());
    }

    #[tokio::test]
    async fn test_null_body_is_not_sent() {
        let backend = MockBackend::new();
        backend.on("POST", "/api/Machine", Reply::json(201, json!({ "id": 3 })));
        let base = backend.start().await;
        let client = ApiClient::new(&base, SessionStore::in_memory());

        client
            .send("/Machine", RequestOptions::post().with_body(Value::Null))
            .await
            .unwrap();

        let request = backend.last_request().unwrap();
        assert_eq!(request.header("content-type"), None);
        assert!(request.body.is_empty());
    }

    #[tokio::test]
    async fn test_falsy_bodies_are_not_sent() {
        let backend = MockBackend::new();
        backend.on("POST", "/api/Machine", Reply::json(201, json!({ "id": 3 })));
        let base = backend.start().await;
        let client = ApiClient::new(&base, SessionStore::in_memory());

        for body in [json!(false), json!(0), json!(0.0), json!("")] {
            client
                .send("/Machine", RequestOptions::post().with_body(body.clone()))
                .await
                .unwrap();

            let request = backend.last_request().unwrap();
            assert_eq!(request.header("content-type"), None, "body {body}");
            assert!(request.body.is_empty(), "body {body}");
        }

        for body in [json!(true), json!(1), json!("x"), json!([]), json!({})] {
            client
                .send("/Machine", RequestOptions::post().with_body(body.clone()))
                .await
                .unwrap();

            let request = backend.last_request().unwrap();
            assert_eq!(request.header("content-type"), Some("application/json"), "body {body}");
            assert_eq!(request.json(), Some(body));
        }
    }

    #[tokio::test]
    async fn test_extra_headers_override_defaults() {
        let backend = MockBackend::new();
        backend.on("GET", "/api/User", Reply::json(200, json!([])));
        let base = backend.start().await;
        let store = SessionStore::in_memory();
        store.set_token(Some("stored"));
        let client = ApiClient::new(&base, store);

        let options = RequestOptions::get()
            .with_header(AUTHORIZATION, HeaderValue::from_static("Bearer override"))
            .with_header(HeaderName::from_static("x-trace"), HeaderValue::from_static("abc"));
        client.send("/User", options).await.unwrap();

        let request = backend.last_request().unwrap();
        assert_eq!(request.header("authorization"), Some("Bearer override"));
        assert_eq!(request.header("x-trace"), Some("abc"));
    }

    #[tokio::test]
    async fn test_mislabelled_json_is_parsed() {
        let backend = MockBackend::new();
        backend.on("GET", "/api/Review/Rating/4", Reply::text(200, "4.5"));
        backend.on("GET", "/api/Listing/1", Reply::text(200, r#"{"id":1}"#));
        backend.on("GET", "/api/health", Reply::text(200, "healthy"));
        backend.on("DELETE", "/api/Listing/1", Reply::text(204, ""));
        let base = backend.start().await;
        let client = ApiClient::new(&base, SessionStore::in_memory());

        let rating = client.send("/Review/Rating/4", RequestOptions::get()).await.unwrap();
        let listing = client.send("/Listing/1", RequestOptions::get()).await.unwrap();
        let health = client.send("/health", RequestOptions::get()).await.unwrap();
        let deleted = client.send("/Listing/1", RequestOptions::delete()).await.unwrap();

        assert_eq!(rating, json!(4.5));
        assert_eq!(listing, json!({ "id": 1 }));
        assert_eq!(health, json!("healthy"));
        assert_eq!(deleted, json!(""));
    }

    #[tokio::test]
    async fn test_http_failure_without_message() {
        let backend = MockBackend::new();
        backend.on("GET", "/api/Booking", Reply::text(500, "Internal Server Error"));
        let base = backend.start().await;
        let client = ApiClient::new(&base, SessionStore::in_memory());

        let error = client.call("/Booking", RequestOptions::get()).await.unwrap_err();

        assert_eq!(error.message, HTTP_FAILURE_MESSAGE);
        assert_eq!(error.status, Some(500));
        assert_eq!(error.details, Some(json!("Internal Server Error")));
        assert!(!error.aborted);
    }

    #[tokio::test]
    async fn test_invalid_json_body_is_an_error() {
        let backend = MockBackend::new();
        backend.on(
            "GET",
            "/api/Listing",
            Reply::new(200, Some("application/json; charset=utf-8"), "{ broken"),
        );
        let base = backend.start().await;
        let client = ApiClient::new(&base, SessionStore::in_memory());

        let error = client.call("/Listing", RequestOptions::get()).await.unwrap_err();

        assert_eq!(error.status, None);
        assert!(!error.aborted);
        assert!(!error.message.is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_aborts_in_flight_request() {
        let backend = MockBackend::new();
        backend.on(
            "GET",
            "/api/Listing",
            Reply::json(200, json!([])).delayed(Duration::from_secs(10)),
        );
        let base = backend.start().await;
        let client = ApiClient::new(&base, SessionStore::in_memory());

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let error = client
            .call("/Listing", RequestOptions::get().with_cancel(&cancel))
            .await
            .unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(error.aborted);
        assert_eq!(error.status, None);
        assert_eq!(error.message, ABORTED_MESSAGE);
    }

    #[tokio::test]
    async fn test_cancelled_token_sends_nothing() {
        let backend = MockBackend::new();
        let base = backend.start().await;
        let client = ApiClient::new(&base, SessionStore::in_memory());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = client.send("/Listing", RequestOptions::get().with_cancel(&cancel)).await;

        assert!(matches!(result, Err(ApiError::Aborted)));
        assert!(backend.requests().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let client = ApiClient::new(&closed_base_url().await, SessionStore::in_memory());

        let error = client.call("/Listing", RequestOptions::get()).await.unwrap_err();

        assert_eq!(error.status, None);
        assert!(!error.aborted);
        assert_ne!(error.message, GENERIC_FAILURE_MESSAGE);
        assert!(!error.message.is_empty());
    }
}
