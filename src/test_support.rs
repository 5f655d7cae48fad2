//! Scripted backend for gateway tests.
//!
//! An axum server on an ephemeral port that records every request and answers
//! from a table of canned replies keyed by method and path. Unknown routes get
//! a JSON 404.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::Response;
use chrono::Utc;
use dashmap::DashMap;
use jsonwebtoken::{EncodingKey, Header, encode};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

#[derive(Debug, Clone)]
pub struct Reply {
    status: StatusCode,
    content_type: Option<String>,
    body: String,
    delay: Duration,
}

impl Reply {
    pub fn new(status: u16, content_type: Option<&str>, body: &str) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap(),
            content_type: content_type.map(str::to_string),
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn json(status: u16, body: Value) -> Self {
        Self::new(status, Some("application/json"), &body.to_string())
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self::new(status, Some("text/plain; charset=utf-8"), body)
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    replies: Arc<DashMap<(String, String), Reply>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, method: &str, path: &str, reply: Reply) {
        self.replies
            .insert((method.to_string(), path.to_string()), reply);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests.lock().last().cloned()
    }

    /// Serve in the background and return the base URL (`http://addr/api`)
    pub async fn start(&self) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().fallback(handle).with_state(self.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{addr}/api")
    }
}

async fn handle(
    State(backend): State<MockBackend>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    backend.requests.lock().push(RecordedRequest {
        method: method.to_string(),
        path: path.clone(),
        headers,
        body,
    });

    let reply = backend
        .replies
        .get(&(method.to_string(), path))
        .map(|entry| entry.value().clone())
        .unwrap_or_else(|| Reply::json(404, json!({ "message": "no route" })));

    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }

    let mut response = Response::new(Body::from(reply.body));
    *response.status_mut() = reply.status;
    if let Some(content_type) = reply.content_type {
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_str(&content_type).unwrap());
    }
    response
}

/// Base URL of a port nothing listens on
pub async fn closed_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/api")
}

/// Signed token whose `exp` is `expires_in` seconds from now
pub fn mint_token(expires_in: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = json!({ "sub": "7", "iat": now, "exp": now + expires_in });
    encode(&Header::default(), &claims, &EncodingKey::from_secret(b"test_secret")).unwrap()
}
