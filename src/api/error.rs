//! Gateway errors and the uniform result envelope.
//!
//! [`ApiError`] is what the raw request primitive produces. Public gateway
//! operations never hand it out; they flatten it into a [`RequestError`],
//! the serializable error half of every [`RequestResult`].

use reqwest::StatusCode;
use reqwest::header::InvalidHeaderValue;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Message for non-2xx responses whose body carries no `message`
pub const HTTP_FAILURE_MESSAGE: &str = "Request failed";

/// Message for failures that produced no message of their own
pub const GENERIC_FAILURE_MESSAGE: &str = "The request could not be completed.";

/// Message for requests cancelled by the caller
pub const ABORTED_MESSAGE: &str = "The request was cancelled.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request cancelled")]
    Aborted,

    #[error("{message}")]
    Http {
        status: StatusCode,
        message: String,
        details: Value,
    },

    #[error("{0}")]
    Transport(#[source] reqwest::Error),

    #[error("failed to read response body: {0}")]
    Body(#[source] reqwest::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid header value: {0}")]
    Header(#[from] InvalidHeaderValue),
}

/// Failure half of a [`RequestResult`]
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct RequestError {
    pub message: String,
    /// HTTP status, when a response was received
    pub status: Option<u16>,
    /// The parsed response body of a failed request
    pub details: Option<Value>,
    /// The caller cancelled the request
    pub aborted: bool,
}

/// Result of every gateway operation: the response payload or a [`RequestError`]
pub type RequestResult<T = Value> = Result<T, RequestError>;

impl RequestError {
    pub fn http(message: impl Into<String>, status: u16, details: Option<Value>) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
            details,
            aborted: false,
        }
    }

    pub fn aborted() -> Self {
        Self {
            message: ABORTED_MESSAGE.to_string(),
            status: None,
            details: None,
            aborted: true,
        }
    }

    fn other(message: String) -> Self {
        Self {
            message: non_empty(message),
            status: None,
            details: None,
            aborted: false,
        }
    }

    /// One-line description in the form "`<action>` failed: message (HTTP status)"
    pub fn describe(&self, action: &str) -> String {
        match self.status {
            Some(status) => format!("{action} failed: {} (HTTP {status})", self.message),
            None => format!("{action} failed: {}", self.message),
        }
    }
}

impl From<ApiError> for RequestError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Aborted => Self::aborted(),
            ApiError::Http {
                status,
                message,
                details,
            } => Self {
                message: non_empty(message),
                status: Some(status.as_u16()),
                details: match details {
                    Value::Null => None,
                    Value::String(text) if text.is_empty() => None,
                    details => Some(details),
                },
                aborted: false,
            },
            other => Self::other(other.to_string()),
        }
    }
}

fn non_empty(message: String) -> String {
    if message.is_empty() {
        GENERIC_FAILURE_MESSAGE.to_string()
    } else {
        message
    }
}

/// Wire form of a [`RequestResult`]: exactly `{"data": …}` or `{"error": …}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Envelope {
    Data(Value),
    Error(RequestError),
}

impl From<RequestResult> for Envelope {
    fn from(result: RequestResult) -> Self {
        match result {
            Ok(data) => Self::Data(data),
            Err(error) => Self::Error(error),
        }
    }
}
