//! Error types for the backend API client.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when calling the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request could not be sent or the response could not be read.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Backend answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Http {
        /// Response status.
        status: StatusCode,
        /// Message from the error body, or the status's reason phrase.
        message: String,
    },

    /// Request body could not be encoded.
    #[error("encode error: {0}")]
    Encode(String),

    /// Response body was not the expected JSON.
    #[error("decode error: {0}")]
    Decode(String),

    /// Response decoded but violates a domain invariant.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Endpoint could not be joined onto the base URL.
    #[error("invalid endpoint '{0}'")]
    InvalidEndpoint(String),

    /// Request was cancelled by the caller.
    #[error("request cancelled")]
    Cancelled,
}

impl ApiError {
    /// Build an HTTP error from a status and the raw response body.
    ///
    /// The message is taken from a JSON body's `message` or `error` field
    /// when present, otherwise from the status's reason phrase.
    #[must_use]
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = error_message(body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .map_or_else(|| status.as_str().to_string(), str::to_string)
        });
        Self::Http { status, message }
    }

    /// HTTP status, if the backend answered.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether retrying the same request may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(e) => !e.is_builder(),
            Self::Http { status, .. } => status.is_server_error(),
            _ => false,
        }
    }

    /// Whether the backend reported the resource as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let field = |v: &serde_json::Value, name: &str| {
        v.get(name)
            .and_then(serde_json::Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    field(&value, "message")
        .or_else(|| field(&value, "error"))
        .or_else(|| value.get("error").and_then(|e| field(e, "message")))
}
