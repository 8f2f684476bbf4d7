//! HTTP client for the Support Desk backend.
//!
//! # Behavior
//!
//! - JSON request and response bodies
//! - `Authorization: Bearer` header on requests that ask for it
//! - GET requests retried with exponential backoff on network errors and 5xx
//! - POST/PUT/DELETE never retried automatically
//! - Non-2xx responses become [`ApiError::Http`] with the server's message
//!
//! # Example
//!
//! ```rust,ignore
//! use support_desk::api::{ApiClient, RequestOptions};
//!
//! let client = ApiClient::new(&config.api)?;
//! let chats = client.list_chats().await?;
//! let raw: serde_json::Value = client.get("/health", &RequestOptions::default()).await?;
//! ```

mod client;
mod endpoints;
mod error;
mod retry;

pub use client::{ApiClient, RequestOptions};
pub use endpoints::{ChatUpdate, OrderUpdate};
pub use error::ApiError;
pub use retry::RetryPolicy;
