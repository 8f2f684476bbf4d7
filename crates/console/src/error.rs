//! Unified error handling for the console.

use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::demo::DemoError;
use crate::store::StoreError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Remote backend call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Demo data operation failed.
    #[error("Demo error: {0}")]
    Demo(#[from] DemoError),

    /// Local storage failed.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Referenced entity does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Input was rejected.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Whether retrying the operation may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Api(e) if e.is_transient())
    }

    /// Whether the error means the entity is missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) | Self::Demo(DemoError::NotFound(_)) => true,
            Self::Api(e) => e.is_not_found(),
            _ => false,
        }
    }

    /// Short text suitable for showing to an operator.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(ApiError::Http { message, .. }) => message.clone(),
            Self::Api(ApiError::Cancelled) => "Request cancelled".to_string(),
            Self::Api(e) if e.is_transient() => {
                "The server is unreachable. Please try again.".to_string()
            }
            Self::Api(_) => "Unexpected response from the server".to_string(),
            Self::Demo(DemoError::Validation(report)) => report.to_string(),
            Self::Demo(DemoError::NotFound(what)) | Self::NotFound(what) => {
                format!("Not found: {what}")
            }
            Self::Demo(_) | Self::Store(_) => "Local data could not be saved".to_string(),
            Self::Config(e) => e.to_string(),
            Self::Validation(message) => message.clone(),
        }
    }
}
