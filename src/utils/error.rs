//! Error Handling
//!
//! Unified error types for the application.
//! Uses thiserror for ergonomic error definitions.

use atlasfield_core::{AnalysisKind, ApiError, CoreError, SiteId};
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Remote service errors (auto-converted from ApiError)
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Core model errors
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Durable client storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// A run is already in flight for this site
    #[error("An analysis ({kind}) is already running for site {site_id}")]
    AnalysisInProgress { site_id: SiteId, kind: AnalysisKind },

    /// The mandatory history fetch failed
    #[error("Failed to load analyses for site {site_id}: {message}")]
    AggregationFailed { site_id: SiteId, message: String },

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the user can simply retry the same action
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Api(err) => err.is_transient(),
            AppError::AggregationFailed { .. } | AppError::AnalysisInProgress { .. } => true,
            _ => false,
        }
    }
}

/// Convert AppError to a string suitable for the rendering layer
impl From<AppError> for String {
    fn from(err: AppError) -> String {
        err.to_string()
    }
}
