//! Remote Collaborator Trait
//!
//! The AtlasField service surface consumed by the dashboard orchestration.
//! Implementations own transport, authentication and timeouts; callers only
//! distinguish a resolved value from a failure.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    AnalysisKind, AnalysisRecord, BiomassEstimate, ChatReply, ConversationThread, Site, SiteId,
    ThreadId, TrendReport, YieldPrediction,
};

/// Failure of a remote call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Transport failure (connect, timeout, reset)
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status
    #[error("Request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    /// Missing credentials or rejected token
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),
}

/// Result type alias for remote calls
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Whether retrying the same call could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Network(_) => true,
            ApiError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

/// The remote AtlasField service
///
/// Optional resources (predictions, trend reports) resolve to `Ok(None)` when
/// the service has nothing to compute them from yet.
#[async_trait]
pub trait SiteApi: Send + Sync {
    /// All sites visible to the current user
    async fn list_sites(&self) -> ApiResult<Vec<Site>>;

    /// Stored analyses of a site, newest first
    async fn get_analysis_history(&self, site_id: SiteId) -> ApiResult<Vec<AnalysisRecord>>;

    /// Run a new analysis; may take a long time
    async fn run_analysis(&self, site_id: SiteId, kind: AnalysisKind)
        -> ApiResult<AnalysisRecord>;

    async fn get_yield_prediction(&self, site_id: SiteId) -> ApiResult<Option<YieldPrediction>>;

    async fn get_biomass_estimate(&self, site_id: SiteId) -> ApiResult<Option<BiomassEstimate>>;

    async fn get_field_trends(&self, site_id: SiteId) -> ApiResult<Option<TrendReport>>;

    async fn get_forest_trends(&self, site_id: SiteId) -> ApiResult<Option<TrendReport>>;

    /// Threads of one context; `None` is the general context
    async fn list_chat_threads(&self, site_id: Option<SiteId>)
        -> ApiResult<Vec<ConversationThread>>;

    async fn send_chat_message(&self, text: &str, site_id: Option<SiteId>)
        -> ApiResult<ChatReply>;

    async fn delete_chat_thread(&self, thread_id: ThreadId) -> ApiResult<()>;
}
