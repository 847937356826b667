//! AtlasField Dashboard - Site Analysis View-Model Orchestrator
//!
//! Client-side orchestration for the AtlasField land monitoring dashboard.
//! It includes:
//! - Active site selection, persisted across sessions and navigation
//! - Concurrent, partially-failing aggregation of a site's remote data
//! - The analysis execution state machine
//! - Derived metrics for charts and summaries
//! - Conversation threads with the agronomy assistant
//! - Storage layer (JSON config, durable client state) and the HTTP collaborator

pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

pub use models::dashboard::{
    AggregationState, ConversationSnapshot, DashboardViewModel, ExecutionStatus,
    SiteAnalysisBundle, SiteTarget,
};
pub use models::settings::{AppConfig, SettingsUpdate, ThreadSwitchPolicy};
pub use state::DashboardState;
pub use utils::error::{AppError, AppResult};
