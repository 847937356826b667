//! AtlasField Core
//!
//! Domain models, the remote collaborator trait, and foundational error types
//! for the AtlasField dashboard workspace. This crate has no dependency on the
//! application crate (HTTP transport, persistence, runtime wiring).
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `models` - Wire-level data contracts (sites, analyses, predictions, trends, chat)
//! - `api` - The `SiteApi` collaborator trait and its `ApiError` taxonomy
//!
//! ## Design Principles
//!
//! 1. **Only serde/async-trait/thiserror/chrono** as dependencies
//! 2. **Trait-based collaborator** - the remote service is injected, so every
//!    orchestration component can be driven by an in-process mock
//! 3. **Unidirectional dependency** - this crate depends on nothing else in the workspace

pub mod api;
pub mod error;
pub mod models;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── Collaborator Trait ─────────────────────────────────────────────────
pub use api::{ApiError, ApiResult, SiteApi};

// ── Domain Models ──────────────────────────────────────────────────────
pub use models::{
    AnalysisKind, AnalysisRecord, BiomassEstimate, ChatReply, ChatRole, ChatTurn,
    ConversationThread, FieldAttributes, ForestAttributes, GeoPolygon, Site, SiteDetails, SiteId,
    SiteKind, ThreadId, TrendDirection, TrendPoint, TrendReport, YieldPrediction,
    MIN_TREND_RECORDS,
};
