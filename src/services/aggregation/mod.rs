//! Site Data Aggregation
//!
//! Concurrent, partially-failing fetches merged into one bundle per site.

pub mod orchestrator;

pub use orchestrator::{AggregationOrchestrator, FetchToken};
