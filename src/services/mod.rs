//! Services
//!
//! The orchestration components behind the dashboard view model.
//!
//! Data flows top-down: `selection` emits the active site, `aggregation`
//! fetches and merges its data, `metrics` projects the merge. `execution` and
//! `conversation` react to the same selection independently.

pub mod aggregation;
pub mod conversation;
pub mod execution;
pub mod metrics;
pub mod remote;
pub mod selection;
