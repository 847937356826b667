//! Data Models
//!
//! Application-level data structures. Wire contracts with the remote service
//! live in `atlasfield_core::models`.

pub mod dashboard;
pub mod metrics;
pub mod settings;

pub use dashboard::*;
pub use metrics::*;
pub use settings::*;
