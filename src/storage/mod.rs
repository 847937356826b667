//! Storage Layer
//!
//! Handles all local persistence: JSON config and durable client state.

pub mod config;
pub mod selection_store;

pub use config::*;
pub use selection_store::*;
