//! Assistant Conversations
//!
//! Persisted chat threads scoped to the active site.

pub mod manager;

pub use manager::ConversationManager;
