//! Conversation Models
//!
//! Persisted chat threads with the agronomy assistant, optionally scoped to a site.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::site::SiteId;

/// Remote identifier of a conversation thread
pub type ThreadId = i64;

/// Author of a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One turn of a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<NaiveDateTime>,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            timestamp: Some(chrono::Utc::now().naive_utc()),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            timestamp: Some(chrono::Utc::now().naive_utc()),
        }
    }
}

/// A persisted conversation; `site_id == None` is the general context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationThread {
    pub id: ThreadId,
    #[serde(default, alias = "field_id")]
    pub site_id: Option<SiteId>,
    #[serde(default)]
    pub messages: Vec<ChatTurn>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Assistant reply to a sent message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    /// Site summary the assistant was given, when a site context was supplied
    #[serde(default)]
    pub field_context: Option<Value>,
}
