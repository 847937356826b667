//! Settings Models
//!
//! Application configuration and settings data structures.

use serde::{Deserialize, Serialize};

/// What the conversation manager does when the active site changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ThreadSwitchPolicy {
    /// Re-list threads, clear the transcript, deselect any thread
    #[default]
    StartBlank,
    /// Re-list threads and load the most recently updated one
    ResumeLatest,
}

/// Application configuration stored in config.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the AtlasField REST service
    pub api_base_url: String,
    /// Bearer token attached to every request
    #[serde(default)]
    pub api_token: Option<String>,
    /// Per-request timeout in seconds; analysis runs can be slow
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub thread_switch_policy: ThreadSwitchPolicy,
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000/api/v1".to_string(),
            api_token: None,
            request_timeout_secs: default_request_timeout_secs(),
            thread_switch_policy: ThreadSwitchPolicy::default(),
        }
    }
}

/// Settings update request (partial update)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SettingsUpdate {
    pub api_base_url: Option<String>,
    pub api_token: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub thread_switch_policy: Option<ThreadSwitchPolicy>,
}

impl AppConfig {
    /// Apply a partial update to the configuration
    pub fn apply_update(&mut self, update: SettingsUpdate) {
        if let Some(url) = update.api_base_url {
            self.api_base_url = url;
        }
        if let Some(token) = update.api_token {
            // An empty token clears the stored one
            self.api_token = if token.is_empty() { None } else { Some(token) };
        }
        if let Some(timeout) = update.request_timeout_secs {
            self.request_timeout_secs = timeout;
        }
        if let Some(policy) = update.thread_switch_policy {
            self.thread_switch_policy = policy;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        let url = self.api_base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(format!(
                "Invalid api_base_url: {}. Must start with http:// or https://",
                self.api_base_url
            ));
        }

        if self.request_timeout_secs == 0 || self.request_timeout_secs > 600 {
            return Err("request_timeout_secs must be between 1 and 600".to_string());
        }

        Ok(())
    }
}
