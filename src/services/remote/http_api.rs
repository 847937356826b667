//! HTTP Site API
//!
//! `SiteApi` over the AtlasField REST service (`{base}/sites`,
//! `{base}/analysis/...`, `{base}/chat...`).

use std::time::Duration;

use async_trait::async_trait;
use atlasfield_core::{
    AnalysisKind, AnalysisRecord, ApiError, ApiResult, BiomassEstimate, ChatReply,
    ConversationThread, Site, SiteApi, SiteId, ThreadId, TrendReport, YieldPrediction,
};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use crate::models::settings::AppConfig;
use crate::utils::error::{AppError, AppResult};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for the HTTP client.
#[derive(Debug, Clone)]
pub struct HttpSiteApiConfig {
    /// Base URL including the API prefix, e.g. `http://localhost:8000/api/v1`
    pub base_url: String,
    /// Optional bearer token.
    pub auth_token: Option<String>,
    pub timeout: Duration,
}

impl Default for HttpSiteApiConfig {
    fn default() -> Self {
        Self {
            base_url: AppConfig::default().api_base_url,
            auth_token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl From<&AppConfig> for HttpSiteApiConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            base_url: config.api_base_url.clone(),
            auth_token: config.api_token.clone(),
            timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

pub struct HttpSiteApi {
    client: reqwest::Client,
    config: HttpSiteApiConfig,
}

impl HttpSiteApi {
    pub fn new(config: HttpSiteApiConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_reqwest_client(client, config))
    }

    /// Wrap an existing reqwest client
    pub fn with_reqwest_client(client: reqwest::Client, config: HttpSiteApiConfig) -> Self {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        Self {
            client,
            config: HttpSiteApiConfig { base_url, ..config },
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.config.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> ApiResult<Response> {
        self.authorize(builder)
            .send()
            .await
            .map_err(|e| ApiError::network(e.to_string()))
    }

    /// Decode a required resource
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        debug!(path, "GET");
        let response = self.send(self.client.get(self.url(path))).await?;
        decode(check_status(response).await?).await
    }

    /// Decode an optional resource; 404 and a null body read as absent
    async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> ApiResult<Option<T>> {
        debug!(path, "GET");
        let response = self.send(self.client.get(self.url(path))).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        decode(check_status(response).await?).await
    }
}

/// Map non-success statuses onto the error taxonomy
async fn check_status(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_detail(&body).unwrap_or(body);
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(message),
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        _ => ApiError::status(status.as_u16(), message),
    })
}

/// The service reports errors as `{"detail": "..."}`
fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.get("detail")?.as_str().map(str::to_string)
}

async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ApiError::network(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::decode(e.to_string()))
}

#[async_trait]
impl SiteApi for HttpSiteApi {
    async fn list_sites(&self) -> ApiResult<Vec<Site>> {
        self.get_json("/sites").await
    }

    async fn get_analysis_history(&self, site_id: SiteId) -> ApiResult<Vec<AnalysisRecord>> {
        self.get_json(&format!("/analysis/{}/history", site_id)).await
    }

    async fn run_analysis(&self, site_id: SiteId, kind: AnalysisKind) -> ApiResult<AnalysisRecord> {
        debug!(site_id, %kind, "POST analysis");
        let builder = self
            .client
            .post(self.url(&format!("/analysis/{}", site_id)))
            .json(&json!({ "analysis_type": kind }));
        let response = self.send(builder).await?;
        decode(check_status(response).await?).await
    }

    async fn get_yield_prediction(&self, site_id: SiteId) -> ApiResult<Option<YieldPrediction>> {
        self.get_optional(&format!("/analysis/{}/yield", site_id)).await
    }

    async fn get_biomass_estimate(&self, site_id: SiteId) -> ApiResult<Option<BiomassEstimate>> {
        self.get_optional(&format!("/analysis/{}/biomass", site_id)).await
    }

    async fn get_field_trends(&self, site_id: SiteId) -> ApiResult<Option<TrendReport>> {
        self.get_optional(&format!("/analysis/{}/field-trends", site_id)).await
    }

    async fn get_forest_trends(&self, site_id: SiteId) -> ApiResult<Option<TrendReport>> {
        self.get_optional(&format!("/analysis/{}/forest-trends", site_id)).await
    }

    async fn list_chat_threads(
        &self,
        site_id: Option<SiteId>,
    ) -> ApiResult<Vec<ConversationThread>> {
        let path = match site_id {
            Some(id) => format!("/chat/history?field_id={}", id),
            None => "/chat/history".to_string(),
        };
        self.get_json(&path).await
    }

    async fn send_chat_message(&self, text: &str, site_id: Option<SiteId>) -> ApiResult<ChatReply> {
        debug!(?site_id, "POST chat");
        let builder = self
            .client
            .post(self.url("/chat"))
            .json(&json!({ "message": text, "field_id": site_id }));
        let response = self.send(builder).await?;
        decode(check_status(response).await?).await
    }

    async fn delete_chat_thread(&self, thread_id: ThreadId) -> ApiResult<()> {
        debug!(thread_id, "DELETE chat history");
        let builder = self
            .client
            .delete(self.url(&format!("/chat/history/{}", thread_id)));
        let response = self.send(builder).await?;
        check_status(response).await?;
        Ok(())
    }
}
