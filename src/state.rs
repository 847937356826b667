//! Dashboard State
//!
//! Owns the orchestration components and wires them together: every change
//! of the active site re-runs aggregation and switches the conversation
//! context, concurrently.

use std::sync::Arc;

use atlasfield_core::{
    AnalysisKind, AnalysisRecord, ChatReply, Site, SiteApi, SiteId, ThreadId,
};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::models::dashboard::{DashboardViewModel, ExecutionStatus, SiteTarget};
use crate::models::settings::{AppConfig, ThreadSwitchPolicy};
use crate::services::aggregation::AggregationOrchestrator;
use crate::services::conversation::ConversationManager;
use crate::services::execution::AnalysisExecutor;
use crate::services::metrics::derive_metrics;
use crate::services::remote::{HttpSiteApi, HttpSiteApiConfig};
use crate::services::selection::{MemoryNavigator, Navigator, SelectionController};
use crate::storage::{FileKeyValueStore, KeyValueStore, MemoryKeyValueStore, SelectionStore};
use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::state_path;

pub struct DashboardState {
    api: Arc<dyn SiteApi>,
    /// Last loaded site list
    sites: RwLock<Vec<Site>>,
    selection: SelectionController,
    aggregation: Arc<AggregationOrchestrator>,
    execution: AnalysisExecutor,
    conversation: ConversationManager,
}

impl DashboardState {
    pub fn new(
        api: Arc<dyn SiteApi>,
        store: SelectionStore,
        navigator: Arc<dyn Navigator>,
        policy: ThreadSwitchPolicy,
    ) -> Self {
        let aggregation = Arc::new(AggregationOrchestrator::new(api.clone()));
        Self {
            execution: AnalysisExecutor::new(api.clone(), aggregation.clone()),
            conversation: ConversationManager::new(api.clone(), policy),
            selection: SelectionController::new(store, navigator),
            aggregation,
            sites: RwLock::new(Vec::new()),
            api,
        }
    }

    /// Wire the HTTP service and ~/.atlasfield/state.json from configuration
    pub fn from_config(config: &AppConfig, navigator: Arc<dyn Navigator>) -> AppResult<Self> {
        let api = Arc::new(HttpSiteApi::new(HttpSiteApiConfig::from(config))?);

        let durable: Arc<dyn KeyValueStore> = match state_path().and_then(FileKeyValueStore::open) {
            Ok(store) => Arc::new(store),
            Err(err) => {
                warn!(error = %err, "Client state file unavailable, selection kept in memory");
                Arc::new(MemoryKeyValueStore::new())
            }
        };

        Ok(Self::new(
            api,
            SelectionStore::new(durable),
            navigator,
            config.thread_switch_policy,
        ))
    }

    /// Headless wiring with an in-memory navigator
    pub fn headless(config: &AppConfig) -> AppResult<Self> {
        Self::from_config(config, Arc::new(MemoryNavigator::new()))
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Load sites, resolve the active one and aggregate it
    pub async fn initialize(&self) -> AppResult<Option<SiteId>> {
        let sites = self.api.list_sites().await?;
        let ids: Vec<SiteId> = sites.iter().map(|site| site.id).collect();
        *self.sites.write().await = sites;

        let active = self.selection.initialize(&ids);
        info!(sites = ids.len(), active = ?active, "Dashboard initialized");
        self.react(active).await;
        Ok(active)
    }

    /// User picked a site
    pub async fn select_site(&self, site_id: SiteId) -> AppResult<()> {
        if self.selection.select(site_id)? {
            self.react(Some(site_id)).await;
        }
        Ok(())
    }

    /// The navigation state changed outside the dashboard
    pub async fn on_navigation_changed(&self, param: Option<&str>) {
        if self.selection.on_navigation_changed(param) {
            self.react(self.selection.active()).await;
        }
    }

    /// Reload the site list and re-aggregate the active site
    pub async fn refresh(&self) -> AppResult<()> {
        self.reload_sites().await?;
        self.react(self.selection.active()).await;
        Ok(())
    }

    /// Run an analysis for the active site
    ///
    /// `kind` defaults to the composite kind of the site's type.
    pub async fn run_analysis(&self, kind: Option<AnalysisKind>) -> AppResult<AnalysisRecord> {
        let site = self
            .active_site()
            .await
            .ok_or_else(|| AppError::validation("No site selected"))?;
        let target = SiteTarget::from(&site);
        let kind = kind.unwrap_or_else(|| AnalysisKind::composite_for(site.kind()));

        let record = self.execution.run(target, kind).await?;

        // Post-analysis attributes (detected forest type, cached health) live on the site
        let before = self.selection.active();
        match self.reload_sites().await {
            Ok(after) if after != before => self.react(after).await,
            Ok(_) => {}
            Err(err) => warn!(error = %err, "Site list refresh after analysis failed"),
        }
        Ok(record)
    }

    pub async fn send_chat_message(&self, text: &str) -> AppResult<ChatReply> {
        self.conversation.send_message(text).await
    }

    /// Open a record of the displayed history in the detail view
    pub fn open_analysis(&self, analysis_id: i64) -> AppResult<AnalysisRecord> {
        let state = self.aggregation.state();
        let record = state
            .bundle()
            .filter(|bundle| Some(bundle.site_id) == self.selection.active())
            .and_then(|bundle| bundle.history.iter().find(|record| record.id == analysis_id))
            .cloned()
            .ok_or_else(|| {
                AppError::not_found(format!("Analysis {} is not in the displayed history", analysis_id))
            })?;
        self.execution.open_detail(record.clone());
        Ok(record)
    }

    pub fn start_new_thread(&self) {
        self.conversation.start_new_thread();
    }

    pub fn select_thread(&self, thread_id: ThreadId) -> AppResult<()> {
        self.conversation.select_thread(thread_id)
    }

    pub async fn delete_thread(&self, thread_id: ThreadId) -> AppResult<()> {
        self.conversation.delete_thread(thread_id).await
    }

    // ========================================================================
    // Projection
    // ========================================================================

    /// Snapshot for the rendering layer
    pub async fn view_model(&self) -> DashboardViewModel {
        let sites = self.sites.read().await.clone();
        let active_id = self.selection.active();
        let active_site = active_id.and_then(|id| sites.iter().find(|site| site.id == id).cloned());

        let aggregation = self.aggregation.state();
        let metrics = aggregation
            .bundle()
            .filter(|bundle| Some(bundle.site_id) == active_id)
            .map(|bundle| derive_metrics(active_site.as_ref(), bundle));

        let execution = active_id
            .map(|id| self.execution.status(id))
            .unwrap_or(ExecutionStatus::Idle);

        DashboardViewModel {
            map_bounds: active_site.as_ref().and_then(|site| site.geometry.bbox()),
            sites,
            active_site,
            aggregation,
            metrics,
            execution,
            detail: self.execution.detail(),
            conversation: self.conversation.snapshot(),
        }
    }

    pub async fn sites(&self) -> Vec<Site> {
        self.sites.read().await.clone()
    }

    pub async fn active_site(&self) -> Option<Site> {
        let active = self.selection.active()?;
        self.site(active).await
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn aggregation(&self) -> &AggregationOrchestrator {
        &self.aggregation
    }

    pub fn execution(&self) -> &AnalysisExecutor {
        &self.execution
    }

    pub fn conversation(&self) -> &ConversationManager {
        &self.conversation
    }

    // ========================================================================
    // Internals
    // ========================================================================

    async fn site(&self, site_id: SiteId) -> Option<Site> {
        self.sites
            .read()
            .await
            .iter()
            .find(|site| site.id == site_id)
            .cloned()
    }

    /// Replace the site list and re-validate the selection
    async fn reload_sites(&self) -> AppResult<Option<SiteId>> {
        let sites = self.api.list_sites().await?;
        let ids: Vec<SiteId> = sites.iter().map(|site| site.id).collect();
        *self.sites.write().await = sites;
        Ok(self.selection.set_sites(&ids))
    }

    /// Follow the active site: aggregate it and switch the chat context
    async fn react(&self, active: Option<SiteId>) {
        self.execution.close_detail();

        let site = match active {
            Some(id) => self.site(id).await,
            None => None,
        };

        let Some(site) = site else {
            debug!("No active site, clearing aggregation");
            self.aggregation.clear();
            if let Err(err) = self.conversation.switch_context(None).await {
                warn!(error = %err, "Could not list general conversation threads");
            }
            return;
        };

        let target = SiteTarget::from(&site);
        let (aggregation, conversation) = tokio::join!(
            self.aggregation.load(target),
            self.conversation.switch_context(Some(site.id)),
        );
        if let Err(err) = aggregation {
            warn!(site_id = site.id, error = %err, "Aggregation failed");
        }
        if let Err(err) = conversation {
            warn!(site_id = site.id, error = %err, "Could not list conversation threads");
        }
    }
}
