//! Analysis Execution State Machine
//!
//! `Idle -> Running(kind) -> Succeeded | Failed -> Idle`, at most one run in
//! flight per site. The running entry is removed by a drop guard, so every
//! exit path (success, failure, a dropped future) returns the site to idle.

use std::collections::HashMap;
use std::sync::Arc;

use atlasfield_core::{AnalysisKind, AnalysisRecord, SiteApi, SiteId};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::models::dashboard::{ExecutionStatus, SiteTarget};
use crate::services::aggregation::AggregationOrchestrator;
use crate::utils::error::{AppError, AppResult};

/// Runs currently in flight, by site
pub type RunningAnalyses = HashMap<SiteId, AnalysisKind>;

pub struct AnalysisExecutor {
    api: Arc<dyn SiteApi>,
    aggregation: Arc<AggregationOrchestrator>,
    runs_tx: watch::Sender<RunningAnalyses>,
    detail_tx: watch::Sender<Option<AnalysisRecord>>,
}

/// Removes the site's running entry when dropped
struct RunGuard<'a> {
    runs_tx: &'a watch::Sender<RunningAnalyses>,
    site_id: SiteId,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let site_id = self.site_id;
        self.runs_tx.send_modify(|runs| {
            runs.remove(&site_id);
        });
        debug!(site_id, "Analysis run settled");
    }
}

impl AnalysisExecutor {
    pub fn new(api: Arc<dyn SiteApi>, aggregation: Arc<AggregationOrchestrator>) -> Self {
        let (runs_tx, _) = watch::channel(HashMap::new());
        let (detail_tx, _) = watch::channel(None);
        Self {
            api,
            aggregation,
            runs_tx,
            detail_tx,
        }
    }

    /// Request a new analysis of `kind` for `target`
    ///
    /// Rejected with `AnalysisInProgress`, without a remote call, while a run
    /// is in flight for the same site. On success the record is prepended to
    /// the displayed history and opened in the detail view, provided the site
    /// is still active, and the optional sources are refreshed.
    pub async fn run(&self, target: SiteTarget, kind: AnalysisKind) -> AppResult<AnalysisRecord> {
        let site_id = target.site_id;
        let guard = self.try_start(site_id, kind)?;
        info!(site_id, %kind, "Analysis run started");

        let record = match self.api.run_analysis(site_id, kind).await {
            Ok(record) => record,
            Err(err) => {
                drop(guard);
                warn!(site_id, %kind, error = %err, "Analysis run failed");
                return Err(AppError::Api(err));
            }
        };

        let committed = self.aggregation.commit_record(record.clone());
        if committed {
            self.detail_tx.send_replace(Some(record.clone()));
        } else {
            debug!(site_id, analysis_id = record.id, "Run finished for a site that is no longer displayed");
        }
        drop(guard);
        info!(site_id, %kind, analysis_id = record.id, "Analysis run succeeded");

        if committed {
            self.aggregation.refresh_predictions(target).await;
        }
        Ok(record)
    }

    fn try_start(&self, site_id: SiteId, kind: AnalysisKind) -> AppResult<RunGuard<'_>> {
        let mut running = None;
        self.runs_tx.send_if_modified(|runs| match runs.get(&site_id) {
            Some(existing) => {
                running = Some(*existing);
                false
            }
            None => {
                runs.insert(site_id, kind);
                true
            }
        });

        if let Some(existing) = running {
            debug!(site_id, %kind, %existing, "Rejecting analysis request while one is running");
            return Err(AppError::AnalysisInProgress {
                site_id,
                kind: existing,
            });
        }

        Ok(RunGuard {
            runs_tx: &self.runs_tx,
            site_id,
        })
    }

    /// Status of the given site
    pub fn status(&self, site_id: SiteId) -> ExecutionStatus {
        match self.runs_tx.borrow().get(&site_id) {
            Some(kind) => ExecutionStatus::Running {
                site_id,
                kind: *kind,
            },
            None => ExecutionStatus::Idle,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<RunningAnalyses> {
        self.runs_tx.subscribe()
    }

    /// Record currently open in the detail view
    pub fn detail(&self) -> Option<AnalysisRecord> {
        self.detail_tx.borrow().clone()
    }

    pub fn open_detail(&self, record: AnalysisRecord) {
        self.detail_tx.send_replace(Some(record));
    }

    pub fn close_detail(&self) {
        self.detail_tx.send_replace(None);
    }
}
