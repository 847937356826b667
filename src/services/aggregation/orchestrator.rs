//! Aggregation Orchestrator
//!
//! Fetches everything the dashboard shows for one site. The history fetch is
//! mandatory; yield, biomass and trend sources are optional and degrade to
//! absent on failure. Results are committed only if the site they were
//! requested for is still the targeted one. Records produced by runs while a
//! cycle is in flight are merged into whatever history that cycle fetches.

use std::future::Future;
use std::sync::{Arc, RwLock};

use atlasfield_core::{
    AnalysisRecord, ApiResult, BiomassEstimate, SiteApi, SiteId, SiteKind, TrendReport,
    YieldPrediction,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::models::dashboard::{AggregationState, SiteAnalysisBundle, SiteTarget};
use crate::utils::error::{AppError, AppResult};

/// Request handle captured when an aggregation cycle begins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a begun aggregation does nothing until fetched"]
pub struct FetchToken {
    target: SiteTarget,
}

impl FetchToken {
    pub fn target(&self) -> SiteTarget {
        self.target
    }
}

/// Optional sources of one cycle
struct Predictions {
    yield_prediction: Option<YieldPrediction>,
    biomass: Option<BiomassEstimate>,
    trends: Option<TrendReport>,
}

pub struct AggregationOrchestrator {
    api: Arc<dyn SiteApi>,
    target: RwLock<Option<SiteTarget>>,
    /// Records committed for the current target, newest last
    produced: RwLock<Vec<AnalysisRecord>>,
    state_tx: watch::Sender<AggregationState>,
}

impl AggregationOrchestrator {
    pub fn new(api: Arc<dyn SiteApi>) -> Self {
        let (state_tx, _) = watch::channel(AggregationState::Idle);
        Self {
            api,
            target: RwLock::new(None),
            produced: RwLock::new(Vec::new()),
            state_tx,
        }
    }

    /// Mark `target` as the site being aggregated
    ///
    /// Any cycle still in flight for another site becomes stale.
    pub fn begin(&self, target: SiteTarget) -> FetchToken {
        let previous = self
            .target
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .replace(target);
        if previous.map(|p| p.site_id) != Some(target.site_id) {
            self.produced.write().unwrap_or_else(|e| e.into_inner()).clear();
        }
        self.state_tx.send_replace(AggregationState::Loading {
            site_id: target.site_id,
        });
        debug!(site_id = target.site_id, kind = %target.kind, "Aggregation started");
        FetchToken { target }
    }

    /// Run the fetches of a begun cycle
    ///
    /// Returns `Ok(None)` when the result was discarded as stale and
    /// `Err(AggregationFailed)` when the history fetch failed.
    pub async fn fetch(&self, token: FetchToken) -> AppResult<Option<SiteAnalysisBundle>> {
        let target = token.target;
        let site_id = target.site_id;

        let (history, predictions) = tokio::join!(
            self.api.get_analysis_history(site_id),
            self.fetch_predictions(target),
        );

        if !self.is_current(site_id) {
            debug!(site_id, "Discarding stale aggregation result");
            return Ok(None);
        }

        match history {
            Ok(history) => {
                let history = self.with_produced(history);
                let bundle = SiteAnalysisBundle {
                    site_id,
                    site_kind: target.kind,
                    history,
                    yield_prediction: predictions.yield_prediction,
                    biomass: predictions.biomass,
                    trends: predictions.trends,
                };
                info!(
                    site_id,
                    records = bundle.history.len(),
                    "Aggregation committed"
                );
                self.state_tx
                    .send_replace(AggregationState::Ready(bundle.clone()));
                Ok(Some(bundle))
            }
            Err(err) => {
                warn!(site_id, error = %err, "Analysis history fetch failed");
                let message = err.to_string();
                self.state_tx.send_replace(AggregationState::Failed {
                    site_id,
                    message: message.clone(),
                });
                Err(AppError::AggregationFailed { site_id, message })
            }
        }
    }

    /// Begin and fetch in one step
    pub async fn load(&self, target: SiteTarget) -> AppResult<Option<SiteAnalysisBundle>> {
        let token = self.begin(target);
        self.fetch(token).await
    }

    /// Re-issue the optional fetches for the current bundle
    ///
    /// Returns whether the refreshed values were committed.
    pub async fn refresh_predictions(&self, target: SiteTarget) -> bool {
        if !self.is_current(target.site_id) {
            return false;
        }

        let predictions = self.fetch_predictions(target).await;
        if !self.is_current(target.site_id) {
            debug!(site_id = target.site_id, "Discarding stale prediction refresh");
            return false;
        }

        let committed = self.state_tx.send_if_modified(|state| match state {
            AggregationState::Ready(bundle) if bundle.site_id == target.site_id => {
                bundle.yield_prediction = predictions.yield_prediction;
                bundle.biomass = predictions.biomass;
                bundle.trends = predictions.trends;
                true
            }
            _ => false,
        });
        if committed {
            debug!(site_id = target.site_id, "Predictions refreshed");
        }
        committed
    }

    /// Prepend a freshly produced record to the displayed history
    ///
    /// Only the execution state machine writes history. Accepted whenever the
    /// record's site is the current target; while a cycle for that site is
    /// still loading, the record is held and merged when the cycle commits.
    pub(crate) fn commit_record(&self, record: AnalysisRecord) -> bool {
        let site_id = record.site_id;
        if !self.is_current(site_id) {
            return false;
        }
        self.produced
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(record.clone());

        let shown = self.state_tx.send_if_modified(|state| match state {
            AggregationState::Ready(bundle) if bundle.site_id == site_id => {
                if bundle.history.iter().any(|existing| existing.id == record.id) {
                    return false;
                }
                bundle.history.insert(0, record);
                true
            }
            _ => false,
        });
        if !shown {
            debug!(site_id, "Produced record held for the in-flight aggregation");
        }
        true
    }

    /// No site is active
    pub fn clear(&self) {
        *self.target.write().unwrap_or_else(|e| e.into_inner()) = None;
        self.produced.write().unwrap_or_else(|e| e.into_inner()).clear();
        self.state_tx.send_replace(AggregationState::Idle);
    }

    pub fn state(&self) -> AggregationState {
        self.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AggregationState> {
        self.state_tx.subscribe()
    }

    pub fn current_target(&self) -> Option<SiteTarget> {
        *self.target.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_current(&self, site_id: SiteId) -> bool {
        self.current_target()
            .is_some_and(|target| target.site_id == site_id)
    }

    /// Prepend produced records the fetched history does not contain yet
    fn with_produced(&self, history: Vec<AnalysisRecord>) -> Vec<AnalysisRecord> {
        let produced = self.produced.read().unwrap_or_else(|e| e.into_inner());
        let mut merged: Vec<AnalysisRecord> = produced
            .iter()
            .rev()
            .filter(|record| !history.iter().any(|fetched| fetched.id == record.id))
            .cloned()
            .collect();
        merged.extend(history);
        merged
    }

    async fn fetch_predictions(&self, target: SiteTarget) -> Predictions {
        let site_id = target.site_id;

        let yield_fut = async {
            match target.kind {
                SiteKind::Field => {
                    optional("yield", site_id, self.api.get_yield_prediction(site_id)).await
                }
                SiteKind::Forest => None,
            }
        };
        let biomass_fut = optional("biomass", site_id, self.api.get_biomass_estimate(site_id));
        let trends_fut = async {
            match target.kind {
                SiteKind::Field => {
                    optional("field trends", site_id, self.api.get_field_trends(site_id)).await
                }
                SiteKind::Forest => {
                    optional("forest trends", site_id, self.api.get_forest_trends(site_id)).await
                }
            }
        };

        let (yield_prediction, biomass, trends) = tokio::join!(yield_fut, biomass_fut, trends_fut);
        Predictions {
            yield_prediction,
            biomass,
            trends,
        }
    }
}

/// Await an optional source, turning a failure into absence
async fn optional<T, F>(source: &'static str, site_id: SiteId, fut: F) -> Option<T>
where
    F: Future<Output = ApiResult<Option<T>>>,
{
    match fut.await {
        Ok(value) => value,
        Err(err) => {
            warn!(site_id, source, error = %err, "Optional source unavailable");
            None
        }
    }
}
