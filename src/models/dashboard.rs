//! Dashboard Models
//!
//! State published by the orchestration components and the combined view
//! model handed to the rendering layer.

use atlasfield_core::{
    AnalysisKind, AnalysisRecord, BiomassEstimate, ChatTurn, ConversationThread, Site, SiteId,
    SiteKind, ThreadId, TrendReport, YieldPrediction,
};
use serde::{Deserialize, Serialize};

use super::metrics::DerivedMetrics;

/// The site an aggregation or run is issued for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteTarget {
    pub site_id: SiteId,
    pub kind: SiteKind,
}

impl SiteTarget {
    pub fn new(site_id: SiteId, kind: SiteKind) -> Self {
        Self { site_id, kind }
    }
}

impl From<&Site> for SiteTarget {
    fn from(site: &Site) -> Self {
        Self::new(site.id, site.kind())
    }
}

// ============================================================================
// Aggregation
// ============================================================================

/// Merged result of one aggregation cycle
///
/// Optional sources that failed or were not applicable are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteAnalysisBundle {
    pub site_id: SiteId,
    pub site_kind: SiteKind,
    /// Newest first
    pub history: Vec<AnalysisRecord>,
    pub yield_prediction: Option<YieldPrediction>,
    pub biomass: Option<BiomassEstimate>,
    pub trends: Option<TrendReport>,
}

impl SiteAnalysisBundle {
    pub fn empty(target: SiteTarget) -> Self {
        Self {
            site_id: target.site_id,
            site_kind: target.kind,
            history: Vec::new(),
            yield_prediction: None,
            biomass: None,
            trends: None,
        }
    }

    pub fn target(&self) -> SiteTarget {
        SiteTarget::new(self.site_id, self.site_kind)
    }
}

/// Lifecycle of the aggregation for the active site
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum AggregationState {
    /// No site is active
    #[default]
    Idle,
    #[serde(rename_all = "camelCase")]
    Loading { site_id: SiteId },
    Ready(SiteAnalysisBundle),
    /// The history fetch failed; the rendering layer offers a retry
    #[serde(rename_all = "camelCase")]
    Failed { site_id: SiteId, message: String },
}

impl AggregationState {
    pub fn site_id(&self) -> Option<SiteId> {
        match self {
            AggregationState::Idle => None,
            AggregationState::Loading { site_id } | AggregationState::Failed { site_id, .. } => {
                Some(*site_id)
            }
            AggregationState::Ready(bundle) => Some(bundle.site_id),
        }
    }

    pub fn bundle(&self) -> Option<&SiteAnalysisBundle> {
        match self {
            AggregationState::Ready(bundle) => Some(bundle),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, AggregationState::Loading { .. })
    }
}

// ============================================================================
// Execution
// ============================================================================

/// Status of the analysis run for the active site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ExecutionStatus {
    #[default]
    Idle,
    #[serde(rename_all = "camelCase")]
    Running { site_id: SiteId, kind: AnalysisKind },
}

impl ExecutionStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, ExecutionStatus::Running { .. })
    }
}

// ============================================================================
// Conversation
// ============================================================================

/// Thread list and active transcript for the current context
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSnapshot {
    pub context: Option<SiteId>,
    /// Most recently updated first
    pub threads: Vec<ConversationThread>,
    pub active_thread_id: Option<ThreadId>,
    pub transcript: Vec<ChatTurn>,
}

// ============================================================================
// View Model
// ============================================================================

/// Snapshot of everything the rendering layer displays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardViewModel {
    pub sites: Vec<Site>,
    pub active_site: Option<Site>,
    /// `(min_lon, min_lat, max_lon, max_lat)` framing the active site on a map
    pub map_bounds: Option<(f64, f64, f64, f64)>,
    pub aggregation: AggregationState,
    pub metrics: Option<DerivedMetrics>,
    pub execution: ExecutionStatus,
    /// Record opened in the detail view after a run
    pub detail: Option<AnalysisRecord>,
    pub conversation: ConversationSnapshot,
}
