//! Derived Metrics Models
//!
//! Display-ready projections of a site's analysis history, consumed by the
//! rendering layer. Values are kept unrounded; rounding happens at presentation.

use atlasfield_core::{AnalysisKind, TrendDirection, TrendPoint, YieldPrediction};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One point of the history chart, on a 0-100 scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub analysis_id: i64,
    pub kind: AnalysisKind,
    pub date: NaiveDateTime,
    pub value: f64,
}

/// Where a headline value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricSource {
    /// Embedded in a composite analysis report
    CompositeReport,
    /// The mean value of a standalone record of the matching kind
    StandaloneRecord,
    /// A yield or biomass prediction snapshot
    PredictionSnapshot,
    /// Cached on the site itself
    SiteSummary,
}

/// A value together with its provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricValue<T> {
    pub value: T,
    pub source: MetricSource,
    /// Record the value was read from, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_id: Option<i64>,
}

impl<T> MetricValue<T> {
    pub fn new(value: T, source: MetricSource, analysis_id: Option<i64>) -> Self {
        Self {
            value,
            source,
            analysis_id,
        }
    }
}

/// Sub-fields a field composite report embeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompositeMetric {
    /// Soil moisture as a 0..1 fraction
    Moisture,
    /// Tonnes per hectare
    Yield,
    /// Tonnes per hectare
    Biomass,
}

impl CompositeMetric {
    /// Path of the figure inside a composite's detailed report
    pub fn report_path(&self) -> [&'static str; 2] {
        match self {
            CompositeMetric::Moisture => ["moisture_assessment", "estimated_moisture"],
            CompositeMetric::Yield => ["yield_prediction", "predicted_yield_per_ha"],
            CompositeMetric::Biomass => ["biomass_analysis", "estimated_biomass_t_ha"],
        }
    }

    /// The standalone analysis kind whose summary value measures the same thing
    ///
    /// Only moisture runs summarize their own figure; yield and biomass runs
    /// carry a vegetation index as their summary value.
    pub fn standalone_kind(&self) -> Option<AnalysisKind> {
        match self {
            CompositeMetric::Moisture => Some(AnalysisKind::Moisture),
            CompositeMetric::Yield | CompositeMetric::Biomass => None,
        }
    }
}

/// Trend classification as exposed to the rendering layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum TrendSummary {
    #[serde(rename_all = "camelCase")]
    Available {
        direction: TrendDirection,
        /// Per-analysis changes, verbatim from the report
        points: Vec<TrendPoint>,
        avg_ndvi_change: Option<f64>,
        avg_yield_change: Option<f64>,
        avg_carbon_change: Option<f64>,
    },
    Insufficient { message: String },
}

impl TrendSummary {
    pub fn is_available(&self) -> bool {
        matches!(self, TrendSummary::Available { .. })
    }
}

/// An action recommendation from a detailed report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// low, medium, high, critical
    pub priority: String,
    #[serde(default)]
    pub category: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub actions: Vec<String>,
}

/// A detected problem from a detailed report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub severity: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "possible_causes")]
    pub possible_causes: Vec<String>,
    #[serde(default, alias = "urgent_actions")]
    pub urgent_actions: Vec<String>,
}

/// Recommendations and problems of the newest record carrying a report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Findings {
    pub recommendations: Vec<Recommendation>,
    pub problems: Vec<Problem>,
    pub source_analysis_id: Option<i64>,
}

/// Headline figures for an agricultural field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldHeadline {
    pub crop_type: Option<String>,
    pub ndvi: Option<MetricValue<f64>>,
    pub health_score: Option<f64>,
    /// Health score rounded for display, e.g. `"62%"`
    pub health_label: Option<String>,
    pub moisture: Option<MetricValue<f64>>,
    pub yield_per_ha: Option<MetricValue<f64>>,
    pub biomass_t_ha: Option<MetricValue<f64>>,
    pub yield_prediction: Option<YieldPrediction>,
}

/// Headline figures for a forest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForestHeadline {
    pub forest_type: Option<String>,
    pub ndvi: Option<MetricValue<f64>>,
    pub health_score: Option<f64>,
    pub health_label: Option<String>,
    pub fire_risk_level: Option<MetricValue<String>>,
    pub carbon_stock_t_ha: Option<MetricValue<f64>>,
    pub canopy_cover_percent: Option<MetricValue<f64>>,
    pub deforestation_risk: Option<MetricValue<String>>,
}

/// Per-type headline projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "siteType", rename_all = "camelCase")]
pub enum HeadlineMetrics {
    Field(FieldHeadline),
    Forest(ForestHeadline),
}

/// Everything the builder derives for one site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMetrics {
    /// Oldest first
    pub history_series: Vec<SeriesPoint>,
    pub trend: TrendSummary,
    pub findings: Findings,
    pub headline: HeadlineMetrics,
}
