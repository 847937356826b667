//! Trend Models
//!
//! Multi-analysis summaries classifying directional change over time. Field and
//! forest reports share one shape; the per-analysis point carries the union of
//! both metric sets.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Minimum number of analyses for a trend comparison
pub const MIN_TREND_RECORDS: usize = 2;

/// Qualitative overall trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
    /// Reported alongside insufficient data
    #[default]
    #[serde(other)]
    Unknown,
}

/// One analysis in a trend report, with changes relative to the previous one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub analysis_id: i64,
    pub date: NaiveDateTime,
    pub ndvi: f64,
    // Field metrics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yield_per_ha: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biomass_t_ha: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moisture_pct: Option<f64>,
    // Forest metrics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbr: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ndmi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbon_stock_t_ha: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canopy_cover_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fire_risk_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deforestation_risk: Option<String>,
    // Changes from the previous analysis, in percent
    #[serde(default)]
    pub ndvi_change_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yield_change_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbr_change_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbon_change_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canopy_change_pct: Option<f64>,
}

/// Trend report over the analyses of one site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    /// Most recent first
    #[serde(default)]
    pub analyses: Vec<TrendPoint>,
    #[serde(default)]
    pub overall_trend: TrendDirection,
    #[serde(default)]
    pub avg_ndvi_change: Option<f64>,
    #[serde(default)]
    pub avg_yield_change: Option<f64>,
    #[serde(default)]
    pub avg_carbon_change: Option<f64>,
    #[serde(default)]
    pub baseline_comparison: Option<Value>,
    pub has_sufficient_data: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl TrendReport {
    /// The message used when a report carries none of its own
    pub fn default_insufficient_message() -> String {
        format!(
            "Insufficient data: At least {} analyses are required for trend comparison.",
            MIN_TREND_RECORDS
        )
    }

    /// An empty report flagged as insufficient
    pub fn insufficient(message: impl Into<String>) -> Self {
        Self {
            analyses: Vec::new(),
            overall_trend: TrendDirection::Unknown,
            avg_ndvi_change: None,
            avg_yield_change: None,
            avg_carbon_change: None,
            baseline_comparison: None,
            has_sufficient_data: false,
            message: Some(message.into()),
        }
    }
}
