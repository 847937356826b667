//! Analysis Models
//!
//! Immutable results of running a satellite-derived computation against a site.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::site::{SiteId, SiteKind};
use crate::error::CoreError;

/// Kind of analysis the remote service can compute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AnalysisKind {
    /// Optical vegetation index
    Ndvi,
    /// Radar vegetation index
    Rvi,
    Moisture,
    /// Optical + radar fusion
    Fusion,
    Yield,
    Biomass,
    /// Field composite embedding vegetation, moisture, yield and biomass reports
    Complete,
    /// Forest composite (burn ratio, moisture index, canopy, carbon)
    Forest,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 8] = [
        AnalysisKind::Ndvi,
        AnalysisKind::Rvi,
        AnalysisKind::Moisture,
        AnalysisKind::Fusion,
        AnalysisKind::Yield,
        AnalysisKind::Biomass,
        AnalysisKind::Complete,
        AnalysisKind::Forest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::Ndvi => "NDVI",
            AnalysisKind::Rvi => "RVI",
            AnalysisKind::Moisture => "MOISTURE",
            AnalysisKind::Fusion => "FUSION",
            AnalysisKind::Yield => "YIELD",
            AnalysisKind::Biomass => "BIOMASS",
            AnalysisKind::Complete => "COMPLETE",
            AnalysisKind::Forest => "FOREST",
        }
    }

    /// Whether the payload embeds several derived sub-reports
    pub fn is_composite(&self) -> bool {
        matches!(self, AnalysisKind::Complete | AnalysisKind::Forest)
    }

    /// Whether records of this kind are plotted in the history chart
    pub fn is_chartable(&self) -> bool {
        matches!(
            self,
            AnalysisKind::Ndvi | AnalysisKind::Complete | AnalysisKind::Forest
        )
    }

    /// The "full analysis" kind requested for a site of the given type
    pub fn composite_for(site_kind: SiteKind) -> Self {
        match site_kind {
            SiteKind::Field => AnalysisKind::Complete,
            SiteKind::Forest => AnalysisKind::Forest,
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        AnalysisKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == upper)
            .ok_or_else(|| CoreError::parse(format!("unknown analysis type: {}", s)))
    }
}

/// One stored analysis of a site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: i64,
    #[serde(alias = "field_id")]
    pub site_id: SiteId,
    pub analysis_type: AnalysisKind,
    #[serde(default)]
    pub satellite_date: Option<NaiveDateTime>,
    /// Opaque payload; may contain `detailed_report` and `forest_data`
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub mean_value: Option<f64>,
    #[serde(default)]
    pub min_value: Option<f64>,
    #[serde(default)]
    pub max_value: Option<f64>,
    #[serde(default)]
    pub cloud_coverage: Option<f64>,
    #[serde(default)]
    pub interpretation: Option<String>,
    pub created_at: NaiveDateTime,
}

impl AnalysisRecord {
    /// The structured report embedded in the payload, if any
    pub fn detailed_report(&self) -> Option<&Value> {
        self.data
            .get("detailed_report")
            .filter(|report| report.is_object())
    }

    /// Forest-specific figures stored next to the report for forest composites
    pub fn forest_data(&self) -> Option<&Value> {
        self.data.get("forest_data").filter(|data| data.is_object())
    }

    /// Numeric value at `path` inside the detailed report
    pub fn report_number(&self, path: &[&str]) -> Option<f64> {
        lookup(self.detailed_report()?, path).and_then(Value::as_f64)
    }

    /// String value at `path` inside the detailed report
    pub fn report_str(&self, path: &[&str]) -> Option<&str> {
        lookup(self.detailed_report()?, path).and_then(Value::as_str)
    }

    /// Numeric value of `key` inside `forest_data`
    pub fn forest_number(&self, key: &str) -> Option<f64> {
        self.forest_data()?.get(key).and_then(Value::as_f64)
    }

    /// String value of `key` inside `forest_data`
    pub fn forest_str(&self, key: &str) -> Option<&str> {
        self.forest_data()?.get(key).and_then(Value::as_str)
    }
}

fn lookup<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(root, |node, key| node.get(*key))
        .filter(|value| !value.is_null())
}
