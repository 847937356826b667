//! Prediction Models
//!
//! Non-persistent snapshots recomputed by the service from a site's latest analyses.

use serde::{Deserialize, Serialize};

/// Yield prediction for an agricultural field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldPrediction {
    pub crop: String,
    pub area_ha: f64,
    pub yield_per_ha: f64,
    pub total_yield_tonnes: f64,
    pub confidence_percent: f64,
    /// ISO-8601 timestamp as produced by the service
    pub assessment_date: String,
}

/// Above-ground biomass estimate
///
/// For forests the meaningful figure is `total_carbon_t_ha`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomassEstimate {
    pub mean_biomass_t_ha: f64,
    pub min_biomass_t_ha: f64,
    pub max_biomass_t_ha: f64,
    pub total_carbon_t_ha: f64,
    pub interpretation: String,
}
