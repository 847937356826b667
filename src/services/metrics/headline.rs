//! Per-type headline figures and presentation helpers.

use atlasfield_core::{Site, SiteKind};

use super::lookup::{composite_metric, forest_label, forest_number, latest_vegetation_index};
use crate::models::dashboard::SiteAnalysisBundle;
use crate::models::metrics::{
    CompositeMetric, FieldHeadline, ForestHeadline, HeadlineMetrics, MetricSource, MetricValue,
};

/// Headline projection, branching once on the site kind
///
/// `site` supplies cached summaries used when no record carries the figure.
pub fn headline(site: Option<&Site>, bundle: &SiteAnalysisBundle) -> HeadlineMetrics {
    let history = &bundle.history;
    let (ndvi, health_score) = match latest_vegetation_index(history) {
        Some(ndvi) => {
            let score = ndvi.value * 100.0;
            (Some(ndvi), Some(score))
        }
        None => (
            site.and_then(|site| site.latest_ndvi)
                .map(|value| MetricValue::new(value, MetricSource::SiteSummary, None)),
            site.and_then(Site::health_score),
        ),
    };
    let health_label = health_score.map(|score| percent_label(score / 100.0));

    match bundle.site_kind {
        SiteKind::Field => {
            let yield_prediction = bundle.yield_prediction.as_ref();
            let biomass = bundle.biomass.as_ref();
            HeadlineMetrics::Field(FieldHeadline {
                crop_type: site.and_then(Site::crop_type).map(str::to_string),
                ndvi,
                health_score,
                health_label,
                moisture: composite_metric(history, CompositeMetric::Moisture, yield_prediction, biomass),
                yield_per_ha: composite_metric(history, CompositeMetric::Yield, yield_prediction, biomass),
                biomass_t_ha: composite_metric(history, CompositeMetric::Biomass, yield_prediction, biomass),
                yield_prediction: bundle.yield_prediction.clone(),
            })
        }
        SiteKind::Forest => HeadlineMetrics::Forest(ForestHeadline {
            forest_type: site.and_then(Site::forest_type).map(str::to_string),
            ndvi,
            health_score,
            health_label,
            fire_risk_level: forest_label(
                history,
                "fire_risk_level",
                &["fire_risk_assessment", "risk_level"],
            )
            .or_else(|| {
                site.and_then(|site| site.fire_risk_level.clone())
                    .map(|level| MetricValue::new(level, MetricSource::SiteSummary, None))
            }),
            // A forest's biomass estimate is read as carbon stock
            carbon_stock_t_ha: forest_number(
                history,
                "carbon_estimate_tonnes_ha",
                &["carbon_sequestration", "current_carbon_stock_t_ha"],
            )
            .or_else(|| {
                bundle.biomass.as_ref().map(|estimate| {
                    MetricValue::new(estimate.total_carbon_t_ha, MetricSource::PredictionSnapshot, None)
                })
            }),
            canopy_cover_percent: forest_number(
                history,
                "canopy_cover_percent",
                &["canopy_health", "canopy_cover_percent"],
            ),
            deforestation_risk: forest_label(
                history,
                "deforestation_risk",
                &["deforestation_monitoring", "risk_level"],
            ),
        }),
    }
}

/// Format a 0..1 fraction as a whole percentage, e.g. `0.456` as `"46%"`
pub fn percent_label(fraction: f64) -> String {
    if !fraction.is_finite() {
        return "--".to_string();
    }
    format!("{:.0}%", (fraction * 100.0).round())
}
