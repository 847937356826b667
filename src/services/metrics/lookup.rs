//! Latest-by-kind lookups and the composite fallback chain.
//!
//! History slices are newest first, so the first match is the most recent.

use atlasfield_core::{AnalysisKind, AnalysisRecord, BiomassEstimate, YieldPrediction};

use crate::models::metrics::{CompositeMetric, MetricSource, MetricValue};

/// Most recent record of exactly `kind`
pub fn latest_by_kind(history: &[AnalysisRecord], kind: AnalysisKind) -> Option<&AnalysisRecord> {
    history.iter().find(|record| record.analysis_type == kind)
}

/// Most recent chartable record carrying a summary value
pub fn latest_vegetation_index(history: &[AnalysisRecord]) -> Option<MetricValue<f64>> {
    history
        .iter()
        .filter(|record| record.analysis_type.is_chartable())
        .find_map(|record| {
            let value = record.mean_value?;
            let source = if record.analysis_type.is_composite() {
                MetricSource::CompositeReport
            } else {
                MetricSource::StandaloneRecord
            };
            Some(MetricValue::new(value, source, Some(record.id)))
        })
}

/// Resolve a field composite sub-field
///
/// The newest `COMPLETE` record embedding the figure wins when it is at least
/// as recent as the newest standalone record of the matching kind. Otherwise
/// the standalone record's summary value (moisture only), then the prediction
/// snapshot.
pub fn composite_metric(
    history: &[AnalysisRecord],
    metric: CompositeMetric,
    yield_prediction: Option<&YieldPrediction>,
    biomass: Option<&BiomassEstimate>,
) -> Option<MetricValue<f64>> {
    let path = metric.report_path();
    let composite = history
        .iter()
        .filter(|record| record.analysis_type == AnalysisKind::Complete)
        .find_map(|record| record.report_number(&path).map(|value| (record, value)));

    let standalone = metric
        .standalone_kind()
        .and_then(|kind| latest_by_kind(history, kind))
        .and_then(|record| record.mean_value.map(|value| (record, value)));

    match (composite, standalone) {
        (Some((composite, value)), Some((standalone, _)))
            if composite.created_at >= standalone.created_at =>
        {
            return Some(MetricValue::new(value, MetricSource::CompositeReport, Some(composite.id)));
        }
        (Some((composite, value)), None) => {
            return Some(MetricValue::new(value, MetricSource::CompositeReport, Some(composite.id)));
        }
        (_, Some((standalone, value))) => {
            return Some(MetricValue::new(value, MetricSource::StandaloneRecord, Some(standalone.id)));
        }
        (None, None) => {}
    }

    let snapshot = match metric {
        CompositeMetric::Yield => yield_prediction.map(|prediction| prediction.yield_per_ha),
        CompositeMetric::Biomass => biomass.map(|estimate| estimate.mean_biomass_t_ha),
        CompositeMetric::Moisture => None,
    };
    snapshot.map(|value| MetricValue::new(value, MetricSource::PredictionSnapshot, None))
}

/// Numeric forest figure: `forest_data[key]`, then the detailed report path
pub fn forest_number(
    history: &[AnalysisRecord],
    key: &str,
    report_path: &[&str],
) -> Option<MetricValue<f64>> {
    history
        .iter()
        .filter(|record| record.analysis_type == AnalysisKind::Forest)
        .find_map(|record| {
            let value = record
                .forest_number(key)
                .or_else(|| record.report_number(report_path))?;
            Some(MetricValue::new(value, MetricSource::CompositeReport, Some(record.id)))
        })
}

/// Textual forest figure: `forest_data[key]`, then the detailed report path
pub fn forest_label(
    history: &[AnalysisRecord],
    key: &str,
    report_path: &[&str],
) -> Option<MetricValue<String>> {
    history
        .iter()
        .filter(|record| record.analysis_type == AnalysisKind::Forest)
        .find_map(|record| {
            let value = record
                .forest_str(key)
                .or_else(|| record.report_str(report_path))?;
            Some(MetricValue::new(
                value.to_string(),
                MetricSource::CompositeReport,
                Some(record.id),
            ))
        })
}
