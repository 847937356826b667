//! History chart series and trend pass-through.

use atlasfield_core::{AnalysisRecord, TrendReport, MIN_TREND_RECORDS};

use crate::models::metrics::{SeriesPoint, TrendSummary};

/// Maximum number of points plotted in the history chart
pub const MAX_SERIES_POINTS: usize = 10;

/// Chartable records scaled to 0-100, oldest first
pub fn history_series(history: &[AnalysisRecord]) -> Vec<SeriesPoint> {
    let mut series: Vec<SeriesPoint> = history
        .iter()
        .filter(|record| record.analysis_type.is_chartable())
        .filter_map(|record| {
            let mean = record.mean_value?;
            Some(SeriesPoint {
                analysis_id: record.id,
                kind: record.analysis_type,
                date: record.created_at,
                value: mean * 100.0,
            })
        })
        .take(MAX_SERIES_POINTS)
        .collect();
    series.reverse();
    series
}

/// Expose a trend report, or the insufficient-data sentinel
pub fn trend_summary(report: Option<&TrendReport>) -> TrendSummary {
    let Some(report) = report else {
        return TrendSummary::Insufficient {
            message: TrendReport::default_insufficient_message(),
        };
    };

    if !report.has_sufficient_data || report.analyses.len() < MIN_TREND_RECORDS {
        return TrendSummary::Insufficient {
            message: report
                .message
                .clone()
                .unwrap_or_else(TrendReport::default_insufficient_message),
        };
    }

    TrendSummary::Available {
        direction: report.overall_trend,
        points: report.analyses.clone(),
        avg_ndvi_change: report.avg_ndvi_change,
        avg_yield_change: report.avg_yield_change,
        avg_carbon_change: report.avg_carbon_change,
    }
}
