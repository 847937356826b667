//! Recommendations and problems from the newest detailed report.

use atlasfield_core::AnalysisRecord;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::models::metrics::Findings;

/// Lists of the newest record carrying a detailed report
///
/// Missing reports give empty lists; malformed entries are skipped.
pub fn extract_findings(history: &[AnalysisRecord]) -> Findings {
    let Some((record, report)) = history
        .iter()
        .find_map(|record| record.detailed_report().map(|report| (record, report)))
    else {
        return Findings::default();
    };

    Findings {
        recommendations: parse_list(report, "recommendations", record.id),
        problems: parse_list(report, "problems", record.id),
        source_analysis_id: Some(record.id),
    }
}

fn parse_list<T: DeserializeOwned>(report: &Value, key: &str, analysis_id: i64) -> Vec<T> {
    let Some(items) = report.get(key).and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match serde_json::from_value(item.clone()) {
            Ok(parsed) => Some(parsed),
            Err(err) => {
                debug!(analysis_id, key, error = %err, "Skipping malformed report entry");
                None
            }
        })
        .collect()
}
