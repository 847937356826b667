//! Derived Metrics Builder
//!
//! Pure projections of an aggregated bundle into chart and summary values.
//! No I/O and no state; every function is total over its input.

pub mod findings;
pub mod headline;
pub mod lookup;
pub mod series;

pub use findings::extract_findings;
pub use headline::{headline, percent_label};
pub use lookup::{composite_metric, forest_label, forest_number, latest_by_kind, latest_vegetation_index};
pub use series::{history_series, trend_summary, MAX_SERIES_POINTS};

use atlasfield_core::Site;

use crate::models::dashboard::SiteAnalysisBundle;
use crate::models::metrics::DerivedMetrics;

/// Everything derived from one bundle
pub fn derive_metrics(site: Option<&Site>, bundle: &SiteAnalysisBundle) -> DerivedMetrics {
    DerivedMetrics {
        history_series: history_series(&bundle.history),
        trend: trend_summary(bundle.trends.as_ref()),
        findings: extract_findings(&bundle.history),
        headline: headline(site, bundle),
    }
}
