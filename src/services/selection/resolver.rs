//! Active Site Resolution
//!
//! Pure precedence rules: navigation parameter, then stored id, then the
//! first loaded site, then nothing. Candidates not present in the loaded set
//! are skipped.

use atlasfield_core::SiteId;
use serde::{Deserialize, Serialize};

/// Which candidate source won
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionSource {
    Navigation,
    Storage,
    Fallback,
    Empty,
}

/// Outcome of reconciling the candidate sources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub site_id: Option<SiteId>,
    pub source: SelectionSource,
}

/// Resolve the active site id from the candidates, in order of precedence
pub fn resolve_active_site(
    navigation: Option<SiteId>,
    stored: Option<SiteId>,
    loaded: &[SiteId],
) -> Resolution {
    let present = |id: &SiteId| loaded.contains(id);

    if let Some(id) = navigation.filter(present) {
        return Resolution {
            site_id: Some(id),
            source: SelectionSource::Navigation,
        };
    }
    if let Some(id) = stored.filter(present) {
        return Resolution {
            site_id: Some(id),
            source: SelectionSource::Storage,
        };
    }
    match loaded.first() {
        Some(id) => Resolution {
            site_id: Some(*id),
            source: SelectionSource::Fallback,
        },
        None => Resolution {
            site_id: None,
            source: SelectionSource::Empty,
        },
    }
}

/// Parse a navigation parameter into a site id
pub fn parse_site_param(param: Option<&str>) -> Option<SiteId> {
    param.and_then(|raw| raw.trim().parse().ok())
}
