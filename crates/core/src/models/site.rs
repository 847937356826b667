//! Site Models
//!
//! A monitored site is either an agricultural field or a forest. Type-specific
//! attributes live in a tagged [`SiteDetails`] variant so consumers branch once
//! on the discriminator instead of probing nullable columns.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Remote identifier of a site
pub type SiteId = i64;

/// Type discriminator of a monitored site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SiteKind {
    #[serde(rename = "FIELD", alias = "field")]
    Field,
    #[serde(rename = "FOREST", alias = "forest")]
    Forest,
}

impl fmt::Display for SiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteKind::Field => write!(f, "FIELD"),
            SiteKind::Forest => write!(f, "FOREST"),
        }
    }
}

impl FromStr for SiteKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FIELD" => Ok(SiteKind::Field),
            "FOREST" => Ok(SiteKind::Forest),
            other => Err(CoreError::parse(format!("unknown site type: {}", other))),
        }
    }
}

/// GeoJSON polygon outlining the site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPolygon {
    /// GeoJSON geometry type, expected to be "Polygon"
    #[serde(rename = "type")]
    pub geometry_type: String,
    /// Linear rings of `[lon, lat]` positions; the first ring is the outline
    pub coordinates: Vec<Vec<Vec<f64>>>,
}

impl GeoPolygon {
    /// Bounding box `(min_lon, min_lat, max_lon, max_lat)` of the outer ring.
    ///
    /// Returns `None` for an empty ring or positions without two coordinates.
    pub fn bbox(&self) -> Option<(f64, f64, f64, f64)> {
        let ring = self.coordinates.first()?;
        if ring.is_empty() {
            return None;
        }

        let mut bounds = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        for position in ring {
            let (lon, lat) = match position.as_slice() {
                [lon, lat, ..] => (*lon, *lat),
                _ => return None,
            };
            bounds.0 = bounds.0.min(lon);
            bounds.1 = bounds.1.min(lat);
            bounds.2 = bounds.2.max(lon);
            bounds.3 = bounds.3.max(lat);
        }
        Some(bounds)
    }
}

/// Attributes only meaningful for agricultural fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldAttributes {
    pub crop_type: Option<String>,
    pub planting_date: Option<NaiveDateTime>,
}

/// Attributes only meaningful for forests
///
/// `forest_type` may be filled in by the service after the first forest analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestAttributes {
    /// coniferous, deciduous, mixed
    pub forest_type: Option<String>,
    pub tree_species: Option<String>,
    /// none, national_park, reserve, ...
    pub protected_status: Option<String>,
}

/// Type-specific part of a site, tagged by `site_type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "site_type")]
pub enum SiteDetails {
    #[serde(rename = "FIELD", alias = "field")]
    Field(FieldAttributes),
    #[serde(rename = "FOREST", alias = "forest")]
    Forest(ForestAttributes),
}

/// A monitored site as returned by the site listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: SiteId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub geometry: GeoPolygon,
    #[serde(default)]
    pub area_hectares: Option<f64>,
    #[serde(flatten)]
    pub details: SiteDetails,
    /// Cached vegetation index of the latest relevant analysis
    #[serde(default)]
    pub latest_ndvi: Option<f64>,
    #[serde(default)]
    pub latest_analysis_date: Option<NaiveDateTime>,
    /// Unread alerts for this site
    #[serde(default)]
    pub alert_count: u32,
    /// Cached burn ratio of the latest forest analysis
    #[serde(default)]
    pub latest_nbr: Option<f64>,
    #[serde(default)]
    pub fire_risk_level: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Site {
    /// Type discriminator derived from the tagged details
    pub fn kind(&self) -> SiteKind {
        match self.details {
            SiteDetails::Field(_) => SiteKind::Field,
            SiteDetails::Forest(_) => SiteKind::Forest,
        }
    }

    /// Crop type, for fields only
    pub fn crop_type(&self) -> Option<&str> {
        match &self.details {
            SiteDetails::Field(field) => field.crop_type.as_deref(),
            SiteDetails::Forest(_) => None,
        }
    }

    /// Forest type, for forests only
    pub fn forest_type(&self) -> Option<&str> {
        match &self.details {
            SiteDetails::Forest(forest) => forest.forest_type.as_deref(),
            SiteDetails::Field(_) => None,
        }
    }

    /// Cached health score on a 0-100 scale, unrounded
    pub fn health_score(&self) -> Option<f64> {
        self.latest_ndvi.map(|ndvi| ndvi * 100.0)
    }
}
