//! Subcatchment domain model.

use super::{Feature, FeatureId, LayerKind};
use geo::{LineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};

/// Land-area polygon draining to an outlet node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subcatchment {
    pub fid: FeatureId,
    pub id: String,
    pub boundary: MultiPolygon<f64>,
    /// Rain gage name; may stay blank.
    pub rain_gage: String,
    /// Outlet node (or subcatchment) name; may stay blank.
    pub outlet: String,
    /// Area in hectares.
    pub area: Option<f64>,
    pub perc_imperv: Option<f64>,
    /// Characteristic width in meters.
    pub width: Option<f64>,
    /// Representative slope in percent.
    pub slope: Option<f64>,
}

impl Subcatchment {
    /// Creates a single-part subcatchment from an exterior ring.
    ///
    /// The ring is closed automatically when the last vertex differs from the
    /// first.
    pub fn new(fid: FeatureId, id: impl Into<String>, exterior: Vec<(f64, f64)>) -> Self {
        let polygon = Polygon::new(LineString::from(exterior), Vec::new());
        Self::with_boundary(fid, id, MultiPolygon::new(vec![polygon]))
    }

    pub fn with_boundary(fid: FeatureId, id: impl Into<String>, boundary: MultiPolygon<f64>) -> Self {
        Self {
            fid,
            id: id.into(),
            boundary,
            rain_gage: String::new(),
            outlet: String::new(),
            area: None,
            perc_imperv: None,
            width: None,
            slope: None,
        }
    }
}

impl Feature for Subcatchment {
    const LAYER: LayerKind = LayerKind::Subcatchments;

    fn fid(&self) -> FeatureId {
        self.fid
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}
