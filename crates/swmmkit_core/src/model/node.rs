//! Node (junction) domain model.

use super::{Feature, FeatureId, LayerKind};
use geo::Point;
use serde::{Deserialize, Serialize};

/// Drainage junction point (manhole or inlet).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub fid: FeatureId,
    pub id: String,
    /// Digitized position in the project CRS (meters).
    pub position: Point<f64>,
    /// Invert elevation in meters; `None` until sampled from the DEM.
    pub invert_elev: Option<f64>,
    /// Maximum depth in meters.
    pub max_depth: Option<f64>,
    /// Attribute copy of the position, written by elevation sync.
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl Node {
    /// Creates a node with unset derived attributes.
    pub fn new(fid: FeatureId, id: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            fid,
            id: id.into(),
            position: Point::new(x, y),
            invert_elev: None,
            max_depth: None,
            x: None,
            y: None,
        }
    }
}

impl Feature for Node {
    const LAYER: LayerKind = LayerKind::Nodes;

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
