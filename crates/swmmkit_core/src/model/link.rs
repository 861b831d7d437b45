//! Link (conduit) domain model.

use super::{Feature, FeatureId, LayerKind};
use geo::LineString;
use serde::{Deserialize, Serialize};

/// Conduit connecting two nodes.
///
/// `inlet_node` / `outlet_node` name nodes by ID; an empty string marks an
/// endpoint that did not resolve to any node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub fid: FeatureId,
    pub id: String,
    pub path: LineString<f64>,
    pub inlet_node: String,
    pub outlet_node: String,
    /// Planar length in meters.
    pub length: Option<f64>,
    /// Manning roughness coefficient.
    pub manning_n: Option<f64>,
    pub in_offset: Option<f64>,
    pub out_offset: Option<f64>,
}

impl Link {
    /// Creates a link from its vertex sequence with unset attributes.
    pub fn new(fid: FeatureId, id: impl Into<String>, vertices: Vec<(f64, f64)>) -> Self {
        Self {
            fid,
            id: id.into(),
            path: LineString::from(vertices),
            inlet_node: String::new(),
            outlet_node: String::new(),
            length: None,
            manning_n: None,
            in_offset: None,
            out_offset: None,
        }
    }
}

impl Feature for Link {
    const LAYER: LayerKind = LayerKind::Links;

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
