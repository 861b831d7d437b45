//! Drainage network domain model.
//!
//! # Responsibility
//! - Define the three typed feature collections (nodes, links, subcatchments).
//! - Provide the identity helpers shared by every batch operation.
//!
//! # Invariants
//! - `fid` is assigned by the feature store and never reused.
//! - `id` may be blank until ID generation fills it; it is never `None`.
//! - Link node references are plain names, empty when unresolved.

pub mod crs;
pub mod link;
pub mod node;
pub mod subcatchment;

use serde::{Deserialize, Serialize};

/// Store-assigned row identifier of a feature.
pub type FeatureId = i64;

/// The three SWMM layers held by a project store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    Nodes,
    Links,
    Subcatchments,
}

impl LayerKind {
    /// All layers in export order.
    pub const ALL: [LayerKind; 3] = [Self::Nodes, Self::Links, Self::Subcatchments];

    /// Human-readable layer name used in reports.
    pub fn label(self) -> &'static str {
        match self {
            Self::Nodes => "Nodes",
            Self::Links => "Links",
            Self::Subcatchments => "Subcatchments",
        }
    }

    /// Backing table name in the project store.
    pub fn table_name(self) -> &'static str {
        match self {
            Self::Nodes => "swmm_nodes",
            Self::Links => "swmm_links",
            Self::Subcatchments => "swmm_subcatchments",
        }
    }

    /// Prefix for generated identifiers (`N1`, `L1`, `S1`).
    pub fn id_prefix(self) -> &'static str {
        match self {
            Self::Nodes => "N",
            Self::Links => "L",
            Self::Subcatchments => "S",
        }
    }
}

/// Identity accessors common to all feature kinds.
pub trait Feature {
    const LAYER: LayerKind;

    fn fid(&self) -> FeatureId;
    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);

    /// Returns whether the identifier is blank after trimming.
    fn has_blank_id(&self) -> bool {
        self.id().trim().is_empty()
    }

    /// Result-map key: the trimmed ID, or the fid when the ID is blank.
    fn key(&self) -> String {
        let id = self.id().trim();
        if id.is_empty() {
            self.fid().to_string()
        } else {
            id.to_string()
        }
    }

    /// Report label: the trimmed ID, or `fid=<n>` when the ID is blank.
    fn label(&self) -> String {
        let id = self.id().trim();
        if id.is_empty() {
            format!("fid={}", self.fid())
        } else {
            id.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::node::Node;
    use super::{Feature, LayerKind};

    #[test]
    fn key_and_label_fall_back_to_fid() {
        let mut node = Node::new(7, "", 0.0, 0.0);
        assert_eq!(node.key(), "7");
        assert_eq!(node.label(), "fid=7");

        node.set_id(" J1 ".to_string());
        assert_eq!(node.key(), "J1");
        assert_eq!(node.label(), "J1");
    }

    #[test]
    fn layer_prefixes_are_distinct() {
        let prefixes = LayerKind::ALL.map(LayerKind::id_prefix);
        assert_eq!(prefixes, ["N", "L", "S"]);
    }
}
