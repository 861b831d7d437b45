//! Advisory completeness check ahead of export.
//!
//! # Invariants
//! - Every check runs independently; one failure never hides another.
//! - Node elevation is checked for presence only: `0.0` is a valid elevation.
//! - Length, area, width and slope must be present and non-zero.
//! - A layer absent from the store reports a single `Layer not found` entry.

use crate::model::link::Link;
use crate::model::node::Node;
use crate::model::subcatchment::Subcatchment;
use crate::model::{Feature, LayerKind};
use crate::repo::feature_repo::{
    FeatureRepository, LayerRecord, RepoError, RepoResult, SqliteFeatureRepository,
};
use log::info;
use rusqlite::Connection;

pub const LAYER_NOT_FOUND: &str = "Layer not found";

/// Per-layer error lists in `Nodes`, `Links`, `Subcatchments` order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletenessReport {
    layers: Vec<(LayerKind, Vec<String>)>,
}

impl CompletenessReport {
    /// Errors recorded for `layer`; empty when the layer passed.
    pub fn errors(&self, layer: LayerKind) -> &[String] {
        self.layers
            .iter()
            .find(|(kind, _)| *kind == layer)
            .map(|(_, errors)| errors.as_slice())
            .unwrap_or_default()
    }

    /// Layer name and errors, in report order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &[String])> {
        self.layers
            .iter()
            .map(|(kind, errors)| (kind.label(), errors.as_slice()))
    }

    pub fn total_errors(&self) -> usize {
        self.layers.iter().map(|(_, errors)| errors.len()).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.total_errors() == 0
    }
}

/// Checks the given layers; `None` marks a layer missing from the store.
pub fn validate(
    nodes: Option<&[Node]>,
    links: Option<&[Link]>,
    subcatchments: Option<&[Subcatchment]>,
) -> CompletenessReport {
    CompletenessReport {
        layers: vec![
            (LayerKind::Nodes, check_layer(nodes, node_errors)),
            (LayerKind::Links, check_layer(links, link_errors)),
            (
                LayerKind::Subcatchments,
                check_layer(subcatchments, subcatchment_errors),
            ),
        ],
    }
}

/// Loads whichever layers exist in `conn` and checks them.
pub fn validate_layer_completeness(conn: &Connection) -> RepoResult<CompletenessReport> {
    let nodes = load_optional_layer::<Node>(conn)?;
    let links = load_optional_layer::<Link>(conn)?;
    let subcatchments = load_optional_layer::<Subcatchment>(conn)?;

    let report = validate(
        nodes.as_deref(),
        links.as_deref(),
        subcatchments.as_deref(),
    );
    info!(
        "event=completeness_check module=service status=ok errors={}",
        report.total_errors()
    );
    Ok(report)
}

fn load_optional_layer<F>(conn: &Connection) -> RepoResult<Option<Vec<F>>>
where
    F: LayerRecord,
{
    match SqliteFeatureRepository::<F>::try_new(conn) {
        Ok(repo) => repo.list_features().map(Some),
        Err(RepoError::MissingLayer(_)) => Ok(None),
        Err(err) => Err(err),
    }
}

fn check_layer<F>(features: Option<&[F]>, errors_for: fn(&F, &mut Vec<String>)) -> Vec<String> {
    let Some(features) = features else {
        return vec![LAYER_NOT_FOUND.to_string()];
    };
    let mut errors = Vec::new();
    for feature in features {
        errors_for(feature, &mut errors);
    }
    errors
}

fn node_errors(node: &Node, errors: &mut Vec<String>) {
    let label = node.label();
    if node.has_blank_id() {
        errors.push(format!("{label}: missing ID"));
    }
    if node.invert_elev.is_none() {
        errors.push(format!("{label}: missing InvertElev"));
    }
}

fn link_errors(link: &Link, errors: &mut Vec<String>) {
    let label = link.label();
    if link.has_blank_id() {
        errors.push(format!("{label}: missing ID"));
    }
    if link.inlet_node.trim().is_empty() {
        errors.push(format!("{label}: missing InletNode"));
    }
    if link.outlet_node.trim().is_empty() {
        errors.push(format!("{label}: missing OutletNode"));
    }
    if is_zero_or_missing(link.length) {
        errors.push(format!("{label}: Length is 0 or missing"));
    }
}

fn subcatchment_errors(subcatchment: &Subcatchment, errors: &mut Vec<String>) {
    let label = subcatchment.label();
    if subcatchment.has_blank_id() {
        errors.push(format!("{label}: missing ID"));
    }
    for (field, value) in [
        ("Area", subcatchment.area),
        ("Width", subcatchment.width),
        ("Slope", subcatchment.slope),
    ] {
        if is_zero_or_missing(value) {
            errors.push(format!("{label}: {field} is 0 or missing"));
        }
    }
}

fn is_zero_or_missing(value: Option<f64>) -> bool {
    value.map_or(true, |value| value == 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty<T>() -> Option<&'static [T]> {
        Some(&[])
    }

    #[test]
    fn null_elevation_is_one_error_and_zero_is_valid() {
        let mut missing = Node::new(1, "J1", 0.0, 0.0);
        missing.invert_elev = None;
        let mut zero = Node::new(2, "J2", 0.0, 0.0);
        zero.invert_elev = Some(0.0);

        let report = validate(Some([missing, zero].as_slice()), empty(), empty());
        assert_eq!(report.errors(LayerKind::Nodes), ["J1: missing InvertElev"]);
        assert!(report.errors(LayerKind::Links).is_empty());
    }

    #[test]
    fn link_checks_are_independent() {
        let link = Link::new(4, "", vec![(0.0, 0.0), (1.0, 0.0)]);
        let report = validate(empty(), Some([link].as_slice()), empty());
        assert_eq!(
            report.errors(LayerKind::Links),
            [
                "fid=4: missing ID",
                "fid=4: missing InletNode",
                "fid=4: missing OutletNode",
                "fid=4: Length is 0 or missing",
            ]
        );
    }

    #[test]
    fn subcatchment_zero_values_are_reported() {
        let mut sub = Subcatchment::new(1, "S1", vec![(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]);
        sub.area = Some(0.0);
        sub.width = Some(12.5);
        sub.slope = None;

        let report = validate(empty(), empty(), Some([sub].as_slice()));
        assert_eq!(
            report.errors(LayerKind::Subcatchments),
            ["S1: Area is 0 or missing", "S1: Slope is 0 or missing"]
        );
    }

    #[test]
    fn missing_layers_report_layer_not_found() {
        let report = validate(None, empty(), None);
        assert_eq!(report.errors(LayerKind::Nodes), [LAYER_NOT_FOUND]);
        assert!(report.errors(LayerKind::Links).is_empty());
        assert_eq!(report.total_errors(), 2);

        let names = report.iter().map(|(name, _)| name).collect::<Vec<_>>();
        assert_eq!(names, ["Nodes", "Links", "Subcatchments"]);
    }
}
