//! Link-to-node topology resolution.
//!
//! # Responsibility
//! - Infer each link's inlet and outlet node from its first and last vertex.
//!
//! # Invariants
//! - The node index is rebuilt on every call; nothing is cached across calls.
//! - An endpoint farther than the tolerance from every node resolves to "".
//! - Links with fewer than two vertices, or with neither endpoint resolved,
//!   are left untouched and absent from the result.
//! - When two nodes are equidistant from an endpoint either may be chosen.

use crate::geometry::{endpoints, point_distance};
use crate::model::link::Link;
use crate::model::node::Node;
use crate::model::Feature;
use crate::repo::feature_repo::{FeatureRepository, RepoResult};
use geo::Point;
use log::info;
use rstar::primitives::GeomWithData;
use rstar::RTree;
use std::collections::BTreeMap;

/// Default snap tolerance in meters.
pub const DEFAULT_SNAP_TOLERANCE_M: f64 = 10.0;

/// Resolved `(inlet, outlet)` node IDs keyed by link key.
pub type SnapResult = BTreeMap<String, (String, String)>;

type IndexedNode = GeomWithData<[f64; 2], usize>;

/// Nearest-neighbor index over node positions.
pub struct NodeIndex<'a> {
    nodes: &'a [Node],
    tree: RTree<IndexedNode>,
}

impl<'a> NodeIndex<'a> {
    pub fn build(nodes: &'a [Node]) -> Self {
        let entries = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| GeomWithData::new([node.position.x(), node.position.y()], index))
            .collect();
        Self {
            nodes,
            tree: RTree::bulk_load(entries),
        }
    }

    /// Returns the ID of the nearest node within `tolerance`, or "".
    ///
    /// A matched node whose own ID is blank also yields "".
    pub fn nearest_id(&self, point: Point<f64>, tolerance: f64) -> String {
        let Some(entry) = self.tree.nearest_neighbor(&[point.x(), point.y()]) else {
            return String::new();
        };
        let node = &self.nodes[entry.data];
        if point_distance(point, node.position) <= tolerance {
            node.id.trim().to_string()
        } else {
            String::new()
        }
    }
}

/// Resolves endpoints for `links` in memory and writes matched IDs back.
pub fn snap_links(links: &mut [Link], nodes: &[Node], tolerance: f64) -> SnapResult {
    let index = NodeIndex::build(nodes);
    let mut snapped = SnapResult::new();

    for link in links.iter_mut() {
        let Some((start, end)) = endpoints(&link.path) else {
            continue;
        };

        let inlet = index.nearest_id(start, tolerance);
        let outlet = index.nearest_id(end, tolerance);
        if inlet.is_empty() && outlet.is_empty() {
            continue;
        }

        link.inlet_node = inlet.clone();
        link.outlet_node = outlet.clone();
        snapped.insert(link.key(), (inlet, outlet));
    }

    snapped
}

/// Resolves link topology against the node layer and commits the result.
///
/// # Side effects
/// - Rewrites `inlet_node` / `outlet_node` of every resolved link.
/// - Emits a `topology_resolve` logging event.
pub fn resolve_topology<L, N>(links: &L, nodes: &N, tolerance: f64) -> RepoResult<SnapResult>
where
    L: FeatureRepository<Link> + ?Sized,
    N: FeatureRepository<Node> + ?Sized,
{
    let node_features = nodes.list_features()?;
    let mut link_features = links.list_features()?;

    let snapped = snap_links(&mut link_features, &node_features, tolerance);
    links.commit_features(&link_features)?;

    info!(
        "event=topology_resolve module=service status=ok links={} nodes={} resolved={} tolerance_m={}",
        link_features.len(),
        node_features.len(),
        snapped.len(),
        tolerance
    );
    Ok(snapped)
}
