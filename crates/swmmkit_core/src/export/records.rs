//! Transport records handed from the feature store to the serializer.

use crate::geometry::boundary_vertices;
use crate::model::link::Link;
use crate::model::node::Node;
use crate::model::subcatchment::Subcatchment;
use crate::repo::feature_repo::{
    FeatureRepository, LayerRecord, RepoError, RepoResult, SqliteFeatureRepository,
};
use rusqlite::Connection;

#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub id: String,
    pub invert_elev: Option<f64>,
    pub max_depth: Option<f64>,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkRecord {
    pub id: String,
    pub inlet_node: String,
    pub outlet_node: String,
    pub length: Option<f64>,
    pub manning_n: Option<f64>,
    pub in_offset: Option<f64>,
    pub out_offset: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubcatchmentRecord {
    pub id: String,
    pub rain_gage: String,
    pub outlet: String,
    pub area: Option<f64>,
    pub perc_imperv: Option<f64>,
    pub width: Option<f64>,
    pub slope: Option<f64>,
    /// Ring vertices in storage order, closing vertex included.
    pub vertices: Vec<(f64, f64)>,
}

/// Everything the serializer needs, layer by layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkRecords {
    pub nodes: Vec<NodeRecord>,
    pub links: Vec<LinkRecord>,
    pub subcatchments: Vec<SubcatchmentRecord>,
}

impl From<&Node> for NodeRecord {
    /// Unset or zero X/Y attributes fall back to the node geometry.
    fn from(node: &Node) -> Self {
        let non_zero = |value: Option<f64>| value.filter(|value| *value != 0.0);
        Self {
            id: node.id.clone(),
            invert_elev: node.invert_elev,
            max_depth: node.max_depth,
            x: non_zero(node.x).unwrap_or(node.position.x()),
            y: non_zero(node.y).unwrap_or(node.position.y()),
        }
    }
}

impl From<&Link> for LinkRecord {
    fn from(link: &Link) -> Self {
        Self {
            id: link.id.clone(),
            inlet_node: link.inlet_node.clone(),
            outlet_node: link.outlet_node.clone(),
            length: link.length,
            manning_n: link.manning_n,
            in_offset: link.in_offset,
            out_offset: link.out_offset,
        }
    }
}

impl From<&Subcatchment> for SubcatchmentRecord {
    fn from(subcatchment: &Subcatchment) -> Self {
        Self {
            id: subcatchment.id.clone(),
            rain_gage: subcatchment.rain_gage.clone(),
            outlet: subcatchment.outlet.clone(),
            area: subcatchment.area,
            perc_imperv: subcatchment.perc_imperv,
            width: subcatchment.width,
            slope: subcatchment.slope,
            vertices: boundary_vertices(&subcatchment.boundary),
        }
    }
}

pub fn get_nodes_data<R>(nodes: &R) -> RepoResult<Vec<NodeRecord>>
where
    R: FeatureRepository<Node> + ?Sized,
{
    Ok(nodes.list_features()?.iter().map(NodeRecord::from).collect())
}

pub fn get_links_data<R>(links: &R) -> RepoResult<Vec<LinkRecord>>
where
    R: FeatureRepository<Link> + ?Sized,
{
    Ok(links.list_features()?.iter().map(LinkRecord::from).collect())
}

pub fn get_subcatchments_data<R>(subcatchments: &R) -> RepoResult<Vec<SubcatchmentRecord>>
where
    R: FeatureRepository<Subcatchment> + ?Sized,
{
    Ok(subcatchments
        .list_features()?
        .iter()
        .map(SubcatchmentRecord::from)
        .collect())
}

/// Extracts all layers of a project store. A missing layer exports as empty.
pub fn extract_network(conn: &Connection) -> RepoResult<NetworkRecords> {
    Ok(NetworkRecords {
        nodes: extract_layer::<Node, _>(conn, |repo| get_nodes_data(repo))?,
        links: extract_layer::<Link, _>(conn, |repo| get_links_data(repo))?,
        subcatchments: extract_layer::<Subcatchment, _>(conn, |repo| {
            get_subcatchments_data(repo)
        })?,
    })
}

fn extract_layer<'conn, F, T>(
    conn: &'conn Connection,
    extract: impl FnOnce(&SqliteFeatureRepository<'conn, F>) -> RepoResult<Vec<T>>,
) -> RepoResult<Vec<T>>
where
    F: LayerRecord,
{
    match SqliteFeatureRepository::<F>::try_new(conn) {
        Ok(repo) => extract(&repo),
        Err(RepoError::MissingLayer(_)) => Ok(Vec::new()),
        Err(err) => Err(err),
    }
}
