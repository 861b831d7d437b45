//! Command-level API behind the `swmmkit` subcommands.
//!
//! # Responsibility
//! - Turn one CLI invocation into one core call against the project store.
//! - Convert every core error into a `CommandResponse` failure envelope.
//!
//! # Invariants
//! - Functions here never panic and never return `Err`.
//! - Configuration problems (missing layer, unreadable DEM, bad CRS) are
//!   reported before any layer is written.

use log::warn;
use rusqlite::Connection;
use std::path::Path;
use swmmkit_core::service::derive::{compute_lengths, compute_subcatchment_params, sync_elevations};
use swmmkit_core::service::ids::generate_auto_ids;
use swmmkit_core::service::project::{initialize_project, validate_crs_is_projected};
use swmmkit_core::service::topology::resolve_topology;
use swmmkit_core::service::validate::validate_layer_completeness;
use swmmkit_core::{
    export_to_file, extract_network, load_dem, FeatureDefaults, FeatureRepository, LayerKind,
    Link, Node, ProjectCrs, RepoError, SqliteFeatureRepository, SqliteLinkRepository,
    SqliteNodeRepository, SqliteSubcatchmentRepository, Subcatchment,
};

/// Outcome of one command, printed by `main`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResponse {
    pub ok: bool,
    pub message: String,
}

impl CommandResponse {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

fn failed(command: &str, err: impl std::fmt::Display) -> CommandResponse {
    warn!("event=command module=cli status=error command={command}");
    CommandResponse::failure(format!("{command} failed: {err}"))
}

pub fn init_project(output_dir: &Path, crs: &ProjectCrs) -> CommandResponse {
    match initialize_project(output_dir, crs) {
        Ok(path) => CommandResponse::success(format!(
            "Project initialized: {}\nLayers: swmm_nodes, swmm_links, swmm_subcatchments",
            path.display()
        )),
        Err(message) => CommandResponse::failure(message),
    }
}

pub fn check_crs(conn: &Connection) -> CommandResponse {
    let outcome = validate_crs_is_projected(conn);
    CommandResponse {
        ok: outcome.ok,
        message: outcome.message,
    }
}

pub fn add_node(
    conn: &Connection,
    id: &str,
    (x, y): (f64, f64),
    defaults: &FeatureDefaults,
) -> CommandResponse {
    let mut node = Node::new(0, id.trim(), x, y);
    node.max_depth = Some(defaults.max_depth);
    insert("add-node", conn, &node)
}

pub fn add_link(
    conn: &Connection,
    id: &str,
    vertices: Vec<(f64, f64)>,
    defaults: &FeatureDefaults,
) -> CommandResponse {
    if vertices.len() < 2 {
        return CommandResponse::failure("add-link failed: a link needs at least 2 vertices");
    }
    let mut link = Link::new(0, id.trim(), vertices);
    link.manning_n = Some(defaults.manning_n);
    link.in_offset = Some(0.0);
    link.out_offset = Some(0.0);
    insert("add-link", conn, &link)
}

pub fn add_subcatchment(
    conn: &Connection,
    id: &str,
    vertices: Vec<(f64, f64)>,
    outlet: &str,
    rain_gage: &str,
    defaults: &FeatureDefaults,
) -> CommandResponse {
    if vertices.len() < 3 {
        return CommandResponse::failure(
            "add-subcatchment failed: a subcatchment needs at least 3 vertices",
        );
    }
    let mut subcatchment = Subcatchment::new(0, id.trim(), vertices);
    subcatchment.outlet = outlet.trim().to_string();
    subcatchment.rain_gage = rain_gage.trim().to_string();
    subcatchment.perc_imperv = Some(defaults.perc_imperv);
    insert("add-subcatchment", conn, &subcatchment)
}

fn insert<F>(command: &str, conn: &Connection, feature: &F) -> CommandResponse
where
    F: swmmkit_core::repo::feature_repo::LayerRecord,
{
    let result = SqliteFeatureRepository::<F>::try_new(conn)
        .and_then(|repo| repo.insert_feature(feature));
    match result {
        Ok(fid) => CommandResponse::success(format!(
            "{} feature added (fid={fid}).",
            F::LAYER.label()
        )),
        Err(err) => failed(command, err),
    }
}

/// One line per feature: `fid`, ID and the layer's key attributes.
pub fn list_layer(conn: &Connection, layer: LayerKind) -> CommandResponse {
    let lines = match layer {
        LayerKind::Nodes => list_with::<Node>(conn, |node| {
            format!(
                "{}\t{}\telev={}\tdepth={}",
                node.fid,
                node.id,
                show(node.invert_elev),
                show(node.max_depth)
            )
        }),
        LayerKind::Links => list_with::<Link>(conn, |link| {
            format!(
                "{}\t{}\t{} -> {}\tlength={}",
                link.fid,
                link.id,
                link.inlet_node,
                link.outlet_node,
                show(link.length)
            )
        }),
        LayerKind::Subcatchments => list_with::<Subcatchment>(conn, |sub| {
            format!(
                "{}\t{}\toutlet={}\tarea={}\twidth={}\tslope={}",
                sub.fid,
                sub.id,
                sub.outlet,
                show(sub.area),
                show(sub.width),
                show(sub.slope)
            )
        }),
    };

    match lines {
        Ok(lines) if lines.is_empty() => {
            CommandResponse::success(format!("{}: no features.", layer.label()))
        }
        Ok(lines) => CommandResponse::success(format!(
            "{} ({}):\n{}",
            layer.label(),
            lines.len(),
            lines.join("\n")
        )),
        Err(err) => failed("list", err),
    }
}

fn list_with<F>(conn: &Connection, render: impl Fn(&F) -> String) -> Result<Vec<String>, RepoError>
where
    F: swmmkit_core::repo::feature_repo::LayerRecord,
{
    let repo = SqliteFeatureRepository::<F>::try_new(conn)?;
    Ok(repo.list_features()?.iter().map(render).collect())
}

fn show(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |value| value.to_string())
}

pub fn generate_ids(conn: &Connection) -> CommandResponse {
    let result = SqliteNodeRepository::try_new(conn).and_then(|nodes| {
        let links = SqliteLinkRepository::try_new(conn)?;
        let subcatchments = SqliteSubcatchmentRepository::try_new(conn)?;
        generate_auto_ids(&nodes, &links, &subcatchments)
    });
    match result {
        Ok(generated) => CommandResponse::success(format!(
            "Generated IDs:\nNodes: {}\nLinks: {}\nSubcatchments: {}",
            generated.nodes, generated.links, generated.subcatchments
        )),
        Err(err) => failed("ids", err),
    }
}

pub fn sync_node_elevations(conn: &Connection, dem_path: &Path) -> CommandResponse {
    let dem = match load_dem(dem_path) {
        Ok(dem) => dem,
        Err(err) => return failed("elevations", err),
    };
    match SqliteNodeRepository::try_new(conn).and_then(|nodes| sync_elevations(&nodes, &dem)) {
        Ok(summary) => CommandResponse::success(summary.message()),
        Err(err) => failed("elevations", err),
    }
}

pub fn snap_links(conn: &Connection, tolerance_m: f64) -> CommandResponse {
    if !(tolerance_m.is_finite() && tolerance_m >= 0.0) {
        return CommandResponse::failure(format!(
            "snap failed: tolerance must be a non-negative number, got {tolerance_m}"
        ));
    }
    let result = SqliteLinkRepository::try_new(conn).and_then(|links| {
        let nodes = SqliteNodeRepository::try_new(conn)?;
        resolve_topology(&links, &nodes, tolerance_m)
    });
    match result {
        Ok(snapped) => CommandResponse::success(format!(
            "Topology resolved for {} link(s) within {tolerance_m} m.",
            snapped.len()
        )),
        Err(err) => failed("snap", err),
    }
}

pub fn link_lengths(conn: &Connection) -> CommandResponse {
    match SqliteLinkRepository::try_new(conn).and_then(|links| compute_lengths(&links)) {
        Ok(lengths) => CommandResponse::success(format!(
            "Lengths computed for {} link(s).",
            lengths.len()
        )),
        Err(err) => failed("lengths", err),
    }
}

pub fn subcatchment_params(
    conn: &Connection,
    dem_path: &Path,
    sample_count: usize,
) -> CommandResponse {
    let dem = match load_dem(dem_path) {
        Ok(dem) => dem,
        Err(err) => return failed("subcatchments", err),
    };
    let result = SqliteSubcatchmentRepository::try_new(conn)
        .and_then(|subcatchments| compute_subcatchment_params(&subcatchments, &dem, sample_count));
    match result {
        Ok(count) => CommandResponse::success(format!(
            "Area, slope and width computed for {count} subcatchment(s)."
        )),
        Err(err) => failed("subcatchments", err),
    }
}

/// Reports completeness problems; `ok` is false while any remain.
pub fn validate(conn: &Connection) -> CommandResponse {
    let report = match validate_layer_completeness(conn) {
        Ok(report) => report,
        Err(err) => return failed("validate", err),
    };
    if report.is_complete() {
        return CommandResponse::success("All layers are complete.");
    }

    let mut lines = vec![format!("{} problem(s) found:", report.total_errors())];
    for (layer, errors) in report.iter().filter(|(_, errors)| !errors.is_empty()) {
        lines.push(format!("[{layer}]"));
        lines.extend(errors.iter().map(|error| format!("  {error}")));
    }
    CommandResponse::failure(lines.join("\n"))
}

pub fn export(conn: &Connection, output: &Path, title: &str) -> CommandResponse {
    match extract_network(conn) {
        Ok(records) => {
            let outcome = export_to_file(output, title, &records);
            CommandResponse {
                ok: outcome.ok,
                message: outcome.message,
            }
        }
        Err(err) => CommandResponse::failure(format!("Export failed:\n{err}")),
    }
}

/// Parses `x,y;x,y;...` into vertices.
pub fn parse_vertices(text: &str) -> Result<Vec<(f64, f64)>, String> {
    text.split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(parse_point)
        .collect()
}

/// Parses a single `x,y` pair.
pub fn parse_point(text: &str) -> Result<(f64, f64), String> {
    let (x, y) = text
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{text}`"))?;
    let parse = |value: &str| {
        value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .ok_or_else(|| format!("invalid coordinate `{}` in `{text}`", value.trim()))
    };
    Ok((parse(x)?, parse(y)?))
}
