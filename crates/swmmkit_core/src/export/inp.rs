//! SWMM 5.2 `.inp` rendering.
//!
//! Sections are emitted in a fixed order, each followed by a blank line, with
//! fixed-width columns that any SWMM 5.2 reader parses unchanged. Missing or
//! non-finite numbers are replaced by the fallback constants below.

use super::records::{LinkRecord, NetworkRecords, NodeRecord, SubcatchmentRecord};
use log::{error, info};
use std::path::Path;

pub const DEFAULT_TITLE: &str = "SWMM Drainage Project";

pub const FALLBACK_ELEVATION: f64 = 0.0;
pub const FALLBACK_MAX_DEPTH: f64 = 1.0;
pub const FALLBACK_LENGTH: f64 = 100.0;
pub const FALLBACK_ROUGHNESS: f64 = 0.009;
pub const FALLBACK_OFFSET: f64 = 0.0;
pub const FALLBACK_AREA: f64 = 1.0;
pub const FALLBACK_PERC_IMPERV: f64 = 0.0;
pub const FALLBACK_WIDTH: f64 = 50.0;
pub const FALLBACK_SLOPE: f64 = 0.01;

const FALLBACK_NODE_NAME: &str = "NODE";
const FALLBACK_LINK_NAME: &str = "LINK";
const FALLBACK_SUBCATCHMENT_NAME: &str = "SUB";

/// Result of writing an `.inp` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    pub ok: bool,
    pub message: String,
}

/// Renders the network as SWMM 5.2 input text.
pub fn serialize(
    title: &str,
    nodes: &[NodeRecord],
    links: &[LinkRecord],
    subcatchments: &[SubcatchmentRecord],
) -> String {
    let mut lines: Vec<String> = Vec::new();

    section(&mut lines, "[TITLE]", &[], [format!(";;{title}")]);

    section(
        &mut lines,
        "[OPTIONS]",
        &[";;Option             Value"],
        [
            "FLOW_UNITS           CMS",
            "INFILTRATION         GREEN_AMPT",
            "FLOW_ROUTING         KINWAVE",
            "LINK_OFFSETS         DEPTH",
            "MIN_SLOPE            0.0",
            "ALLOW_PONDING        NO",
        ]
        .map(String::from),
    );

    section(
        &mut lines,
        "[REPORT]",
        &[";;Reporting Options"],
        ["SUBCATCHMENTS ALL", "NODES ALL", "LINKS ALL"].map(String::from),
    );

    section(
        &mut lines,
        "[JUNCTIONS]",
        &[
            ";;Name           Elevation  MaxDepth   InitDepth  SurDepth   Aponded",
            ";;-------------- ---------- ---------- ---------- ---------- ----------",
        ],
        nodes.iter().map(junction_row),
    );

    section(
        &mut lines,
        "[CONDUITS]",
        &[
            ";;Name           From Node        To Node          Length     Roughness  InOffset   OutOffset  InitFlow   MaxFlow",
            ";;-------------- ---------------- ---------------- ---------- ---------- ---------- ---------- ---------- ----------",
        ],
        links.iter().map(conduit_row),
    );

    section(
        &mut lines,
        "[XSECTIONS]",
        &[
            ";;Link           Shape        Geom1            Geom2      Geom3      Geom4      Barrels    Culvert",
            ";;-------------- ------------ ---------------- ---------- ---------- ---------- ---------- ----------",
        ],
        links.iter().map(|link| {
            format!(
                "{:<15} CIRCULAR     1                0          0          0          1",
                name(&link.id, FALLBACK_LINK_NAME)
            )
        }),
    );

    section(
        &mut lines,
        "[SUBCATCHMENTS]",
        &[
            ";;Name           Rain Gage        Outlet           Area     %Imperv  Width    %Slope   CurbLen  SnowPack",
            ";;-------------- ---------------- ---------------- -------- -------- -------- -------- -------- --------",
        ],
        subcatchments.iter().map(subcatchment_row),
    );

    section(
        &mut lines,
        "[COORDINATES]",
        &[
            ";;Node           X-Coord            Y-Coord",
            ";;-------------- ------------------ ------------------",
        ],
        nodes.iter().map(|node| {
            coordinate_row(
                name(&node.id, FALLBACK_NODE_NAME),
                (number(Some(node.x), 0.0), number(Some(node.y), 0.0)),
            )
        }),
    );

    section(
        &mut lines,
        "[Polygons]",
        &[
            ";;Subcatchment   X-Coord            Y-Coord",
            ";;-------------- ------------------ ------------------",
        ],
        subcatchments.iter().flat_map(polygon_rows),
    );

    lines.join("\n")
}

/// Renders `records` and writes them to `path`.
///
/// Never panics and never returns `Err`: write failures come back as
/// `ok = false` with the underlying error in `message`.
pub fn export_to_file(path: &Path, title: &str, records: &NetworkRecords) -> ExportOutcome {
    let content = serialize(
        title,
        &records.nodes,
        &records.links,
        &records.subcatchments,
    );

    match std::fs::write(path, content) {
        Ok(()) => {
            info!(
                "event=inp_export module=export status=ok path={} nodes={} links={} subcatchments={}",
                path.display(),
                records.nodes.len(),
                records.links.len(),
                records.subcatchments.len()
            );
            ExportOutcome {
                ok: true,
                message: format!(
                    "File exported successfully:\n{}\n\nNodes: {}\nLinks: {}\nSubcatchments: {}\n\n\
                     Note: Complete RAINGAGES, SUBAREAS and INFILTRATION sections in SWMM.",
                    path.display(),
                    records.nodes.len(),
                    records.links.len(),
                    records.subcatchments.len()
                ),
            }
        }
        Err(err) => {
            error!(
                "event=inp_export module=export status=error path={} error_code=write_failed error={}",
                path.display(),
                err
            );
            ExportOutcome {
                ok: false,
                message: format!("Export failed:\n{err}"),
            }
        }
    }
}

fn section(
    lines: &mut Vec<String>,
    header: &str,
    comments: &[&str],
    rows: impl IntoIterator<Item = String>,
) {
    lines.push(header.to_string());
    lines.extend(comments.iter().map(|comment| comment.to_string()));
    lines.extend(rows);
    lines.push(String::new());
}

fn junction_row(node: &NodeRecord) -> String {
    format!(
        "{:<15} {:>10.2} {:>10.2} 0          0          0",
        name(&node.id, FALLBACK_NODE_NAME),
        number(node.invert_elev, FALLBACK_ELEVATION),
        number(node.max_depth, FALLBACK_MAX_DEPTH)
    )
}

fn conduit_row(link: &LinkRecord) -> String {
    format!(
        "{:<15} {:<17} {:<17} {:>10.2} {:>10.3} {:>10.2} {:>10.2} 0          0",
        name(&link.id, FALLBACK_LINK_NAME),
        link.inlet_node.trim(),
        link.outlet_node.trim(),
        number(link.length, FALLBACK_LENGTH),
        number(link.manning_n, FALLBACK_ROUGHNESS),
        number(link.in_offset, FALLBACK_OFFSET),
        number(link.out_offset, FALLBACK_OFFSET)
    )
}

fn subcatchment_row(subcatchment: &SubcatchmentRecord) -> String {
    format!(
        "{:<15} {:<17} {:<17} {:>8.2} {:>8.1} {:>8.2} {:>8.2} 0",
        name(&subcatchment.id, FALLBACK_SUBCATCHMENT_NAME),
        subcatchment.rain_gage.trim(),
        subcatchment.outlet.trim(),
        number(subcatchment.area, FALLBACK_AREA),
        number(subcatchment.perc_imperv, FALLBACK_PERC_IMPERV),
        number(subcatchment.width, FALLBACK_WIDTH),
        number(subcatchment.slope, FALLBACK_SLOPE)
    )
}

fn polygon_rows(subcatchment: &SubcatchmentRecord) -> Vec<String> {
    let mut vertices = subcatchment.vertices.as_slice();
    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices = &vertices[..vertices.len() - 1];
    }

    let label = name(&subcatchment.id, FALLBACK_SUBCATCHMENT_NAME);
    vertices
        .iter()
        .map(|&(x, y)| coordinate_row(label, (number(Some(x), 0.0), number(Some(y), 0.0))))
        .collect()
}

fn coordinate_row(label: &str, (x, y): (f64, f64)) -> String {
    format!("{label:<15} {x:>18.3} {y:>18.3}")
}

fn name<'a>(id: &'a str, fallback: &'a str) -> &'a str {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        fallback
    } else {
        trimmed
    }
}

fn number(value: Option<f64>, fallback: f64) -> f64 {
    value.filter(|value| value.is_finite()).unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> NodeRecord {
        NodeRecord {
            id: id.to_string(),
            invert_elev: Some(10.5),
            max_depth: Some(1.0),
            x: 500.0,
            y: 1000.25,
        }
    }

    fn link() -> LinkRecord {
        LinkRecord {
            id: "C1".to_string(),
            inlet_node: "N1".to_string(),
            outlet_node: "N2".to_string(),
            length: Some(12.0),
            manning_n: Some(0.013),
            in_offset: None,
            out_offset: Some(0.25),
        }
    }

    fn junctions(text: &str) -> Vec<&str> {
        section_rows(text, "[JUNCTIONS]")
    }

    fn section_rows<'a>(text: &'a str, header: &str) -> Vec<&'a str> {
        text.lines()
            .skip_while(|line| *line != header)
            .skip(1)
            .take_while(|line| !line.is_empty())
            .filter(|line| !line.starts_with(";;"))
            .collect()
    }

    #[test]
    fn junction_row_is_fixed_width() {
        let text = serialize("t", &[node("N1")], &[], &[]);
        assert_eq!(
            junctions(&text),
            ["N1                   10.50       1.00 0          0          0"]
        );
    }

    #[test]
    fn conduit_row_applies_fallbacks() {
        let mut missing = link();
        missing.length = None;
        missing.manning_n = Some(f64::NAN);
        let text = serialize("t", &[], &[missing], &[]);
        assert_eq!(
            section_rows(&text, "[CONDUITS]"),
            ["C1              N1                N2                    100.00      0.009       0.00       0.25 0          0"]
        );
    }

    #[test]
    fn blank_names_use_fallbacks() {
        let text = serialize("t", &[node("  ")], &[], &[]);
        assert!(junctions(&text)[0].starts_with("NODE "));
        assert!(section_rows(&text, "[COORDINATES]")[0].starts_with("NODE "));
    }

    #[test]
    fn sections_appear_in_order_and_end_with_newline() {
        let text = serialize(DEFAULT_TITLE, &[], &[], &[]);
        let headers = text
            .lines()
            .filter(|line| line.starts_with('['))
            .collect::<Vec<_>>();
        assert_eq!(
            headers,
            [
                "[TITLE]",
                "[OPTIONS]",
                "[REPORT]",
                "[JUNCTIONS]",
                "[CONDUITS]",
                "[XSECTIONS]",
                "[SUBCATCHMENTS]",
                "[COORDINATES]",
                "[Polygons]",
            ]
        );
        assert!(text.starts_with("[TITLE]\n;;SWMM Drainage Project\n\n[OPTIONS]"));
        assert!(text.ends_with("------------------\n"));
    }

    #[test]
    fn polygons_drop_closing_vertex_only_when_closed() {
        let closed = SubcatchmentRecord {
            id: "S1".to_string(),
            rain_gage: String::new(),
            outlet: "N2".to_string(),
            area: Some(0.5),
            perc_imperv: Some(25.0),
            width: Some(40.0),
            slope: Some(1.25),
            vertices: vec![(0.0, 0.0), (10.0, 0.0), (0.0, 10.0), (0.0, 0.0)],
        };
        let mut open = closed.clone();
        open.id = "S2".to_string();
        open.vertices.pop();
        let mut empty = closed.clone();
        empty.id = "S3".to_string();
        empty.vertices.clear();

        let text = serialize("t", &[], &[], &[closed, open, empty]);
        let rows = section_rows(&text, "[Polygons]");
        assert_eq!(rows.iter().filter(|row| row.starts_with("S1 ")).count(), 3);
        assert_eq!(rows.iter().filter(|row| row.starts_with("S2 ")).count(), 3);
        assert_eq!(rows.iter().filter(|row| row.starts_with("S3 ")).count(), 0);
        assert_eq!(
            rows[0],
            "S1                           0.000              0.000"
        );

        assert_eq!(
            section_rows(&text, "[SUBCATCHMENTS]")[0],
            "S1                                N2                    0.50     25.0    40.00     1.25 0"
        );
    }

    #[test]
    fn export_to_file_reports_write_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("missing").join("model.inp");
        let outcome = export_to_file(&missing, "t", &NetworkRecords::default());
        assert!(!outcome.ok);
        assert!(outcome.message.starts_with("Export failed:"));
    }
}
