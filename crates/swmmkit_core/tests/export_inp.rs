use rusqlite::Connection;
use swmmkit_core::{
    export_to_file, extract_network, open_db_in_memory, serialize, FeatureRepository, Link, Node,
    SqliteLinkRepository, SqliteNodeRepository, SqliteSubcatchmentRepository, Subcatchment,
};

fn section<'a>(text: &'a str, header: &str) -> Vec<&'a str> {
    text.lines()
        .skip_while(|line| *line != header)
        .skip(1)
        .take_while(|line| !line.is_empty())
        .filter(|line| !line.starts_with(";;"))
        .collect()
}

fn seed_minimal(conn: &Connection) {
    let mut node = Node::new(0, "N1", 500.0, 1000.0);
    node.invert_elev = Some(10.5);
    node.max_depth = Some(1.0);
    SqliteNodeRepository::try_new(conn)
        .unwrap()
        .insert_feature(&node)
        .unwrap();

    let mut link = Link::new(0, "C1", vec![(500.0, 1000.0), (600.0, 1000.0)]);
    link.inlet_node = "N1".to_string();
    link.outlet_node = "N2".to_string();
    link.length = Some(100.0);
    link.manning_n = Some(0.013);
    SqliteLinkRepository::try_new(conn)
        .unwrap()
        .insert_feature(&link)
        .unwrap();

    let mut sub = Subcatchment::new(0, "S1", vec![(0.0, 0.0), (100.0, 0.0), (0.0, 100.0)]);
    sub.outlet = "N1".to_string();
    sub.rain_gage = "RG1".to_string();
    sub.area = Some(0.5);
    SqliteSubcatchmentRepository::try_new(conn)
        .unwrap()
        .insert_feature(&sub)
        .unwrap();
}

#[test]
fn one_of_each_feature_yields_one_row_each() {
    let conn = open_db_in_memory().unwrap();
    seed_minimal(&conn);

    let records = extract_network(&conn).unwrap();
    let text = serialize(
        "Basin",
        &records.nodes,
        &records.links,
        &records.subcatchments,
    );

    assert_eq!(
        section(&text, "[JUNCTIONS]"),
        ["N1                   10.50       1.00 0          0          0"]
    );
    assert_eq!(section(&text, "[CONDUITS]").len(), 1);
    assert_eq!(section(&text, "[XSECTIONS]").len(), 1);
    assert_eq!(section(&text, "[SUBCATCHMENTS]").len(), 1);
    assert_eq!(
        section(&text, "[COORDINATES]"),
        ["N1                         500.000           1000.000"]
    );
    assert_eq!(section(&text, "[Polygons]").len(), 3);
    assert!(text.starts_with("[TITLE]\n;;Basin\n"));
}

#[test]
fn export_writes_file_and_reports_counts() {
    let conn = open_db_in_memory().unwrap();
    seed_minimal(&conn);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("basin.inp");

    let records = extract_network(&conn).unwrap();
    let outcome = export_to_file(&path, "Basin", &records);

    assert!(outcome.ok, "{}", outcome.message);
    assert_eq!(
        outcome.message,
        format!(
            "File exported successfully:\n{}\n\nNodes: 1\nLinks: 1\nSubcatchments: 1\n\n\
             Note: Complete RAINGAGES, SUBAREAS and INFILTRATION sections in SWMM.",
            path.display()
        )
    );
    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        written,
        serialize(
            "Basin",
            &records.nodes,
            &records.links,
            &records.subcatchments
        )
    );
}

#[test]
fn incomplete_attributes_still_export_with_fallbacks() {
    let conn = open_db_in_memory().unwrap();
    SqliteNodeRepository::try_new(&conn)
        .unwrap()
        .insert_feature(&Node::new(0, "", 1.0, 2.0))
        .unwrap();
    SqliteLinkRepository::try_new(&conn)
        .unwrap()
        .insert_feature(&Link::new(0, "", vec![(0.0, 0.0), (1.0, 0.0)]))
        .unwrap();

    let records = extract_network(&conn).unwrap();
    let text = serialize("t", &records.nodes, &records.links, &records.subcatchments);

    assert_eq!(
        section(&text, "[JUNCTIONS]"),
        ["NODE                  0.00       1.00 0          0          0"]
    );
    let conduit = section(&text, "[CONDUITS]")[0];
    assert!(conduit.starts_with("LINK "));
    assert!(conduit.contains("    100.00      0.009 "));
}

#[test]
fn missing_layer_exports_as_empty_section() {
    let conn = open_db_in_memory().unwrap();
    seed_minimal(&conn);
    conn.execute_batch("DROP TABLE swmm_subcatchments;").unwrap();

    let records = extract_network(&conn).unwrap();
    assert!(records.subcatchments.is_empty());
    assert_eq!(records.nodes.len(), 1);
}

#[test]
fn unwritable_path_is_reported_not_raised() {
    let dir = tempfile::tempdir().unwrap();
    let outcome = export_to_file(dir.path(), "t", &Default::default());
    assert!(!outcome.ok);
    assert!(outcome.message.starts_with("Export failed:\n"));
}
