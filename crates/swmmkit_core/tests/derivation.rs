use swmmkit_core::service::derive::{
    compute_areas, compute_lengths, compute_slope_width, compute_subcatchment_params,
    sync_elevations,
};
use swmmkit_core::{
    load_dem, open_db_in_memory, FeatureRepository, GridRaster, Link, Node, SqliteLinkRepository,
    SqliteNodeRepository, SqliteSubcatchmentRepository, Subcatchment,
};
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;

/// 4 x 4 cells of 25 m over (0,0)-(100,100); elevation rises one meter per
/// column eastwards and the north-west cell has no data.
const DEM: &str = "\
ncols 4
nrows 4
xllcorner 0
yllcorner 0
cellsize 25
NODATA_value -9999
-9999 11 12 13
10 11 12 13
10 11 12 13
10 11 12 13
";

fn dem() -> GridRaster {
    GridRaster::parse(DEM).unwrap()
}

#[test]
fn elevation_sync_counts_outside_and_nodata_nodes() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNodeRepository::try_new(&conn).unwrap();
    for (id, x, y) in [
        ("J1", 10.0, 10.0),
        ("J2", 90.0, 10.0),
        ("J3", 5.0, 95.0),
        ("J4", 150.0, 10.0),
    ] {
        repo.insert_feature(&Node::new(0, id, x, y)).unwrap();
    }

    let summary = sync_elevations(&repo, &dem()).unwrap();
    assert_eq!(summary.total, 4);
    assert_eq!(summary.successful, 2);
    assert_eq!(summary.outside, 2);
    assert_eq!(summary.message(), "Updated 2/4 nodes. 2 outside DEM bounds.");

    let stored = repo.list_features().unwrap();
    assert_eq!(stored[0].invert_elev, Some(10.0));
    assert_eq!(stored[1].invert_elev, Some(13.0));
    assert_eq!(stored[2].invert_elev, None);
    assert_eq!(stored[3].invert_elev, None);
    assert_eq!(stored[3].x, Some(150.0));
    assert_eq!(stored[3].y, Some(10.0));
}

#[test]
fn lengths_are_committed_per_link() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteLinkRepository::try_new(&conn).unwrap();
    repo.insert_feature(&Link::new(
        0,
        "C1",
        vec![(0.0, 0.0), (3.0, 0.0), (3.0, 4.0), (6.0, 8.0)],
    ))
    .unwrap();
    repo.insert_feature(&Link::new(0, "", vec![(0.0, 0.0), (0.0, 2.5)]))
        .unwrap();

    let lengths = compute_lengths(&repo).unwrap();
    assert_eq!(lengths["C1"], 12.0);
    assert_eq!(lengths["2"], 2.5);

    let stored = repo.list_features().unwrap();
    assert_eq!(stored[0].length, Some(12.0));
    assert_eq!(stored[1].length, Some(2.5));
}

#[test]
fn areas_and_slope_width_from_dem() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSubcatchmentRepository::try_new(&conn).unwrap();
    repo.insert_feature(&Subcatchment::new(
        0,
        "S1",
        vec![(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)],
    ))
    .unwrap();
    repo.insert_feature(&Subcatchment::new(
        0,
        "S2",
        vec![(0.0, 0.0), (100.0, 0.0), (100.0, 200.0), (0.0, 200.0)],
    ))
    .unwrap();

    let areas = compute_areas(&repo).unwrap();
    assert_eq!(areas["S1"], 1.0);
    assert_eq!(areas["S2"], 2.0);

    let estimates = compute_slope_width(&repo, &dem(), 25).unwrap();
    assert_eq!(estimates["S1"].slope_pct, 3.0);
    assert_eq!(estimates["S1"].width_m, 100.0);
    assert_eq!(estimates["S2"].width_m, 100.0);

    let stored = repo.list_features().unwrap();
    assert_eq!(stored[0].area, Some(1.0));
    assert_eq!(stored[0].slope, Some(3.0));
    assert_eq!(stored[0].width, Some(100.0));
}

#[test]
fn subcatchment_outside_dem_gets_fallback_slope() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSubcatchmentRepository::try_new(&conn).unwrap();
    repo.insert_feature(&Subcatchment::new(
        0,
        "FAR",
        vec![(1000.0, 1000.0), (1040.0, 1000.0), (1040.0, 1010.0), (1000.0, 1010.0)],
    ))
    .unwrap();

    let updated = compute_subcatchment_params(&repo, &dem(), 25).unwrap();
    assert_eq!(updated, 1);

    let stored = repo.list_features().unwrap();
    assert_eq!(stored[0].area, Some(0.04));
    assert_eq!(stored[0].slope, Some(0.5));
    assert_eq!(stored[0].width, Some(10.0));
}

#[test]
fn load_dem_reads_ascii_and_geotiff_files() {
    let dir = tempfile::tempdir().unwrap();

    let asc = dir.path().join("dem.asc");
    std::fs::write(&asc, DEM).unwrap();
    assert_eq!(load_dem(&asc).unwrap(), dem());

    let tif = dir.path().join("dem.TIF");
    {
        let file = std::fs::File::create(&tif).unwrap();
        let mut encoder = TiffEncoder::new(file).unwrap();
        let mut image = encoder.new_image::<colortype::Gray32Float>(2, 2).unwrap();
        image
            .encoder()
            .write_tag(Tag::ModelPixelScaleTag, &[50.0, 50.0, 0.0][..])
            .unwrap();
        image
            .encoder()
            .write_tag(Tag::ModelTiepointTag, &[0.0, 0.0, 0.0, -100.0, 100.0, 0.0][..])
            .unwrap();
        image.write_data(&[20.0f32, 21.0, 22.0, 23.0]).unwrap();
    }

    let conn = open_db_in_memory().unwrap();
    let repo = SqliteNodeRepository::try_new(&conn).unwrap();
    repo.insert_feature(&Node::new(0, "J1", -75.0, 75.0)).unwrap();
    repo.insert_feature(&Node::new(0, "J2", -25.0, 25.0)).unwrap();

    let summary = sync_elevations(&repo, &load_dem(&tif).unwrap()).unwrap();
    assert_eq!(summary.successful, 2);
    let stored = repo.list_features().unwrap();
    assert_eq!(stored[0].invert_elev, Some(20.0));
    assert_eq!(stored[1].invert_elev, Some(23.0));
}

#[test]
fn load_dem_reports_unreadable_files() {
    let dir = tempfile::tempdir().unwrap();
    let bogus = dir.path().join("dem.tif");
    std::fs::write(&bogus, b"not a tiff").unwrap();

    assert!(load_dem(&bogus).is_err());
    assert!(load_dem(dir.path().join("absent.asc")).is_err());
}
