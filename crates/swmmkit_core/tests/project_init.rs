use swmmkit_core::repo::project_repo::load_crs;
use swmmkit_core::service::project::{
    initialize_project, validate_crs_is_projected, PROJECT_STORE_FILE_NAME,
};
use swmmkit_core::{open_db, open_db_in_memory, ProjectCrs};

#[test]
fn initialize_creates_store_with_layers_and_crs() {
    let dir = tempfile::tempdir().unwrap();
    let crs = ProjectCrs::projected("EPSG:32718", "WGS 84 / UTM zone 18S");

    let path = initialize_project(dir.path(), &crs).unwrap();
    assert_eq!(path, dir.path().join(PROJECT_STORE_FILE_NAME));

    let conn = open_db(&path).unwrap();
    assert_eq!(load_crs(&conn).unwrap(), Some(crs.clone()));
    let outcome = validate_crs_is_projected(&conn);
    assert!(outcome.ok);
    assert_eq!(outcome.message, "CRS OK: WGS 84 / UTM zone 18S [EPSG:32718]");

    // reopening an existing project is allowed
    assert_eq!(initialize_project(dir.path(), &crs).unwrap(), path);
}

#[test]
fn geographic_crs_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let crs = ProjectCrs::geographic("EPSG:4326", "WGS 84");

    let error = initialize_project(dir.path(), &crs).unwrap_err();
    assert!(error.contains("geographic"));
    assert!(!dir.path().join(PROJECT_STORE_FILE_NAME).exists());
}

#[test]
fn missing_output_directory_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let crs = ProjectCrs::projected("EPSG:32718", "WGS 84 / UTM zone 18S");

    let error = initialize_project(&dir.path().join("absent"), &crs).unwrap_err();
    assert!(error.starts_with("Output directory does not exist"));
}

#[test]
fn store_without_crs_fails_the_check() {
    let conn = open_db_in_memory().unwrap();
    let outcome = validate_crs_is_projected(&conn);
    assert!(!outcome.ok);
    assert_eq!(
        outcome.message,
        "Project CRS is not defined. Set a valid projected CRS."
    );
}
