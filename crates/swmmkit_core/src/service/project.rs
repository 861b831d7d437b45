//! Project setup: CRS validation and layer store initialization.
//!
//! # Responsibility
//! - Reject configurations that would make derived measures meaningless
//!   (missing or geographic CRS, missing output directory) before any layer is
//!   touched.
//!
//! # Invariants
//! - Configuration problems are reported as `CheckOutcome` values, never as
//!   panics.
//! - Initialization is idempotent for an existing store: layers are kept.

use crate::db::open_db;
use crate::model::crs::ProjectCrs;
use crate::repo::project_repo::{load_crs, save_crs};
use log::{info, warn};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// File name of the project store created by `initialize_project`.
pub const PROJECT_STORE_FILE_NAME: &str = "SWMM_Project.sqlite3";

/// Result of a configuration check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub ok: bool,
    pub message: String,
}

impl CheckOutcome {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Checks that `crs` is defined and projected (metric).
pub fn check_crs(crs: Option<&ProjectCrs>) -> CheckOutcome {
    let Some(crs) = crs.filter(|crs| crs.is_valid()) else {
        return CheckOutcome::fail("Project CRS is not defined. Set a valid projected CRS.");
    };
    if crs.is_geographic {
        return CheckOutcome::fail(format!(
            "CRS '{}' is geographic (degrees). Use a projected CRS with metric units (e.g. UTM, EPSG:32718).",
            crs.description
        ));
    }
    CheckOutcome::pass(format!("CRS OK: {} [{}]", crs.description, crs.auth_id))
}

/// Checks the CRS recorded in the project store.
pub fn validate_crs_is_projected(conn: &Connection) -> CheckOutcome {
    match load_crs(conn) {
        Ok(crs) => check_crs(crs.as_ref()),
        Err(err) => CheckOutcome::fail(format!("Project CRS could not be read: {err}")),
    }
}

/// Creates (or reopens) the project store in `output_dir` and records `crs`.
///
/// Returns the store path on success.
///
/// # Errors
/// - Returns a message when the CRS is not a valid projected CRS.
/// - Returns a message when `output_dir` is not an existing directory.
/// - Returns a message when the store cannot be opened or written.
pub fn initialize_project(output_dir: &Path, crs: &ProjectCrs) -> Result<PathBuf, String> {
    let crs_check = check_crs(Some(crs));
    if !crs_check.ok {
        warn!("event=project_init module=service status=error error_code=invalid_crs");
        return Err(format!("Invalid CRS: {}", crs_check.message));
    }
    if !output_dir.is_dir() {
        warn!("event=project_init module=service status=error error_code=missing_output_dir");
        return Err(format!(
            "Output directory does not exist: {}",
            output_dir.display()
        ));
    }

    let store_path = output_dir.join(PROJECT_STORE_FILE_NAME);
    let conn = open_db(&store_path).map_err(|err| format!("Failed to open project store: {err}"))?;
    save_crs(&conn, crs).map_err(|err| format!("Failed to record project CRS: {err}"))?;

    info!(
        "event=project_init module=service status=ok crs={} path={}",
        crs.auth_id,
        store_path.display()
    );
    Ok(store_path)
}
