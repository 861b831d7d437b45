//! Project-level metadata stored next to the layers.
//!
//! # Invariants
//! - Metadata values are JSON documents keyed by a fixed name.
//! - A store without a recorded CRS reads back as `None`, not as an error.

use crate::model::crs::ProjectCrs;
use crate::repo::feature_repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};

const CRS_KEY: &str = "crs";

/// Reads the project CRS, if one was recorded.
pub fn load_crs(conn: &Connection) -> RepoResult<Option<ProjectCrs>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value FROM project_meta WHERE key = ?1;",
            [CRS_KEY],
            |row| row.get(0),
        )
        .optional()?;

    raw.map(|value| {
        serde_json::from_str(&value).map_err(|err| {
            RepoError::InvalidData(format!("invalid crs value in project_meta: {err}"))
        })
    })
    .transpose()
}

/// Records (or replaces) the project CRS.
pub fn save_crs(conn: &Connection, crs: &ProjectCrs) -> RepoResult<()> {
    let value = serde_json::to_string(crs)
        .map_err(|err| RepoError::InvalidData(format!("crs encoding failed: {err}")))?;
    conn.execute(
        "INSERT INTO project_meta (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value;",
        params![CRS_KEY, value],
    )?;
    Ok(())
}
