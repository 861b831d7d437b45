//! Project coordinate reference system metadata.
//!
//! # Invariants
//! - Derived lengths, areas and slopes assume a projected CRS in meters.
//! - `auth_id` has the `AUTHORITY:CODE` shape (for example `EPSG:32718`).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static AUTH_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_.-]*:[A-Za-z0-9_.-]+$").expect("valid auth id regex")
});

/// CRS recorded alongside the project layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectCrs {
    /// Authority identifier such as `EPSG:32718`.
    pub auth_id: String,
    /// Human-readable CRS name.
    pub description: String,
    /// `true` for angular (degree-based) systems.
    pub is_geographic: bool,
}

impl ProjectCrs {
    pub fn projected(auth_id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            auth_id: auth_id.into(),
            description: description.into(),
            is_geographic: false,
        }
    }

    pub fn geographic(auth_id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            auth_id: auth_id.into(),
            description: description.into(),
            is_geographic: true,
        }
    }

    /// Returns whether `auth_id` is a well-formed authority identifier.
    pub fn is_valid(&self) -> bool {
        AUTH_ID_RE.is_match(self.auth_id.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::ProjectCrs;

    #[test]
    fn auth_id_shape_is_checked() {
        assert!(ProjectCrs::projected("EPSG:32718", "WGS 84 / UTM zone 18S").is_valid());
        assert!(ProjectCrs::projected("ESRI:102100", "").is_valid());
        assert!(!ProjectCrs::projected("", "unnamed").is_valid());
        assert!(!ProjectCrs::projected("32718", "missing authority").is_valid());
    }
}
