//! Project configuration.
//!
//! # Responsibility
//! - Load the optional JSON project file (title, snap tolerance, slope
//!   sampling density, default attribute values for new features).
//! - Resolve the project store path.
//!
//! # Invariants
//! - Every field has a default; an empty JSON object is a valid config.
//! - Store path precedence: explicit argument, then `SWMMKIT_DB_PATH`, then
//!   the temp-dir fallback.

use crate::export::inp::DEFAULT_TITLE;
use crate::service::derive::DEFAULT_SLOPE_SAMPLES;
use crate::service::topology::DEFAULT_SNAP_TOLERANCE_M;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DB_PATH_ENV: &str = "SWMMKIT_DB_PATH";
pub const DEFAULT_STORE_FILE_NAME: &str = "swmmkit_project.sqlite3";

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "config read error: {err}"),
            Self::Json(err) => write!(f, "config parse error: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Attribute values given to newly digitized features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureDefaults {
    pub max_depth: f64,
    pub manning_n: f64,
    pub perc_imperv: f64,
}

impl Default for FeatureDefaults {
    fn default() -> Self {
        Self {
            max_depth: 1.0,
            manning_n: 0.013,
            perc_imperv: 25.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub title: String,
    pub snap_tolerance_m: f64,
    pub slope_sample_count: usize,
    pub defaults: FeatureDefaults,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            snap_tolerance_m: DEFAULT_SNAP_TOLERANCE_M,
            slope_sample_count: DEFAULT_SLOPE_SAMPLES,
            defaults: FeatureDefaults::default(),
        }
    }
}

impl ProjectConfig {
    /// Reads and validates a JSON config file.
    ///
    /// # Errors
    /// - [`ConfigError::Io`] when the file cannot be read.
    /// - [`ConfigError::Json`] when it is not valid JSON for this shape.
    /// - [`ConfigError::Invalid`] when a value is out of range.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> ConfigResult<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    fn validate(&self) -> ConfigResult<()> {
        if !(self.snap_tolerance_m.is_finite() && self.snap_tolerance_m >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "snap_tolerance_m must be a non-negative number, got {}",
                self.snap_tolerance_m
            )));
        }
        if self.slope_sample_count == 0 {
            return Err(ConfigError::Invalid(
                "slope_sample_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Resolves the project store path.
pub fn resolve_store_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match std::env::var_os(DB_PATH_ENV) {
        Some(value) if !value.is_empty() => PathBuf::from(value),
        _ => std::env::temp_dir().join(DEFAULT_STORE_FILE_NAME),
    }
}

#[cfg(test)]
mod tests {
    use super::{resolve_store_path, ConfigError, ProjectConfig};
    use std::path::Path;

    #[test]
    fn empty_object_yields_defaults() {
        let config = ProjectConfig::from_json("{}").expect("empty config");
        assert_eq!(config, ProjectConfig::default());
        assert_eq!(config.title, "SWMM Drainage Project");
        assert_eq!(config.snap_tolerance_m, 10.0);
        assert_eq!(config.defaults.manning_n, 0.013);
    }

    #[test]
    fn partial_defaults_keep_other_fields() {
        let config = ProjectConfig::from_json(r#"{"title":"Basin A","defaults":{"max_depth":2.5}}"#)
            .expect("partial config");
        assert_eq!(config.title, "Basin A");
        assert_eq!(config.defaults.max_depth, 2.5);
        assert_eq!(config.defaults.perc_imperv, 25.0);
        assert_eq!(config.slope_sample_count, 25);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let error = ProjectConfig::from_json(r#"{"snap_tolerance_m":-1}"#)
            .expect_err("negative tolerance");
        assert!(matches!(error, ConfigError::Invalid(_)));

        let error =
            ProjectConfig::from_json(r#"{"slope_sample_count":0}"#).expect_err("zero samples");
        assert!(matches!(error, ConfigError::Invalid(_)));
    }

    #[test]
    fn explicit_store_path_wins() {
        let path = resolve_store_path(Some(Path::new("/data/basin.sqlite3")));
        assert_eq!(path, Path::new("/data/basin.sqlite3"));
    }
}
