//! Elevation oracle adapter.
//!
//! # Responsibility
//! - Define the raster sampling contract consumed by attribute derivation.
//! - Provide a regular-grid DEM loaded from ESRI ASCII grids or single-band
//!   GeoTIFFs.
//!
//! # Invariants
//! - Sampling never fails: points outside the extent report
//!   `within_bounds = false`, cells without data report `value = None`.

use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

mod ascii_grid;
mod geotiff;

pub use ascii_grid::GridRaster;
pub use geotiff::read_geotiff;

pub type RasterResult<T> = Result<T, RasterError>;

/// One elevation lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElevationSample {
    pub value: Option<f64>,
    pub within_bounds: bool,
}

impl ElevationSample {
    pub const OUTSIDE: Self = Self {
        value: None,
        within_bounds: false,
    };

    /// Returns the elevation only when the point is inside the raster and the
    /// cell holds a finite value.
    pub fn valid_value(&self) -> Option<f64> {
        if !self.within_bounds {
            return None;
        }
        self.value.filter(|value| value.is_finite())
    }
}

/// Terrain elevation source sampled at projected coordinates.
pub trait ElevationOracle {
    fn sample(&self, x: f64, y: f64) -> ElevationSample;
}

impl<T: ElevationOracle + ?Sized> ElevationOracle for &T {
    fn sample(&self, x: f64, y: f64) -> ElevationSample {
        (**self).sample(x, y)
    }
}

/// DEM loading error.
#[derive(Debug)]
pub enum RasterError {
    Io(std::io::Error),
    /// Header or cell data could not be parsed.
    Parse(String),
    Tiff(tiff::TiffError),
}

impl Display for RasterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read DEM: {err}"),
            Self::Parse(message) => write!(f, "invalid DEM grid: {message}"),
            Self::Tiff(err) => write!(f, "failed to decode GeoTIFF DEM: {err}"),
        }
    }
}

impl Error for RasterError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Tiff(err) => Some(err),
            Self::Parse(_) => None,
        }
    }
}

impl From<std::io::Error> for RasterError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<tiff::TiffError> for RasterError {
    fn from(value: tiff::TiffError) -> Self {
        Self::Tiff(value)
    }
}

/// Loads a DEM, picking the decoder from the file extension: `.tif` and
/// `.tiff` are read as GeoTIFF, anything else as an ESRI ASCII grid.
pub fn load_dem(path: impl AsRef<Path>) -> RasterResult<GridRaster> {
    let path = path.as_ref();
    let is_tiff = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("tif") || ext.eq_ignore_ascii_case("tiff"));
    if !is_tiff {
        return GridRaster::from_path(path);
    }

    let grid = read_geotiff(BufReader::new(File::open(path)?))?;
    info!(
        "event=dem_load module=raster status=ok format=geotiff path={}",
        path.display()
    );
    Ok(grid)
}
