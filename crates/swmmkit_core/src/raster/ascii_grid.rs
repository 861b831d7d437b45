//! Regular-grid DEM backed by the ESRI ASCII grid format.
//!
//! Header keys (`ncols`, `nrows`, `xllcorner`/`xllcenter`,
//! `yllcorner`/`yllcenter`, `cellsize`, optional `nodata_value`) are matched
//! case-insensitively. Cell rows are stored north to south.

use super::{ElevationOracle, ElevationSample, RasterError, RasterResult};
use geo::{Coord, Rect};
use log::info;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct GridRaster {
    ncols: usize,
    nrows: usize,
    x_min: f64,
    y_min: f64,
    cell_size: f64,
    no_data: Option<f64>,
    values: Vec<f64>,
}

impl GridRaster {
    /// Builds a grid from row-major values, first row northernmost.
    ///
    /// # Errors
    /// - Returns `Parse` when dimensions or cell size are not positive, or when
    ///   `values.len() != ncols * nrows`.
    pub fn new(
        ncols: usize,
        nrows: usize,
        x_min: f64,
        y_min: f64,
        cell_size: f64,
        no_data: Option<f64>,
        values: Vec<f64>,
    ) -> RasterResult<Self> {
        if ncols == 0 || nrows == 0 {
            return Err(RasterError::Parse(format!(
                "grid dimensions must be positive, got {ncols}x{nrows}"
            )));
        }
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(RasterError::Parse(format!(
                "cellsize must be positive, got {cell_size}"
            )));
        }
        let cell_count = ncols.checked_mul(nrows).ok_or_else(|| {
            RasterError::Parse(format!("grid dimensions {ncols}x{nrows} are too large"))
        })?;
        if values.len() != cell_count {
            return Err(RasterError::Parse(format!(
                "expected {cell_count} cell values, found {}",
                values.len()
            )));
        }
        Ok(Self {
            ncols,
            nrows,
            x_min,
            y_min,
            cell_size,
            no_data,
            values,
        })
    }

    /// Loads an `.asc` grid from disk.
    pub fn from_path(path: impl AsRef<Path>) -> RasterResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let grid = Self::parse(&text)?;
        info!(
            "event=dem_load module=raster status=ok path={} ncols={} nrows={} cellsize={}",
            path.display(),
            grid.ncols,
            grid.nrows,
            grid.cell_size
        );
        Ok(grid)
    }

    /// Parses ESRI ASCII grid text.
    pub fn parse(text: &str) -> RasterResult<Self> {
        let mut tokens = text.split_whitespace().peekable();
        let mut header = GridHeader::default();

        while let Some(key) = tokens.peek().copied() {
            if !GridHeader::is_key(key) {
                break;
            }
            tokens.next();
            let raw = tokens
                .next()
                .ok_or_else(|| RasterError::Parse(format!("missing value for `{key}`")))?;
            header.set(key, raw)?;
        }

        let values = tokens
            .map(|token| {
                token
                    .parse::<f64>()
                    .map_err(|_| RasterError::Parse(format!("invalid cell value `{token}`")))
            })
            .collect::<RasterResult<Vec<_>>>()?;

        let ncols = header.required_count("ncols", header.ncols)?;
        let nrows = header.required_count("nrows", header.nrows)?;
        let cell_size = header.required("cellsize", header.cell_size)?;
        let x_min = match (header.xll_corner, header.xll_center) {
            (Some(corner), _) => corner,
            (None, Some(center)) => center - cell_size / 2.0,
            (None, None) => return Err(RasterError::Parse("missing `xllcorner`".to_string())),
        };
        let y_min = match (header.yll_corner, header.yll_center) {
            (Some(corner), _) => corner,
            (None, Some(center)) => center - cell_size / 2.0,
            (None, None) => return Err(RasterError::Parse("missing `yllcorner`".to_string())),
        };

        Self::new(
            ncols,
            nrows,
            x_min,
            y_min,
            cell_size,
            header.no_data,
            values,
        )
    }

    /// Valid sampling extent.
    pub fn extent(&self) -> Rect<f64> {
        Rect::new(
            Coord {
                x: self.x_min,
                y: self.y_min,
            },
            Coord {
                x: self.x_max(),
                y: self.y_max(),
            },
        )
    }

    fn x_max(&self) -> f64 {
        self.x_min + self.cell_size * self.ncols as f64
    }

    fn y_max(&self) -> f64 {
        self.y_min + self.cell_size * self.nrows as f64
    }

    fn is_no_data(&self, value: f64) -> bool {
        !value.is_finite() || self.no_data.is_some_and(|no_data| value == no_data)
    }
}

impl ElevationOracle for GridRaster {
    fn sample(&self, x: f64, y: f64) -> ElevationSample {
        let inside = x >= self.x_min && x <= self.x_max() && y >= self.y_min && y <= self.y_max();
        if !inside {
            return ElevationSample::OUTSIDE;
        }

        // Points on the east/south edge belong to the last column/row.
        let col = (((x - self.x_min) / self.cell_size).floor() as usize).min(self.ncols - 1);
        let row = (((self.y_max() - y) / self.cell_size).floor() as usize).min(self.nrows - 1);
        let value = self.values[row * self.ncols + col];

        ElevationSample {
            value: (!self.is_no_data(value)).then_some(value),
            within_bounds: true,
        }
    }
}

#[derive(Debug, Default)]
struct GridHeader {
    ncols: Option<f64>,
    nrows: Option<f64>,
    xll_corner: Option<f64>,
    xll_center: Option<f64>,
    yll_corner: Option<f64>,
    yll_center: Option<f64>,
    cell_size: Option<f64>,
    no_data: Option<f64>,
}

impl GridHeader {
    const KEYS: [&'static str; 8] = [
        "ncols",
        "nrows",
        "xllcorner",
        "xllcenter",
        "yllcorner",
        "yllcenter",
        "cellsize",
        "nodata_value",
    ];

    fn is_key(token: &str) -> bool {
        Self::KEYS
            .iter()
            .any(|key| key.eq_ignore_ascii_case(token))
    }

    fn set(&mut self, key: &str, raw: &str) -> RasterResult<()> {
        let value = raw
            .parse::<f64>()
            .map_err(|_| RasterError::Parse(format!("invalid value `{raw}` for `{key}`")))?;
        let slot = match key.to_ascii_lowercase().as_str() {
            "ncols" => &mut self.ncols,
            "nrows" => &mut self.nrows,
            "xllcorner" => &mut self.xll_corner,
            "xllcenter" => &mut self.xll_center,
            "yllcorner" => &mut self.yll_corner,
            "yllcenter" => &mut self.yll_center,
            "cellsize" => &mut self.cell_size,
            "nodata_value" => &mut self.no_data,
            other => {
                return Err(RasterError::Parse(format!("unknown header key `{other}`")));
            }
        };
        *slot = Some(value);
        Ok(())
    }

    fn required(&self, key: &str, value: Option<f64>) -> RasterResult<f64> {
        value.ok_or_else(|| RasterError::Parse(format!("missing `{key}`")))
    }

    fn required_count(&self, key: &str, value: Option<f64>) -> RasterResult<usize> {
        let value = self.required(key, value)?;
        if value.fract() != 0.0 || value < 1.0 {
            return Err(RasterError::Parse(format!(
                "`{key}` must be a positive integer, got {value}"
            )));
        }
        Ok(value as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::GridRaster;
    use crate::raster::ElevationOracle;

    const GRID: &str = "ncols 3
nrows 2
xllcorner 100.0
yllcorner 200.0
cellsize 10.0
NODATA_value -9999
1.0 2.0 3.0
4.0 -9999 6.0
";

    #[test]
    fn parse_reads_header_and_cells() {
        let grid = GridRaster::parse(GRID).expect("valid grid");
        let extent = grid.extent();
        assert_eq!(extent.min().x, 100.0);
        assert_eq!(extent.max().x, 130.0);
        assert_eq!(extent.max().y, 220.0);
    }

    #[test]
    fn sample_maps_rows_north_to_south() {
        let grid = GridRaster::parse(GRID).expect("valid grid");
        assert_eq!(grid.sample(105.0, 215.0).value, Some(1.0));
        assert_eq!(grid.sample(125.0, 205.0).value, Some(6.0));
        // east and south edges fall into the last cell
        assert_eq!(grid.sample(130.0, 200.0).value, Some(6.0));
    }

    #[test]
    fn sample_reports_no_data_and_outside() {
        let grid = GridRaster::parse(GRID).expect("valid grid");
        let hole = grid.sample(115.0, 205.0);
        assert!(hole.within_bounds);
        assert_eq!(hole.value, None);

        let outside = grid.sample(99.0, 205.0);
        assert!(!outside.within_bounds);
        assert_eq!(outside.valid_value(), None);
    }

    #[test]
    fn parse_accepts_center_registration() {
        let text = "ncols 1\nnrows 1\nxllcenter 5\nyllcenter 5\ncellsize 10\n42\n";
        let grid = GridRaster::parse(text).expect("valid grid");
        assert_eq!(grid.extent().min().x, 0.0);
        assert_eq!(grid.sample(9.0, 9.0).value, Some(42.0));
    }

    #[test]
    fn parse_rejects_cell_count_mismatch() {
        let text = "ncols 2\nnrows 2\nxllcorner 0\nyllcorner 0\ncellsize 1\n1 2 3\n";
        let err = GridRaster::parse(text).expect_err("three cells for a 2x2 grid");
        assert!(err.to_string().contains("expected 4 cell values"));
    }

    #[test]
    fn parse_rejects_overflowing_dimensions() {
        let text = "ncols 18446744073709551615\nnrows 2\nxllcorner 0\nyllcorner 0\ncellsize 1\n1 2\n";
        let err = GridRaster::parse(text).expect_err("cell count overflows usize");
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn non_finite_first_cell_is_data_not_header() {
        let text = "ncols 2\nnrows 1\nxllcorner 0\nyllcorner 0\ncellsize 1\nnan 7\n";
        let grid = GridRaster::parse(text).expect("nan is a cell value");
        assert_eq!(grid.sample(0.5, 0.5).value, None);
        assert_eq!(grid.sample(1.5, 0.5).value, Some(7.0));
    }

    #[test]
    fn unknown_leading_word_is_rejected_as_cell_value() {
        let text = "ncols 1\nnrows 1\nxllcorner 0\nyllcorner 0\ncellsize 1\nbogus 1\n";
        let err = GridRaster::parse(text).expect_err("bogus is not a number");
        assert!(err.to_string().contains("invalid cell value `bogus`"));
    }
}
