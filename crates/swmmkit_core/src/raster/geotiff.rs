//! Single-band GeoTIFF DEMs.
//!
//! Georeferencing comes from `ModelPixelScaleTag` and `ModelTiepointTag`;
//! `GDAL_NODATA` is honored when present. Rotated rasters
//! (`ModelTransformationTag` only) and non-square pixels are rejected.

use super::{GridRaster, RasterError, RasterResult};
use std::io::{Read, Seek};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;
use tiff::ColorType;

/// Decodes a GeoTIFF into a regular grid.
///
/// # Errors
/// - `Tiff` when the container cannot be decoded.
/// - `Parse` when georeferencing is missing or unsupported, or the image is
///   not a single grayscale band.
pub fn read_geotiff<R: Read + Seek>(reader: R) -> RasterResult<GridRaster> {
    let mut decoder = Decoder::new(reader)?;

    match decoder.colortype()? {
        ColorType::Gray(_) => {}
        other => {
            return Err(RasterError::Parse(format!(
                "expected a single-band elevation raster, got {other:?}"
            )))
        }
    }

    let (width, height) = decoder.dimensions()?;
    let scale = decoder
        .find_tag(Tag::ModelPixelScaleTag)?
        .map(|value| value.into_f64_vec())
        .transpose()?
        .ok_or_else(|| RasterError::Parse("missing ModelPixelScaleTag".to_string()))?;
    let tiepoint = decoder
        .find_tag(Tag::ModelTiepointTag)?
        .map(|value| value.into_f64_vec())
        .transpose()?
        .ok_or_else(|| RasterError::Parse("missing ModelTiepointTag".to_string()))?;
    let no_data = match decoder.find_tag(Tag::GdalNodata)? {
        Some(value) => Some(parse_no_data(&value.into_string()?)?),
        None => None,
    };

    let (cell_x, cell_y) = match scale.as_slice() {
        [x, y, ..] => (*x, *y),
        _ => return Err(RasterError::Parse("ModelPixelScaleTag needs 2 values".to_string())),
    };
    if (cell_x - cell_y).abs() > cell_x.abs() * 1e-9 {
        return Err(RasterError::Parse(format!(
            "non-square pixels are not supported ({cell_x} x {cell_y})"
        )));
    }
    let (x_origin, y_origin) = match tiepoint.as_slice() {
        [i, j, _, x, y, ..] => (x - i * cell_x, y + j * cell_y),
        _ => return Err(RasterError::Parse("ModelTiepointTag needs 6 values".to_string())),
    };

    let values = cell_values(decoder.read_image()?)?;
    let nrows = height as usize;

    GridRaster::new(
        width as usize,
        nrows,
        x_origin,
        y_origin - cell_y * nrows as f64,
        cell_x,
        no_data,
        values,
    )
}

fn cell_values(image: DecodingResult) -> RasterResult<Vec<f64>> {
    let values = match image {
        DecodingResult::F32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::F64(data) => data,
        DecodingResult::I16(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U16(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I8(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U8(data) => data.into_iter().map(f64::from).collect(),
        _ => {
            return Err(RasterError::Parse(
                "unsupported GeoTIFF sample type".to_string(),
            ))
        }
    };
    Ok(values)
}

fn parse_no_data(raw: &str) -> RasterResult<f64> {
    let trimmed = raw.trim_matches(char::from(0)).trim();
    trimmed
        .parse::<f64>()
        .map_err(|_| RasterError::Parse(format!("invalid GDAL_NODATA value `{trimmed}`")))
}
