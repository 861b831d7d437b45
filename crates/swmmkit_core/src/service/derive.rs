//! Derived attribute computation.
//!
//! # Responsibility
//! - Node invert elevation (and X/Y mirror) from the DEM.
//! - Link length from geometry.
//! - Subcatchment area, slope and characteristic width.
//!
//! # Invariants
//! - Every operation is total over its layer: no single feature aborts the
//!   batch. Out-of-raster points are counted, not raised.
//! - Elevation is never overwritten with a placeholder when no DEM value
//!   exists.
//! - Each store-level entry point reads the layer, mutates it in memory and
//!   commits once.

use crate::geometry::{
    bounding_box, contains_point, grid_sample_points, line_length, polygon_area_m2, round_to,
};
use crate::model::link::Link;
use crate::model::node::Node;
use crate::model::subcatchment::Subcatchment;
use crate::model::Feature;
use crate::raster::ElevationOracle;
use crate::repo::feature_repo::{FeatureRepository, RepoResult};
use geo::MultiPolygon;
use log::info;
use std::collections::BTreeMap;

/// Default number of DEM samples per subcatchment.
pub const DEFAULT_SLOPE_SAMPLES: usize = 25;
/// Slope used when too few DEM samples fall inside a subcatchment (percent).
pub const FALLBACK_SLOPE_PCT: f64 = 0.5;

const SQUARE_METERS_PER_HECTARE: f64 = 10_000.0;

/// Outcome counts of an elevation sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElevationSyncSummary {
    pub total: usize,
    pub successful: usize,
    /// Nodes outside the DEM extent or on cells without data.
    pub outside: usize,
}

impl ElevationSyncSummary {
    pub fn message(&self) -> String {
        format!(
            "Updated {}/{} nodes. {} outside DEM bounds.",
            self.successful, self.total, self.outside
        )
    }
}

/// Slope and characteristic width of one subcatchment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlopeWidth {
    pub slope_pct: f64,
    pub width_m: f64,
}

/// Writes X/Y and DEM elevation into `nodes`.
pub fn apply_elevations<O>(nodes: &mut [Node], oracle: &O) -> ElevationSyncSummary
where
    O: ElevationOracle + ?Sized,
{
    let mut summary = ElevationSyncSummary::default();

    for node in nodes.iter_mut() {
        summary.total += 1;
        let (x, y) = (node.position.x(), node.position.y());
        node.x = Some(round_to(x, 3));
        node.y = Some(round_to(y, 3));

        match oracle.sample(x, y).valid_value() {
            Some(elevation) => {
                node.invert_elev = Some(round_to(elevation, 3));
                summary.successful += 1;
            }
            None => summary.outside += 1,
        }
    }

    summary
}

/// Samples node invert elevations from `oracle` and commits them.
pub fn sync_elevations<R, O>(nodes: &R, oracle: &O) -> RepoResult<ElevationSyncSummary>
where
    R: FeatureRepository<Node> + ?Sized,
    O: ElevationOracle + ?Sized,
{
    let mut features = nodes.list_features()?;
    let summary = apply_elevations(&mut features, oracle);
    nodes.commit_features(&features)?;

    info!(
        "event=elevation_sync module=service status=ok total={} successful={} outside={}",
        summary.total, summary.successful, summary.outside
    );
    Ok(summary)
}

/// Writes planar polyline lengths (meters, 3 decimals) into `links`.
pub fn apply_lengths(links: &mut [Link]) -> BTreeMap<String, f64> {
    links
        .iter_mut()
        .map(|link| {
            let length = round_to(line_length(&link.path), 3);
            link.length = Some(length);
            (link.key(), length)
        })
        .collect()
}

pub fn compute_lengths<R>(links: &R) -> RepoResult<BTreeMap<String, f64>>
where
    R: FeatureRepository<Link> + ?Sized,
{
    let mut features = links.list_features()?;
    let lengths = apply_lengths(&mut features);
    links.commit_features(&features)?;

    info!(
        "event=link_length module=service status=ok links={}",
        features.len()
    );
    Ok(lengths)
}

/// Writes planar areas (hectares, 4 decimals) into `subcatchments`.
pub fn apply_areas(subcatchments: &mut [Subcatchment]) -> BTreeMap<String, f64> {
    subcatchments
        .iter_mut()
        .map(|subcatchment| {
            let area_ha = round_to(
                polygon_area_m2(&subcatchment.boundary) / SQUARE_METERS_PER_HECTARE,
                4,
            );
            subcatchment.area = Some(area_ha);
            (subcatchment.key(), area_ha)
        })
        .collect()
}

pub fn compute_areas<R>(subcatchments: &R) -> RepoResult<BTreeMap<String, f64>>
where
    R: FeatureRepository<Subcatchment> + ?Sized,
{
    let mut features = subcatchments.list_features()?;
    let areas = apply_areas(&mut features);
    subcatchments.commit_features(&features)?;

    info!(
        "event=subcatchment_area module=service status=ok subcatchments={}",
        features.len()
    );
    Ok(areas)
}

/// Estimates slope and width of a single boundary.
///
/// Slope is the DEM relief over the characteristic length (the larger
/// bounding-box side); width is area over that same length.
pub fn estimate_slope_width<O>(
    boundary: &MultiPolygon<f64>,
    oracle: &O,
    sample_count: usize,
) -> SlopeWidth
where
    O: ElevationOracle + ?Sized,
{
    let area_m2 = polygon_area_m2(boundary);
    let Some(bbox) = bounding_box(boundary) else {
        return SlopeWidth {
            slope_pct: FALLBACK_SLOPE_PCT,
            width_m: round_to(area_m2.sqrt(), 2),
        };
    };
    let char_len = bbox.width().max(bbox.height());

    let elevations = grid_sample_points(&bbox, sample_count)
        .into_iter()
        .filter(|point| contains_point(boundary, *point))
        .filter_map(|point| oracle.sample(point.x(), point.y()).valid_value())
        .collect::<Vec<_>>();

    let slope_pct = if elevations.len() >= 2 && char_len > 0.0 {
        let max = elevations.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = elevations.iter().copied().fold(f64::INFINITY, f64::min);
        round_to((max - min) / char_len * 100.0, 2)
    } else {
        FALLBACK_SLOPE_PCT
    };

    let width_m = if char_len > 0.0 {
        round_to(area_m2 / char_len, 2)
    } else {
        round_to(area_m2.sqrt(), 2)
    };

    SlopeWidth { slope_pct, width_m }
}

/// Writes slope and width into `subcatchments`.
pub fn apply_slope_width<O>(
    subcatchments: &mut [Subcatchment],
    oracle: &O,
    sample_count: usize,
) -> BTreeMap<String, SlopeWidth>
where
    O: ElevationOracle + ?Sized,
{
    subcatchments
        .iter_mut()
        .map(|subcatchment| {
            let estimate = estimate_slope_width(&subcatchment.boundary, oracle, sample_count);
            subcatchment.slope = Some(estimate.slope_pct);
            subcatchment.width = Some(estimate.width_m);
            (subcatchment.key(), estimate)
        })
        .collect()
}

pub fn compute_slope_width<R, O>(
    subcatchments: &R,
    oracle: &O,
    sample_count: usize,
) -> RepoResult<BTreeMap<String, SlopeWidth>>
where
    R: FeatureRepository<Subcatchment> + ?Sized,
    O: ElevationOracle + ?Sized,
{
    let mut features = subcatchments.list_features()?;
    let results = apply_slope_width(&mut features, oracle, sample_count);
    subcatchments.commit_features(&features)?;

    info!(
        "event=slope_width module=service status=ok subcatchments={} samples={}",
        features.len(),
        sample_count
    );
    Ok(results)
}

/// Area, then slope and width, in one read and one commit.
///
/// Returns the number of subcatchments updated.
pub fn compute_subcatchment_params<R, O>(
    subcatchments: &R,
    oracle: &O,
    sample_count: usize,
) -> RepoResult<usize>
where
    R: FeatureRepository<Subcatchment> + ?Sized,
    O: ElevationOracle + ?Sized,
{
    let mut features = subcatchments.list_features()?;
    apply_areas(&mut features);
    apply_slope_width(&mut features, oracle, sample_count);
    subcatchments.commit_features(&features)?;

    info!(
        "event=subcatchment_params module=service status=ok subcatchments={} samples={}",
        features.len(),
        sample_count
    );
    Ok(features.len())
}
