//! Planar geometry helpers shared by topology and derivation.
//!
//! All measures are planar and assume a projected CRS in meters; no
//! curvature correction is applied.

use geo::{
    Area, BoundingRect, Contains, Coord, EuclideanDistance, EuclideanLength, LineString,
    MultiPolygon, Point, Rect,
};

/// Rounds `value` to `decimals` fractional digits.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn point_distance(a: Point<f64>, b: Point<f64>) -> f64 {
    a.euclidean_distance(&b)
}

/// Sum of segment lengths along the vertex sequence.
pub fn line_length(line: &LineString<f64>) -> f64 {
    line.euclidean_length()
}

/// Planar area in square meters; holes are subtracted.
pub fn polygon_area_m2(boundary: &MultiPolygon<f64>) -> f64 {
    boundary.unsigned_area()
}

/// Axis-aligned bounding box, `None` for empty geometry.
pub fn bounding_box(boundary: &MultiPolygon<f64>) -> Option<Rect<f64>> {
    boundary.bounding_rect()
}

/// Strict interior test: points on the boundary are not contained.
pub fn contains_point(boundary: &MultiPolygon<f64>, point: Point<f64>) -> bool {
    boundary.contains(&point)
}

/// First and last vertex of a polyline; `None` with fewer than two vertices.
pub fn endpoints(line: &LineString<f64>) -> Option<(Point<f64>, Point<f64>)> {
    if line.0.len() < 2 {
        return None;
    }
    let first = line.0.first()?;
    let last = line.0.last()?;
    Some((Point::from(*first), Point::from(*last)))
}

/// Every ring vertex of every part, in storage order (exterior ring first,
/// then interiors).
pub fn boundary_vertices(boundary: &MultiPolygon<f64>) -> Vec<(f64, f64)> {
    boundary
        .0
        .iter()
        .flat_map(|polygon| std::iter::once(polygon.exterior()).chain(polygon.interiors()))
        .flat_map(|ring| ring.coords().map(|coord| (coord.x, coord.y)))
        .collect()
}

/// Cell centers of a `n × n` grid laid over `rect`, with
/// `n = floor(sqrt(sample_count))`.
///
/// Points are produced column by column (x outer, y inner).
pub fn grid_sample_points(rect: &Rect<f64>, sample_count: usize) -> Vec<Point<f64>> {
    let cells = (sample_count as f64).sqrt().floor() as usize;
    if cells == 0 {
        return Vec::new();
    }

    let min: Coord<f64> = rect.min();
    let dx = rect.width() / cells as f64;
    let dy = rect.height() / cells as f64;
    let mut points = Vec::with_capacity(cells * cells);
    for i in 0..cells {
        for j in 0..cells {
            points.push(Point::new(
                min.x + dx * (i as f64 + 0.5),
                min.y + dy * (j as f64 + 0.5),
            ));
        }
    }
    points
}
