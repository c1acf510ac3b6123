use image::GrayImage;

use crate::foundation::core::{BezPath, Point};
use crate::foundation::error::CollageResult;
use crate::render::cpu::fill_coverage;

/// Default closing tolerance, as a fraction of the smaller image side.
pub const DEFAULT_CLOSE_FRACTION: f64 = 0.05;

/// Coverage at or above this value counts as inside for binary masks.
pub(crate) const BINARY_THRESHOLD: u8 = 128;

/// Two complementary binary masks produced from one closed region.
///
/// Every pixel is 255 in exactly one of the two masks.
#[derive(Clone, Debug, PartialEq)]
pub struct RegionMasks {
    /// Pixels enclosed by the region boundary.
    pub inside: GrayImage,
    /// Everything else.
    pub outside: GrayImage,
}

/// Clamp points into `[0, width] x [0, height]`, dropping non-finite ones.
pub fn clamp_path(points: &[Point], width: u32, height: u32) -> Vec<Point> {
    let w = f64::from(width);
    let h = f64::from(height);
    points
        .iter()
        .filter(|p| p.x.is_finite() && p.y.is_finite())
        .map(|p| Point::new(p.x.clamp(0.0, w), p.y.clamp(0.0, h)))
        .collect()
}

/// Build the closed region boundary for a polyline in image pixel space.
///
/// A path whose ends meet (within `close_fraction` of the smaller side) is closed as drawn.
/// Otherwise it is extended from the top edge to its first point and from its last point to
/// the bottom edge, then closed along the left image border, so the region spans the image.
/// Returns `None` when fewer than two valid points remain after clamping.
pub fn region_boundary(
    points: &[Point],
    width: u32,
    height: u32,
    close_fraction: f64,
) -> Option<BezPath> {
    let pts = clamp_path(points, width, height);
    if pts.len() < 2 {
        return None;
    }
    let first = pts[0];
    let last = pts[pts.len() - 1];
    let tol = close_fraction.max(0.0) * f64::from(width.min(height));
    let already_closed = pts.len() >= 3 && first.distance(last) <= tol;

    let mut path = BezPath::new();
    if already_closed {
        path.move_to(first);
        for &p in &pts[1..] {
            path.line_to(p);
        }
        path.close_path();
        return Some(path);
    }

    let h = f64::from(height);
    path.move_to(Point::new(first.x, 0.0));
    for &p in &pts {
        path.line_to(p);
    }
    path.line_to(Point::new(last.x, h));
    path.line_to(Point::new(0.0, h));
    path.line_to(Point::new(0.0, 0.0));
    path.close_path();
    Some(path)
}

/// Rasterize a drawn path into two complementary masks at the bitmap's native size.
///
/// Returns `Ok(None)` for input too sparse to split: fewer than two valid points, or a region
/// that leaves either side empty.
#[tracing::instrument(skip(points), fields(points = points.len()))]
pub fn rasterize_region(
    points: &[Point],
    width: u32,
    height: u32,
    close_fraction: f64,
) -> CollageResult<Option<RegionMasks>> {
    let Some(boundary) = region_boundary(points, width, height, close_fraction) else {
        return Ok(None);
    };
    let coverage = fill_coverage(&boundary, width, height)?;

    let mut inside = coverage;
    let mut any_in = false;
    let mut any_out = false;
    for v in inside.iter_mut() {
        if *v >= BINARY_THRESHOLD {
            *v = 255;
            any_in = true;
        } else {
            *v = 0;
            any_out = true;
        }
    }
    if !any_in || !any_out {
        tracing::debug!("region covers none or all of the image; nothing to split");
        return Ok(None);
    }

    let mut outside = inside.clone();
    for v in outside.iter_mut() {
        *v = 255 - *v;
    }
    Ok(Some(RegionMasks { inside, outside }))
}

#[cfg(test)]
#[path = "../../tests/unit/raster/region.rs"]
mod tests;
