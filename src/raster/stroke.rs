use image::GrayImage;
use kurbo::{Cap, Join, Stroke, StrokeOpts};

use crate::foundation::core::{BezPath, Point};
use crate::foundation::error::CollageResult;
use crate::render::cpu::fill_coverage;

const STROKE_TOLERANCE: f64 = 0.1;

/// Open polyline through `points`.
pub(crate) fn polyline(points: &[Point]) -> BezPath {
    let mut path = BezPath::new();
    let mut it = points.iter();
    if let Some(&first) = it.next() {
        path.move_to(first);
        for &p in it {
            path.line_to(p);
        }
    }
    path
}

/// Fill outline of a round-capped, round-joined stroke of `width` along `points`.
pub(crate) fn stroke_outline(points: &[Point], width: f64) -> BezPath {
    let style = Stroke::new(width).with_caps(Cap::Round).with_join(Join::Round);
    kurbo::stroke(
        polyline(points),
        &style,
        &StrokeOpts::default(),
        STROKE_TOLERANCE,
    )
}

/// Coverage of a round brush stroke on a `width x height` grid.
///
/// Returns `Ok(None)` for fewer than two points or a non-positive brush.
#[tracing::instrument(skip(points), fields(points = points.len()))]
pub fn stroke_coverage(
    points: &[Point],
    brush_width: f64,
    width: u32,
    height: u32,
) -> CollageResult<Option<GrayImage>> {
    if points.len() < 2 || !brush_width.is_finite() || brush_width <= 0.0 {
        return Ok(None);
    }
    let outline = stroke_outline(points, brush_width);
    fill_coverage(&outline, width, height).map(Some)
}
