use std::sync::Arc;

use image::GrayImage;

use crate::assets::decode::{decode_bitmap, encode_png_gray, load_mask};
use crate::assets::store::AssetStore;
use crate::edit::guard::Ticket;
use crate::foundation::core::{BezPath, LayerId, Point, Rect, Size};
use crate::foundation::error::{CollageError, CollageResult};
use crate::foundation::math::aspect_fit;
use crate::model::layer::ImageLayer;
use crate::raster::mask::{
    alpha_as_mask, erase_with, non_white_count, resize_mask, reveal_with, synthesized_mask_size,
    white_mask,
};
use crate::raster::stroke::{polyline, stroke_coverage};

/// What a brush stroke does to the mask.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrushMode {
    /// Paint black: hide pixels.
    #[default]
    Erase,
    /// Paint white: bring hidden pixels back.
    Reveal,
}

/// Points of one stroke, collected during the gesture and committed once at its end.
///
/// Points arrive in painting-surface coordinates. The surface shows the mask aspect-fit, and
/// points outside that displayed rect are dropped.
#[derive(Clone, Debug)]
pub struct StrokeBuffer {
    mode: BrushMode,
    brush_size: f64,
    display: Rect,
    mask_size: (u32, u32),
    surface_points: Vec<Point>,
    mask_points: Vec<Point>,
}

impl StrokeBuffer {
    /// Empty buffer for a `mask_size` mask shown on a `surface` sized painting surface.
    ///
    /// `brush_size` is measured in surface units.
    pub fn new(surface: Size, mask_size: (u32, u32), brush_size: f64, mode: BrushMode) -> Self {
        let display = aspect_fit(
            Size::new(f64::from(mask_size.0), f64::from(mask_size.1)),
            Rect::from_origin_size((0.0, 0.0), surface),
        );
        Self {
            mode,
            brush_size,
            display,
            mask_size,
            surface_points: Vec::new(),
            mask_points: Vec::new(),
        }
    }

    /// Brush mode.
    pub fn mode(&self) -> BrushMode {
        self.mode
    }

    /// Rect the mask occupies on the surface.
    pub fn display_rect(&self) -> Rect {
        self.display
    }

    /// Record one surface point. Returns `false` if it fell outside the displayed mask.
    pub fn push(&mut self, p: Point) -> bool {
        let r = self.display;
        let inside = p.x.is_finite()
            && p.y.is_finite()
            && p.x >= r.x0
            && p.x <= r.x1
            && p.y >= r.y0
            && p.y <= r.y1;
        if !inside || r.width() <= 0.0 || r.height() <= 0.0 {
            return false;
        }
        let sx = f64::from(self.mask_size.0) / r.width();
        let sy = f64::from(self.mask_size.1) / r.height();
        self.surface_points.push(p);
        self.mask_points
            .push(Point::new((p.x - r.x0) * sx, (p.y - r.y0) * sy));
        true
    }

    /// Number of accepted points.
    pub fn len(&self) -> usize {
        self.mask_points.len()
    }

    /// Return `true` when no point was accepted.
    pub fn is_empty(&self) -> bool {
        self.mask_points.is_empty()
    }

    /// Accepted points in mask pixel space.
    pub fn mask_points(&self) -> &[Point] {
        &self.mask_points
    }

    /// Brush width in mask pixels.
    pub fn brush_in_mask_px(&self) -> f64 {
        if self.display.width() <= 0.0 {
            return 0.0;
        }
        self.brush_size * f64::from(self.mask_size.0) / self.display.width()
    }

    /// Live feedback polyline in surface coordinates, drawn while the stroke is in progress.
    pub fn preview_path(&self) -> BezPath {
        polyline(&self.surface_points)
    }
}

/// Starting mask for a layer: its current mask, else the alpha of a legacy erased bitmap,
/// else all white. The long side of a synthesized mask is at most `max_dim`.
pub(crate) fn starting_mask(
    store: &dyn AssetStore,
    image: &ImageLayer,
    max_dim: u32,
    aspect_tolerance: f64,
) -> Option<GrayImage> {
    if let Some(name) = &image.mask
        && let Some(mask) = load_mask(store, name, image.pixel_size(), aspect_tolerance)
    {
        return Some(mask);
    }
    let (w, h) = synthesized_mask_size(image.pixel_width, image.pixel_height, max_dim)?;
    if image.mask.is_none()
        && let Some(erased) = &image.erased
    {
        match store.read(erased).and_then(|b| decode_bitmap(&b)) {
            Ok(img) => return Some(resize_mask(&alpha_as_mask(&img), w, h)),
            Err(e) => tracing::warn!(file = %erased, error = %e, "erased bitmap unreadable"),
        }
    }
    Some(white_mask(w, h))
}

/// One committed stroke, ready to rasterize on a worker.
pub struct MaskStrokeJob {
    pub(crate) ticket: Ticket,
    layer: LayerId,
    base: GrayImage,
    buffer: StrokeBuffer,
    target: String,
    store: Arc<dyn AssetStore>,
}

impl std::fmt::Debug for MaskStrokeJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaskStrokeJob")
            .field("ticket", &self.ticket)
            .field("layer", &self.layer)
            .field("mask", &self.base.dimensions())
            .field("points", &self.buffer.len())
            .field("target", &self.target)
            .finish()
    }
}

/// Worker output.
#[derive(Clone, Debug, PartialEq)]
pub enum MaskStrokeOutput {
    /// Fewer than two points, or a brush too thin to paint.
    TooSparse,
    /// The stroked mask was written to `name`.
    Painted {
        /// New mask file.
        name: String,
        /// Pixels not fully white after the stroke.
        non_white: usize,
    },
}

/// Result handed back to the interaction thread.
#[derive(Debug)]
pub struct MaskStrokeResult {
    pub(crate) ticket: Ticket,
    /// Painted layer.
    pub layer: LayerId,
    /// What the worker produced.
    pub output: CollageResult<MaskStrokeOutput>,
}

impl MaskStrokeJob {
    pub(crate) fn new(
        ticket: Ticket,
        layer: LayerId,
        base: GrayImage,
        buffer: StrokeBuffer,
        target: String,
        store: Arc<dyn AssetStore>,
    ) -> Self {
        Self {
            ticket,
            layer,
            base,
            buffer,
            target,
            store,
        }
    }

    /// Painted layer.
    pub fn layer(&self) -> LayerId {
        self.layer
    }

    /// Rasterize the whole stroke in one pass onto the starting mask and persist it.
    #[tracing::instrument(skip(self), fields(layer = %self.layer, points = self.buffer.len()))]
    pub fn run(self) -> MaskStrokeResult {
        let output = self.paint();
        if let Err(e) = &output {
            tracing::warn!(error = %e, "mask stroke failed; mask left unchanged");
        }
        MaskStrokeResult {
            ticket: self.ticket,
            layer: self.layer,
            output,
        }
    }

    fn paint(&self) -> CollageResult<MaskStrokeOutput> {
        let (w, h) = self.base.dimensions();
        if w == 0 || h == 0 {
            return Ok(MaskStrokeOutput::TooSparse);
        }
        let Some(coverage) =
            stroke_coverage(self.buffer.mask_points(), self.buffer.brush_in_mask_px(), w, h)?
        else {
            return Ok(MaskStrokeOutput::TooSparse);
        };
        let mut mask = self.base.clone();
        match self.buffer.mode() {
            BrushMode::Erase => erase_with(&mut mask, &coverage),
            BrushMode::Reveal => reveal_with(&mut mask, &coverage),
        }
        let bytes = encode_png_gray(&mask)?;
        self.store.write(&self.target, &bytes).map_err(|e| {
            CollageError::persist(format!("mask '{}' not written: {e}", self.target))
        })?;
        Ok(MaskStrokeOutput::Painted {
            name: self.target.clone(),
            non_white: non_white_count(&mask),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/edit/mask_paint.rs"]
mod tests;
