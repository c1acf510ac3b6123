use std::sync::Arc;

use image::RgbaImage;

use crate::assets::cache::PreparedBitmap;
use crate::assets::decode::{decode_bitmap, encode_png_rgba, load_mask};
use crate::assets::store::AssetStore;
use crate::edit::guard::Ticket;
use crate::foundation::core::{LayerId, Point, Size};
use crate::foundation::error::{CollageError, CollageResult};
use crate::model::layer::{ImageLayer, Layer, LayerContent};
use crate::raster::mask::{bake_mask_into_alpha, cut_with_binary_mask};
use crate::raster::region::rasterize_region;

/// Tunables copied out of the session when a tear starts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TearParams {
    /// Closing tolerance for drawn paths, as a fraction of the smaller bitmap side.
    pub close_fraction: f64,
    /// Allowed relative aspect difference between a mask and its source.
    pub mask_aspect_tolerance: f64,
    /// Long-side bound for the prepared bitmaps handed back to the cache.
    pub cache_max_dim: u32,
}

/// Split work captured on the interaction thread, ready to run on a worker.
pub struct TearJob {
    pub(crate) ticket: Ticket,
    layer: LayerId,
    image: ImageLayer,
    local_path: Vec<Point>,
    names: [String; 2],
    store: Arc<dyn AssetStore>,
    params: TearParams,
}

impl std::fmt::Debug for TearJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TearJob")
            .field("ticket", &self.ticket)
            .field("layer", &self.layer)
            .field("points", &self.local_path.len())
            .field("names", &self.names)
            .finish()
    }
}

/// The two bitmaps a tear produced, already durably written.
#[derive(Clone, Debug)]
pub struct TearPieces {
    /// File names of the inside and outside pieces.
    pub names: [String; 2],
    /// Full resolution size shared by both pieces.
    pub pixel_size: (u32, u32),
    /// Display bitmaps for the cache, inside first.
    pub prepared: [PreparedBitmap; 2],
}

/// Worker output.
#[derive(Clone, Debug)]
pub enum TearOutput {
    /// Path was too sparse or did not divide the image.
    TooSparse,
    /// Both pieces were written.
    Split(TearPieces),
}

/// Result handed back to the interaction thread.
#[derive(Debug)]
pub struct TearResult {
    pub(crate) ticket: Ticket,
    /// Layer the tear was started on.
    pub layer: LayerId,
    /// Image content the pieces were cut from.
    pub(crate) image: ImageLayer,
    /// What the worker produced.
    pub output: CollageResult<TearOutput>,
}

impl TearJob {
    /// Capture a tear of `layer` along `canvas_path`.
    ///
    /// Points are mapped through the inverse layer transform here, so the worker only sees
    /// layer-local coordinates. Returns `None` when `layer` is not an image layer.
    pub(crate) fn capture(
        ticket: Ticket,
        layer: &Layer,
        canvas_size: Size,
        canvas_path: &[Point],
        names: [String; 2],
        store: Arc<dyn AssetStore>,
        params: TearParams,
    ) -> Option<Self> {
        let image = layer.as_image()?.clone();
        let local_path = canvas_path
            .iter()
            .map(|&p| layer.transform.to_local(p, canvas_size, image.size))
            .collect();
        Some(Self {
            ticket,
            layer: layer.id,
            image,
            local_path,
            names,
            store,
            params,
        })
    }

    /// Layer being torn.
    pub fn layer(&self) -> LayerId {
        self.layer
    }

    /// Do the expensive part: decode, rasterize, cut, encode and persist both pieces.
    #[tracing::instrument(skip(self), fields(layer = %self.layer))]
    pub fn run(self) -> TearResult {
        let output = self.split();
        if let Err(e) = &output {
            tracing::warn!(error = %e, "tear failed; layer left unchanged");
        }
        TearResult {
            ticket: self.ticket,
            layer: self.layer,
            image: self.image,
            output,
        }
    }

    fn split(&self) -> CollageResult<TearOutput> {
        let bitmap = self.load_visible_bitmap()?;
        let (bw, bh) = bitmap.dimensions();
        let pixel_path = local_to_pixels(&self.image, &self.local_path, bw, bh);

        let Some(masks) = rasterize_region(&pixel_path, bw, bh, self.params.close_fraction)? else {
            return Ok(TearOutput::TooSparse);
        };
        let inside = cut_with_binary_mask(&bitmap, &masks.inside);
        let outside = cut_with_binary_mask(&bitmap, &masks.outside);

        let inside_png = encode_png_rgba(&inside)?;
        let outside_png = encode_png_rgba(&outside)?;
        for (name, bytes) in self.names.iter().zip([&inside_png, &outside_png]) {
            self.store.write(name, bytes).map_err(|e| {
                CollageError::persist(format!("tear piece '{name}' not written: {e}"))
            })?;
        }

        let max_dim = self.params.cache_max_dim;
        Ok(TearOutput::Split(TearPieces {
            names: self.names.clone(),
            pixel_size: (bw, bh),
            prepared: [
                PreparedBitmap::from_image(inside, max_dim),
                PreparedBitmap::from_image(outside, max_dim),
            ],
        }))
    }

    /// Full resolution bitmap as currently displayed (legacy erased file or source with its
    /// mask baked into alpha).
    fn load_visible_bitmap(&self) -> CollageResult<RgbaImage> {
        let name = self.image.display_source();
        let mut bitmap = decode_bitmap(&self.store.read(name)?)?;
        if let Some(mask_name) = &self.image.mask
            && let Some(mask) = load_mask(
                self.store.as_ref(),
                mask_name,
                bitmap.dimensions(),
                self.params.mask_aspect_tolerance,
            )
        {
            bake_mask_into_alpha(&mut bitmap, &mask);
        }
        Ok(bitmap)
    }
}

/// Map layer-local content points into the pixel grid of a `bw x bh` bitmap that is
/// aspect-fit into the layer's content rect. Out of range points are clamped later.
pub(crate) fn local_to_pixels(
    image: &ImageLayer,
    local: &[Point],
    bw: u32,
    bh: u32,
) -> Vec<Point> {
    let r = image.bitmap_rect(bw, bh);
    if r.width() <= 0.0 || r.height() <= 0.0 {
        return Vec::new();
    }
    let sx = f64::from(bw) / r.width();
    let sy = f64::from(bh) / r.height();
    local
        .iter()
        .map(|p| Point::new((p.x - r.x0) * sx, (p.y - r.y0) * sy))
        .collect()
}

/// Build the two child layers replacing `original`.
///
/// The inside piece keeps `original.z_index` and moves by `(-sep/2, -sep)`; the outside piece
/// takes `z_index + 1` and moves by `(+sep/2, +sep)`.
pub(crate) fn child_layers(
    original: &Layer,
    pieces: &TearPieces,
    ids: [LayerId; 2],
    separation: f64,
) -> Option<[Layer; 2]> {
    let src = original.as_image()?;
    let (pw, ph) = pieces.pixel_size;
    let make = |id: LayerId, name: &str, dx: f64, dy: f64, z: i32| {
        let mut layer = Layer::new(
            id,
            original.transform.translated(dx, dy),
            z,
            LayerContent::Image(ImageLayer::new(name, pw, ph, src.size)),
        );
        layer.opacity = original.opacity;
        layer
    };
    let half = separation * 0.5;
    Some([
        make(ids[0], &pieces.names[0], -half, -separation, original.z_index),
        make(
            ids[1],
            &pieces.names[1],
            half,
            separation,
            original.z_index.saturating_add(1),
        ),
    ])
}

#[cfg(test)]
#[path = "../../tests/unit/edit/tear.rs"]
mod tests;
