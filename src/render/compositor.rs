//! Flattens a [`Canvas`] into one bitmap.
//!
//! Rendering is split in two. [`Scene::prepare`] runs on the interaction thread: it resolves
//! every asset through the bitmap cache and store, and logs and skips anything missing.
//! [`Scene::render`] is then a pure function of the prepared scene and may run on a worker.
//! Live preview and export both go through it, using the same transform math as interaction.

use crate::assets::cache::BitmapCache;
use crate::assets::decode::{load_mask, premultiply_rgba8_in_place};
use crate::assets::store::AssetStore;
use crate::assets::text::{TextBrush, TextLayoutEngine};
use crate::foundation::core::{Affine, LayerId, Rgba8, Size};
use crate::foundation::error::{CollageError, CollageResult};
use crate::model::canvas::Canvas;
use crate::model::drawing::Drawing;
use crate::model::layer::{ImageLayer, Layer, LayerContent, TextLayer};
use crate::raster::mask::{apply_mask_premul_in_place, resize_mask};
use crate::raster::stroke::stroke_outline;
use crate::render::cpu::{affine_to_cpu, bezpath_to_cpu, dims_u16, image_paint_from_premul};
use crate::render::frame::FrameRGBA;

/// Output settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderSettings {
    /// Output pixels per canvas unit.
    pub scale: f64,
    /// Allowed relative aspect difference between a mask and its source.
    pub mask_aspect_tolerance: f64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            scale: 1.0,
            mask_aspect_tolerance: 0.02,
        }
    }
}

/// Stable output size for a canvas: its logical size times `scale`, rounded, at least 1x1.
pub fn output_size(canvas: Size, scale: f64) -> (u32, u32) {
    let s = if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    };
    let px = |v: f64| ((v * s).round().max(1.0)).min(f64::from(u16::MAX)) as u32;
    (px(canvas.width), px(canvas.height))
}

enum SceneItem {
    Image {
        layer: LayerId,
        transform: Affine,
        paint: vello_cpu::Image,
        size: (u32, u32),
        opacity: f32,
    },
    Text {
        layer: LayerId,
        transform: Affine,
        font: vello_cpu::peniko::FontData,
        layout: parley::Layout<TextBrush>,
        opacity: f32,
    },
}

/// Everything needed to rasterize one canvas, with assets already decoded.
pub struct Scene {
    width: u32,
    height: u32,
    scale: f64,
    background: Rgba8,
    items: Vec<SceneItem>,
    drawing: Option<Drawing>,
    skipped: Vec<LayerId>,
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("items", &self.items.len())
            .field("skipped", &self.skipped)
            .finish()
    }
}

impl Scene {
    /// Resolve assets for `canvas`.
    ///
    /// Missing or corrupt bitmaps and fonts skip their layer; bad masks render as no mask.
    pub fn prepare(
        canvas: &Canvas,
        cache: &mut BitmapCache,
        store: &dyn AssetStore,
        settings: RenderSettings,
    ) -> CollageResult<Self> {
        let (width, height) = output_size(canvas.size, settings.scale);
        dims_u16(width, height)?;
        let scale = f64::from(width) / canvas.size.width;

        let mut text_engine = TextLayoutEngine::new();
        let mut items = Vec::new();
        let mut skipped = Vec::new();
        for layer in canvas.paint_order() {
            if layer.opacity <= 0.0 {
                continue;
            }
            let item = match &layer.content {
                LayerContent::Image(img) => {
                    prepare_image(canvas.size, layer, img, cache, store, settings)
                }
                LayerContent::Text(text) => {
                    prepare_text(canvas.size, layer, text, &mut text_engine, store)
                }
            };
            match item {
                Ok(item) => items.push(item),
                Err(e) => {
                    tracing::warn!(layer = %layer.id, error = %e, "layer skipped in render");
                    skipped.push(layer.id);
                }
            }
        }

        Ok(Self {
            width,
            height,
            scale,
            background: canvas.background,
            items,
            drawing: canvas.drawing.clone().filter(|d| !d.is_empty()),
            skipped,
        })
    }

    /// Output width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Output height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Layers left out because an asset could not be resolved.
    pub fn skipped(&self) -> &[LayerId] {
        &self.skipped
    }

    /// Layers that will be drawn, in paint order.
    pub fn drawn_layers(&self) -> Vec<LayerId> {
        self.items.iter().map(SceneItem::layer).collect()
    }

    /// Rasterize: background, image layers, text layers, then the freehand overlay.
    #[tracing::instrument(
        skip(self),
        fields(width = self.width, height = self.height, items = self.items.len())
    )]
    pub fn render(&self) -> CollageResult<FrameRGBA> {
        let (w, h) = dims_u16(self.width, self.height)?;
        let mut ctx = vello_cpu::RenderContext::new(w, h);
        let out_scale = Affine::scale(self.scale);

        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        let bg = self.background;
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(bg.r, bg.g, bg.b, bg.a));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.width),
            f64::from(self.height),
        ));

        for item in &self.items {
            match item {
                SceneItem::Image {
                    transform,
                    paint,
                    size,
                    opacity,
                    ..
                } => {
                    ctx.set_transform(affine_to_cpu(out_scale * *transform));
                    ctx.set_paint(paint.clone());
                    if *opacity < 1.0 {
                        ctx.push_opacity_layer(*opacity);
                    }
                    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                        0.0,
                        0.0,
                        f64::from(size.0),
                        f64::from(size.1),
                    ));
                    if *opacity < 1.0 {
                        ctx.pop_layer();
                    }
                }
                SceneItem::Text {
                    transform,
                    font,
                    layout,
                    opacity,
                    ..
                } => {
                    ctx.set_transform(affine_to_cpu(out_scale * *transform));
                    if *opacity < 1.0 {
                        ctx.push_opacity_layer(*opacity);
                    }
                    for line in layout.lines() {
                        for run_item in line.items() {
                            let parley::layout::PositionedLayoutItem::GlyphRun(run) = run_item
                            else {
                                continue;
                            };
                            let brush = run.style().brush;
                            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                                brush.r, brush.g, brush.b, brush.a,
                            ));
                            let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                                id: g.id,
                                x: g.x,
                                y: g.y,
                            });
                            ctx.glyph_run(font)
                                .font_size(run.run().font_size())
                                .fill_glyphs(glyphs);
                        }
                    }
                    if *opacity < 1.0 {
                        ctx.pop_layer();
                    }
                }
            }
        }

        if let Some(drawing) = &self.drawing {
            ctx.set_transform(affine_to_cpu(out_scale));
            for stroke in &drawing.strokes {
                if stroke.points.len() < 2 || !stroke.width.is_finite() || stroke.width <= 0.0 {
                    continue;
                }
                let c = stroke.color;
                ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a));
                ctx.fill_path(&bezpath_to_cpu(&stroke_outline(&stroke.points, stroke.width)));
            }
        }

        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        ctx.render_to_pixmap(&mut pixmap);
        Ok(FrameRGBA {
            width: self.width,
            height: self.height,
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }
}

/// Prepare and render in one go.
pub fn render_canvas(
    canvas: &Canvas,
    cache: &mut BitmapCache,
    store: &dyn AssetStore,
    settings: RenderSettings,
) -> CollageResult<FrameRGBA> {
    Scene::prepare(canvas, cache, store, settings)?.render()
}

fn prepare_image(
    canvas: Size,
    layer: &Layer,
    img: &ImageLayer,
    cache: &mut BitmapCache,
    store: &dyn AssetStore,
    settings: RenderSettings,
) -> CollageResult<SceneItem> {
    let bitmap = cache.get_or_load(store, img.display_source())?;
    let (bw, bh) = (bitmap.width(), bitmap.height());
    let mut premul = bitmap.image.as_raw().clone();
    premultiply_rgba8_in_place(&mut premul);
    if let Some(mask_name) = &img.mask
        && let Some(mask) = load_mask(
            store,
            mask_name,
            img.pixel_size(),
            settings.mask_aspect_tolerance,
        )
    {
        apply_mask_premul_in_place(&mut premul, &resize_mask(&mask, bw, bh));
    }
    let paint = image_paint_from_premul(&premul, bw, bh)?;

    // Bitmap pixels -> fitted rect inside the content box -> canvas.
    let r = img.bitmap_rect(bw, bh);
    let fit = Affine::translate((r.x0, r.y0))
        * Affine::scale_non_uniform(r.width() / f64::from(bw), r.height() / f64::from(bh));
    Ok(SceneItem::Image {
        layer: layer.id,
        transform: layer.transform.content_affine(canvas, img.size) * fit,
        paint,
        size: (bw, bh),
        opacity: layer.opacity as f32,
    })
}

fn prepare_text(
    canvas: Size,
    layer: &Layer,
    text: &TextLayer,
    engine: &mut TextLayoutEngine,
    store: &dyn AssetStore,
) -> CollageResult<SceneItem> {
    let font_bytes = store.read(&text.font)?;
    let layout = engine.layout_plain(
        &text.text,
        &font_bytes,
        text.size as f32,
        TextBrush::from(text.color),
    )?;
    let content = Size::new(f64::from(layout.width()), f64::from(layout.height()));
    if !(content.width > 0.0 && content.height > 0.0) {
        return Err(CollageError::validation("text layout is empty"));
    }
    let font = vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes), 0);
    Ok(SceneItem::Text {
        layer: layer.id,
        transform: layer.transform.content_affine(canvas, content),
        font,
        layout,
        opacity: layer.opacity as f32,
    })
}

impl SceneItem {
    fn layer(&self) -> LayerId {
        match self {
            Self::Image { layer, .. } | Self::Text { layer, .. } => *layer,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
