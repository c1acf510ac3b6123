use std::path::Path;

use crate::assets::cache::BitmapCache;
use crate::foundation::core::{LayerId, Point, Rect, Rgba8, Size};
use crate::foundation::error::{CollageError, CollageResult};
use crate::foundation::math::aspect_fit;
use crate::geometry::transform::Transform;
use crate::model::drawing::Drawing;
use crate::model::layer::{ImageLayer, Layer, LayerContent, TextLayer};

/// The edited document: a fixed logical size, ordered layers and an optional freehand overlay.
///
/// Every field is plain data, so the canvas round-trips through JSON unchanged.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Logical size in device-independent units.
    pub size: Size,
    /// Background fill.
    #[serde(default)]
    pub background: Rgba8,
    /// Full-canvas freehand overlay.
    #[serde(default)]
    pub drawing: Option<Drawing>,
    layers: Vec<Layer>,
    next_layer_id: u64,
}

impl Canvas {
    /// Empty canvas with a white background.
    pub fn new(width: f64, height: f64) -> CollageResult<Self> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(CollageError::validation("canvas size must be finite and > 0"));
        }
        Ok(Self {
            size: Size::new(width, height),
            background: Rgba8::WHITE,
            drawing: None,
            layers: Vec::new(),
            next_layer_id: 1,
        })
    }

    /// Parse a canvas from JSON.
    pub fn from_json_str(s: &str) -> CollageResult<Self> {
        let canvas: Self =
            serde_json::from_str(s).map_err(|e| CollageError::serde(e.to_string()))?;
        canvas.validate()?;
        Ok(canvas)
    }

    /// Read and parse a canvas JSON file.
    pub fn from_json_path(path: impl AsRef<Path>) -> CollageResult<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path).map_err(|e| {
            CollageError::asset(format!("failed to read canvas '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&s)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> CollageResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| CollageError::serde(e.to_string()))
    }

    /// Check structural invariants after loading from outside.
    pub fn validate(&self) -> CollageResult<()> {
        if !(self.size.width > 0.0 && self.size.height > 0.0) {
            return Err(CollageError::validation("canvas size must be > 0"));
        }
        let mut seen = std::collections::BTreeSet::new();
        for l in &self.layers {
            if !seen.insert(l.id) {
                return Err(CollageError::validation(format!("duplicate layer id {}", l.id)));
            }
            if l.id.0 >= self.next_layer_id {
                return Err(CollageError::validation(format!(
                    "layer id {} not below next_layer_id {}",
                    l.id, self.next_layer_id
                )));
            }
        }
        Ok(())
    }

    /// Layers in insertion order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Return `true` when the canvas has no layers.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layer by id.
    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// Mutable layer by id.
    pub fn layer_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    /// Insertion index of a layer.
    pub fn index_of(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    /// Reserve a fresh id. Ids are never handed out twice.
    pub fn allocate_id(&mut self) -> LayerId {
        let id = LayerId(self.next_layer_id);
        self.next_layer_id += 1;
        id
    }

    /// Highest z-index in use.
    pub fn max_z(&self) -> Option<i32> {
        self.layers.iter().map(|l| l.z_index).max()
    }

    fn next_z(&self) -> i32 {
        self.max_z().map_or(0, |z| z.saturating_add(1))
    }

    /// Default content size for a bitmap: natural pixel size, shrunk (aspect-fit) to the canvas.
    pub fn default_image_size(&self, pixel_width: u32, pixel_height: u32) -> Size {
        let natural = Size::new(f64::from(pixel_width), f64::from(pixel_height));
        if natural.width <= self.size.width && natural.height <= self.size.height {
            return natural;
        }
        aspect_fit(natural, Rect::from_origin_size((0.0, 0.0), self.size)).size()
    }

    /// Add an image layer on top of the current stack.
    pub fn add_image(&mut self, image: ImageLayer, transform: Transform) -> LayerId {
        let id = self.allocate_id();
        let z = self.next_z();
        self.layers
            .push(Layer::new(id, transform, z, LayerContent::Image(image)));
        id
    }

    /// Add a text layer on top of the current stack.
    pub fn add_text(&mut self, text: TextLayer, transform: Transform) -> LayerId {
        let id = self.allocate_id();
        let z = self.next_z();
        self.layers
            .push(Layer::new(id, transform, z, LayerContent::Text(text)));
        id
    }

    /// Append an existing layer.
    ///
    /// The id must have come from [`Canvas::allocate_id`] on this canvas.
    pub fn push_layer(&mut self, layer: Layer) {
        self.bump_id_floor(layer.id);
        self.layers.push(layer);
    }

    /// Insert at `index`; an index past the end appends.
    pub fn insert_layer(&mut self, index: usize, layer: Layer) {
        self.bump_id_floor(layer.id);
        if index <= self.layers.len() {
            self.layers.insert(index, layer);
        } else {
            self.layers.push(layer);
        }
    }

    /// Remove a layer, returning it with the index it held.
    pub fn remove_layer(&mut self, id: LayerId) -> Option<(usize, Layer)> {
        let idx = self.index_of(id)?;
        Some((idx, self.layers.remove(idx)))
    }

    fn bump_id_floor(&mut self, id: LayerId) {
        if id.0 >= self.next_layer_id {
            self.next_layer_id = id.0 + 1;
        }
    }

    /// Total paint order: image layers then text layers, each by `(z_index, insertion index)`.
    pub fn paint_order(&self) -> Vec<&Layer> {
        let mut images: Vec<(usize, &Layer)> = Vec::new();
        let mut texts: Vec<(usize, &Layer)> = Vec::new();
        for (i, l) in self.layers.iter().enumerate() {
            if l.is_image() {
                images.push((i, l));
            } else {
                texts.push((i, l));
            }
        }
        images.sort_by_key(|(i, l)| (l.z_index, *i));
        texts.sort_by_key(|(i, l)| (l.z_index, *i));
        images.into_iter().chain(texts).map(|(_, l)| l).collect()
    }

    /// Topmost image layer under canvas `point`.
    ///
    /// When `cache` holds the layer's bitmap, its opaque bounds narrow the hit area so clicks on
    /// fully transparent margins fall through.
    pub fn hit_test(&self, point: Point, cache: &BitmapCache) -> Option<LayerId> {
        for layer in self.paint_order().into_iter().rev() {
            let Some(img) = layer.as_image() else {
                continue;
            };
            let local = layer.transform.to_local(point, self.size, img.size);
            let content = Rect::from_origin_size((0.0, 0.0), img.size);
            if !content.contains(local) {
                continue;
            }
            let name = img.display_source();
            let (Some(meta), Some(bitmap)) = (cache.meta(name), cache_dims(cache, name)) else {
                return Some(layer.id);
            };
            let Some(bounds) = meta.opaque_bounds else {
                continue;
            };
            let r = img.bitmap_rect(bitmap.0, bitmap.1);
            let px = (local.x - r.x0) / r.width() * f64::from(bitmap.0);
            let py = (local.y - r.y0) / r.height() * f64::from(bitmap.1);
            if px >= f64::from(bounds.x0)
                && px <= f64::from(bounds.x1)
                && py >= f64::from(bounds.y0)
                && py <= f64::from(bounds.y1)
            {
                return Some(layer.id);
            }
        }
        None
    }
}

fn cache_dims(cache: &BitmapCache, name: &str) -> Option<(u32, u32)> {
    cache.peek(name).map(|p| (p.width(), p.height()))
}

#[cfg(test)]
#[path = "../../tests/unit/model/canvas.rs"]
mod tests;
