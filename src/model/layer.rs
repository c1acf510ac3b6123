use crate::foundation::core::{LayerId, Rect, Rgba8, Size};
use crate::foundation::math::aspect_fit;
use crate::geometry::transform::Transform;

/// Image content of a layer. All references are stable file names in the project asset store.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ImageLayer {
    /// Source bitmap file.
    pub source: String,
    /// Natural pixel width of the source bitmap.
    pub pixel_width: u32,
    /// Natural pixel height of the source bitmap.
    pub pixel_height: u32,
    /// Untransformed content size in canvas units.
    pub size: Size,
    /// Grayscale mask file (white keeps, black erases). Supersedes `erased`.
    #[serde(default)]
    pub mask: Option<String>,
    /// Legacy pre-rasterized erased bitmap, drawn instead of `source` when no mask exists.
    #[serde(default)]
    pub erased: Option<String>,
}

impl ImageLayer {
    /// Image content without mask, sized `size` on the canvas.
    pub fn new(source: impl Into<String>, pixel_width: u32, pixel_height: u32, size: Size) -> Self {
        Self {
            source: source.into(),
            pixel_width,
            pixel_height,
            size,
            mask: None,
            erased: None,
        }
    }

    /// Natural pixel size as a tuple.
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.pixel_width, self.pixel_height)
    }

    /// Rect (in local content coordinates) a `bitmap_w x bitmap_h` bitmap occupies when
    /// aspect-fit into the content rect.
    pub fn bitmap_rect(&self, bitmap_w: u32, bitmap_h: u32) -> Rect {
        aspect_fit(
            Size::new(f64::from(bitmap_w), f64::from(bitmap_h)),
            Rect::from_origin_size((0.0, 0.0), self.size),
        )
    }

    /// File drawn for this layer when no mask applies.
    pub fn display_source(&self) -> &str {
        match (&self.mask, &self.erased) {
            (None, Some(erased)) => erased,
            _ => &self.source,
        }
    }
}

/// Text content of a layer.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TextLayer {
    /// String content.
    pub text: String,
    /// Font file name in the asset store.
    pub font: String,
    /// Font size in canvas units.
    pub size: f64,
    /// Fill color.
    pub color: Rgba8,
}

/// Layer variants.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerContent {
    /// Photo layer.
    Image(ImageLayer),
    /// Text layer.
    Text(TextLayer),
}

/// One positionable unit of canvas content.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Layer {
    /// Stable identifier, immutable for the layer's lifetime.
    pub id: LayerId,
    /// Placement on the canvas.
    pub transform: Transform,
    /// Paint order key (ascending). Ties are broken by insertion order.
    pub z_index: i32,
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
    /// Variant payload.
    pub content: LayerContent,
}

impl Layer {
    /// New fully opaque layer.
    pub fn new(id: LayerId, transform: Transform, z_index: i32, content: LayerContent) -> Self {
        Self {
            id,
            transform,
            z_index,
            opacity: 1.0,
            content,
        }
    }

    /// Image payload, if this is an image layer.
    pub fn as_image(&self) -> Option<&ImageLayer> {
        match &self.content {
            LayerContent::Image(img) => Some(img),
            LayerContent::Text(_) => None,
        }
    }

    /// Mutable image payload, if this is an image layer.
    pub fn as_image_mut(&mut self) -> Option<&mut ImageLayer> {
        match &mut self.content {
            LayerContent::Image(img) => Some(img),
            LayerContent::Text(_) => None,
        }
    }

    /// Text payload, if this is a text layer.
    pub fn as_text(&self) -> Option<&TextLayer> {
        match &self.content {
            LayerContent::Text(t) => Some(t),
            LayerContent::Image(_) => None,
        }
    }

    /// Return `true` for image layers.
    pub fn is_image(&self) -> bool {
        matches!(self.content, LayerContent::Image(_))
    }

    /// Set opacity, clamped to `[0, 1]`.
    pub fn set_opacity(&mut self, opacity: f64) {
        self.opacity = if opacity.is_finite() {
            opacity.clamp(0.0, 1.0)
        } else {
            1.0
        };
    }
}
