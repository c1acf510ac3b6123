use crate::foundation::core::{Affine, Point, Size, Vec2};
use crate::foundation::math::rotate_vec;

/// Smallest allowed uniform scale.
pub const MIN_SCALE: f64 = 0.1;
/// Largest allowed uniform scale.
pub const MAX_SCALE: f64 = 15.0;

/// Placement of a layer on the canvas.
///
/// `x`/`y` are offsets of the layer center from the canvas center. Mapping local content to
/// canvas space is always scale, then rotate (both about the layer's own center), then translate.
/// The same mapping backs live interaction, hit testing, tearing and export.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transform {
    /// Horizontal offset from the canvas center.
    pub x: f64,
    /// Vertical offset from the canvas center.
    pub y: f64,
    /// Uniform scale, always within `[MIN_SCALE, MAX_SCALE]`.
    pub scale: f64,
    /// Rotation in radians.
    pub rotation: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// `(0, 0, 1, 0)`.
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        scale: 1.0,
        rotation: 0.0,
    };

    /// Build a transform, clamping `scale` into range.
    pub fn new(x: f64, y: f64, scale: f64, rotation: f64) -> Self {
        Self {
            x,
            y,
            scale: clamp_scale(scale),
            rotation,
        }
    }

    /// Position offset as a vector.
    pub fn offset(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Return a copy moved by `(dx, dy)` in canvas units.
    pub fn translated(self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }

    /// Affine mapping local content coordinates (origin at the content's top-left corner,
    /// `content` sized) into canvas coordinates for a canvas of size `canvas`.
    pub fn content_affine(&self, canvas: Size, content: Size) -> Affine {
        let center = Vec2::new(canvas.width * 0.5, canvas.height * 0.5) + self.offset();
        Affine::translate(center)
            * Affine::rotate(self.rotation)
            * Affine::scale(clamp_scale(self.scale))
            * Affine::translate(Vec2::new(-content.width * 0.5, -content.height * 0.5))
    }

    /// Map a local content point into canvas space.
    pub fn to_canvas(&self, local: Point, canvas: Size, content: Size) -> Point {
        self.content_affine(canvas, content) * local
    }

    /// Map a canvas point into local content coordinates.
    ///
    /// Undoes translate, rotate and scale in that order, the exact reverse of
    /// [`Transform::content_affine`].
    pub fn to_local(&self, p: Point, canvas: Size, content: Size) -> Point {
        let center = Vec2::new(canvas.width * 0.5, canvas.height * 0.5) + self.offset();
        let v = p.to_vec2() - center;
        let v = rotate_vec(v, -self.rotation);
        let v = v / clamp_scale(self.scale);
        Point::new(v.x + content.width * 0.5, v.y + content.height * 0.5)
    }
}

/// Clamp a scale into `[MIN_SCALE, MAX_SCALE]`. Non-finite input maps to `1.0`.
pub fn clamp_scale(scale: f64) -> f64 {
    if !scale.is_finite() {
        return 1.0;
    }
    scale.clamp(MIN_SCALE, MAX_SCALE)
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/transform.rs"]
mod tests;
