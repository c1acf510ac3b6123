use crate::foundation::core::Vec2;
use crate::foundation::math::rotate_vec;
use crate::geometry::transform::{Transform, clamp_scale};

/// Accumulated delta of one continuous gesture, measured from gesture start.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GestureDelta {
    /// Translation reported in the layer's gesture frame.
    ///
    /// The frame is rotated along with the layer, so the delta is rotated by the negative of
    /// the current rotation before it is added. A rotated layer then follows the finger in
    /// screen space.
    Drag {
        /// Horizontal delta.
        dx: f64,
        /// Vertical delta.
        dy: f64,
    },
    /// Multiplicative pinch factor relative to gesture start.
    Pinch {
        /// Scale factor, `1.0` means unchanged.
        factor: f64,
    },
    /// Additive rotation relative to gesture start.
    Rotate {
        /// Rotation delta in radians.
        radians: f64,
    },
}

/// Apply an accumulated gesture delta to the transform captured at gesture start.
pub fn apply_gesture(base: Transform, delta: GestureDelta) -> Transform {
    match delta {
        GestureDelta::Drag { dx, dy } => {
            let d = rotate_vec(Vec2::new(dx, dy), -base.rotation);
            base.translated(d.x, d.y)
        }
        GestureDelta::Pinch { factor } => {
            let factor = if factor.is_finite() && factor > 0.0 {
                factor
            } else {
                1.0
            };
            Transform {
                scale: clamp_scale(base.scale * factor),
                ..base
            }
        }
        GestureDelta::Rotate { radians } => Transform {
            rotation: base.rotation + radians,
            ..base
        },
    }
}

/// Incremental gesture state: each update recomputes from the captured base, never from the
/// previous intermediate value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GestureTracker {
    base: Transform,
    current: Transform,
}

impl GestureTracker {
    /// Capture the transform at gesture start.
    pub fn begin(base: Transform) -> Self {
        Self {
            base,
            current: base,
        }
    }

    /// Transform captured at gesture start.
    pub fn base(&self) -> Transform {
        self.base
    }

    /// Feed the accumulated delta and return the live transform.
    pub fn update(&mut self, delta: GestureDelta) -> Transform {
        self.current = apply_gesture(self.base, delta);
        self.current
    }

    /// Finish the gesture; the returned value becomes the committed base.
    pub fn end(self) -> Transform {
        self.current
    }
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/gesture.rs"]
mod tests;
