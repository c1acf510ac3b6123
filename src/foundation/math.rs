use crate::foundation::core::{Rect, Size, Vec2};

#[derive(Clone, Copy, Debug)]
pub(crate) struct Fnv1a64(u64);

impl Fnv1a64 {
    pub(crate) const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01B3;

    pub(crate) fn new_default() -> Self {
        Self(Self::OFFSET_BASIS)
    }

    pub(crate) fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub(crate) fn write_bytes(&mut self, bytes: &[u8]) {
        let mut h = self.0;
        for &b in bytes {
            h ^= u64::from(b);
            h = h.wrapping_mul(Self::PRIME);
        }
        self.0 = h;
    }

    pub(crate) fn finish(self) -> u64 {
        self.0
    }
}

pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

/// Largest rect with `content`'s aspect ratio that fits in `bounds`, centered.
///
/// Degenerate content returns `bounds` unchanged.
pub(crate) fn aspect_fit(content: Size, bounds: Rect) -> Rect {
    if content.width <= 0.0 || content.height <= 0.0 {
        return bounds;
    }
    let s = (bounds.width() / content.width).min(bounds.height() / content.height);
    let w = content.width * s;
    let h = content.height * s;
    let x0 = bounds.x0 + (bounds.width() - w) * 0.5;
    let y0 = bounds.y0 + (bounds.height() - h) * 0.5;
    Rect::new(x0, y0, x0 + w, y0 + h)
}

/// Rotate `v` by `radians` (positive turns +x toward +y).
pub(crate) fn rotate_vec(v: Vec2, radians: f64) -> Vec2 {
    let (s, c) = radians.sin_cos();
    Vec2::new(v.x * c - v.y * s, v.x * s + v.y * c)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
