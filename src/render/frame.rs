use image::RgbaImage;

use crate::assets::decode::{encode_png_rgba, unpremultiply_rgba8_in_place};
use crate::foundation::error::{CollageError, CollageResult};
use crate::foundation::math::Fnv1a64;

/// One flattened RGBA8 bitmap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major RGBA8 pixels.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied by alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Straight-alpha copy as an `image` buffer.
    pub fn to_rgba_image(&self) -> CollageResult<RgbaImage> {
        let mut data = self.data.clone();
        if self.premultiplied {
            unpremultiply_rgba8_in_place(&mut data);
        }
        RgbaImage::from_raw(self.width, self.height, data)
            .ok_or_else(|| CollageError::validation("frame buffer size mismatch"))
    }

    /// Encode as PNG (straight alpha).
    pub fn to_png(&self) -> CollageResult<Vec<u8>> {
        encode_png_rgba(&self.to_rgba_image()?)
    }

    /// Premultiplied RGBA8 at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// FNV-1a 64 hash over size and pixels, for cheap determinism checks.
pub fn fingerprint(frame: &FrameRGBA) -> u64 {
    let mut h = Fnv1a64::new_default();
    h.write_u32(frame.width);
    h.write_u32(frame.height);
    h.write_bytes(&frame.data);
    h.finish()
}
