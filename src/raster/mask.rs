use image::imageops::FilterType;
use image::{GrayImage, Luma, RgbaImage};

use crate::foundation::math::mul_div255_u8;
use crate::raster::region::BINARY_THRESHOLD;

/// Default long-side bound for newly synthesized masks, in pixels.
pub const DEFAULT_MASK_MAX_DIM: u32 = 1024;

/// All-white (fully revealed) mask.
pub fn white_mask(width: u32, height: u32) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([255]))
}

/// Mask size for a source of `src_w x src_h`, keeping its aspect with the long side at most
/// `max_dim`. Returns `None` for an empty source.
pub fn synthesized_mask_size(src_w: u32, src_h: u32, max_dim: u32) -> Option<(u32, u32)> {
    if src_w == 0 || src_h == 0 {
        return None;
    }
    let long = src_w.max(src_h);
    if max_dim == 0 || long <= max_dim {
        return Some((src_w, src_h));
    }
    let s = f64::from(max_dim) / f64::from(long);
    let w = ((f64::from(src_w) * s).round() as u32).max(1);
    let h = ((f64::from(src_h) * s).round() as u32).max(1);
    Some((w, h))
}

/// Return `true` when a `mask` sized mask can belong to a `source` sized bitmap.
pub fn mask_matches_aspect(mask: (u32, u32), source: (u32, u32), tolerance: f64) -> bool {
    let (mw, mh) = mask;
    let (sw, sh) = source;
    if mw == 0 || mh == 0 || sw == 0 || sh == 0 {
        return false;
    }
    let ma = f64::from(mw) / f64::from(mh);
    let sa = f64::from(sw) / f64::from(sh);
    ((ma - sa) / sa).abs() <= tolerance.max(0.0)
}

/// Darken `mask` by `coverage`: `m' = m * (255 - c) / 255`. Never raises a value.
pub fn erase_with(mask: &mut GrayImage, coverage: &GrayImage) {
    debug_assert_eq!(mask.dimensions(), coverage.dimensions());
    for (m, c) in mask.iter_mut().zip(coverage.iter()) {
        *m = mul_div255_u8(u16::from(*m), 255 - u16::from(*c));
    }
}

/// Lighten `mask` by `coverage`: `m' = m + c * (255 - m) / 255`. Never lowers a value.
pub fn reveal_with(mask: &mut GrayImage, coverage: &GrayImage) {
    debug_assert_eq!(mask.dimensions(), coverage.dimensions());
    for (m, c) in mask.iter_mut().zip(coverage.iter()) {
        *m = m.saturating_add(mul_div255_u8(u16::from(*c), 255 - u16::from(*m)));
    }
}

/// Number of pixels that are not fully white.
pub fn non_white_count(mask: &GrayImage) -> usize {
    mask.iter().filter(|&&v| v != 255).count()
}

/// Copy of `src` keeping pixels where the binary `mask` is set, transparent elsewhere.
///
/// `mask` must have the same dimensions as `src`.
pub fn cut_with_binary_mask(src: &RgbaImage, mask: &GrayImage) -> RgbaImage {
    debug_assert_eq!(src.dimensions(), mask.dimensions());
    let mut out = src.clone();
    for (px, m) in out.pixels_mut().zip(mask.iter()) {
        if *m < BINARY_THRESHOLD {
            px.0 = [0, 0, 0, 0];
        }
    }
    out
}

/// Resize a mask to `width x height` (no-op when already that size).
pub fn resize_mask(mask: &GrayImage, width: u32, height: u32) -> GrayImage {
    if mask.dimensions() == (width, height) {
        return mask.clone();
    }
    image::imageops::resize(mask, width, height, FilterType::Triangle)
}

/// Multiply the alpha of straight RGBA8 `img` by `mask`, resized to the image first.
pub fn bake_mask_into_alpha(img: &mut RgbaImage, mask: &GrayImage) {
    let mask = resize_mask(mask, img.width(), img.height());
    for (px, m) in img.pixels_mut().zip(mask.iter()) {
        px.0[3] = mul_div255_u8(u16::from(px.0[3]), u16::from(*m));
    }
}

/// Alpha channel of `img` as a mask.
pub fn alpha_as_mask(img: &RgbaImage) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| Luma([img.get_pixel(x, y).0[3]]))
}

/// Scale premultiplied RGBA8 by mask luminance (mask as alpha). `mask` must match the pixel
/// count of `rgba_premul`.
pub(crate) fn apply_mask_premul_in_place(rgba_premul: &mut [u8], mask: &GrayImage) {
    for (px, m) in rgba_premul.chunks_exact_mut(4).zip(mask.iter()) {
        let m = u16::from(*m);
        if m == 255 {
            continue;
        }
        for c in px.iter_mut() {
            *c = mul_div255_u8(u16::from(*c), m);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/mask.rs"]
mod tests;
