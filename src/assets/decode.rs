use std::io::Cursor;

use anyhow::Context;
use image::{GrayImage, RgbaImage};

use crate::assets::store::AssetStore;
use crate::foundation::error::{CollageError, CollageResult};
use crate::raster::mask::mask_matches_aspect;

/// Decode any supported raster format into straight-alpha RGBA8.
pub fn decode_bitmap(bytes: &[u8]) -> CollageResult<RgbaImage> {
    let dyn_img = image::load_from_memory(bytes)
        .context("decode image from memory")
        .map_err(|e| CollageError::decode(format!("{e:#}")))?;
    Ok(dyn_img.to_rgba8())
}

/// Decode a mask file into a single luminance channel.
pub fn decode_mask(bytes: &[u8]) -> CollageResult<GrayImage> {
    let dyn_img = image::load_from_memory(bytes)
        .context("decode mask from memory")
        .map_err(|e| CollageError::decode(format!("{e:#}")))?;
    let mask = dyn_img.to_luma8();
    if mask.width() == 0 || mask.height() == 0 {
        return Err(CollageError::decode("mask has zero dimensions"));
    }
    Ok(mask)
}

/// Load the mask `name` for a source of `source` pixels.
///
/// A missing, corrupt or wrongly proportioned mask is treated as absent and logged.
pub fn load_mask(
    store: &dyn AssetStore,
    name: &str,
    source: (u32, u32),
    aspect_tolerance: f64,
) -> Option<GrayImage> {
    let mask = match store.read(name).and_then(|b| decode_mask(&b)) {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!(mask = %name, error = %e, "mask unreadable; treating as absent");
            return None;
        }
    };
    if !mask_matches_aspect(mask.dimensions(), source, aspect_tolerance) {
        tracing::warn!(
            mask = %name,
            mask_size = ?mask.dimensions(),
            source_size = ?source,
            "mask aspect does not match source; treating as absent"
        );
        return None;
    }
    Some(mask)
}

/// Encode straight-alpha RGBA8 as PNG.
pub fn encode_png_rgba(img: &RgbaImage) -> CollageResult<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode rgba png")?;
    Ok(buf)
}

/// Encode a single channel mask as PNG.
pub fn encode_png_gray(img: &GrayImage) -> CollageResult<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode gray png")?;
    Ok(buf)
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = (((*c as u16) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
