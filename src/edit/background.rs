use std::sync::Arc;

use image::RgbaImage;

use crate::assets::cache::PreparedBitmap;
use crate::assets::decode::{decode_bitmap, encode_png_rgba};
use crate::assets::store::AssetStore;
use crate::edit::guard::Ticket;
use crate::foundation::core::{LayerId, Rgba8};
use crate::foundation::error::{CollageError, CollageResult};

/// Person segmentation at the engine boundary.
///
/// Returns `None` when no subject is found, otherwise the bitmap with background pixels made
/// transparent.
pub trait BackgroundRemover: Send + Sync {
    /// Segment `image`.
    fn remove_background(&self, image: &RgbaImage) -> Option<RgbaImage>;
}

impl<F> BackgroundRemover for F
where
    F: Fn(&RgbaImage) -> Option<RgbaImage> + Send + Sync,
{
    fn remove_background(&self, image: &RgbaImage) -> Option<RgbaImage> {
        self(image)
    }
}

/// Remover that keys out pixels close to one color. Useful for studio shots and tests.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorKeyRemover {
    /// Background color.
    pub key: Rgba8,
    /// Maximum per-channel distance still counted as background.
    pub tolerance: u8,
}

impl BackgroundRemover for ColorKeyRemover {
    fn remove_background(&self, image: &RgbaImage) -> Option<RgbaImage> {
        let key = [self.key.r, self.key.g, self.key.b];
        let mut out = image.clone();
        let mut kept = 0usize;
        for px in out.pixels_mut() {
            let near = px.0[..3]
                .iter()
                .zip(key)
                .all(|(&c, k)| c.abs_diff(k) <= self.tolerance);
            if near {
                px.0 = [0, 0, 0, 0];
            } else if px.0[3] != 0 {
                kept += 1;
            }
        }
        (kept > 0).then_some(out)
    }
}

/// Background removal captured on the interaction thread.
pub struct BackgroundJob {
    pub(crate) ticket: Ticket,
    layer: LayerId,
    source: String,
    target: String,
    store: Arc<dyn AssetStore>,
    remover: Arc<dyn BackgroundRemover>,
    cache_max_dim: u32,
}

impl std::fmt::Debug for BackgroundJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundJob")
            .field("ticket", &self.ticket)
            .field("layer", &self.layer)
            .field("source", &self.source)
            .field("target", &self.target)
            .finish()
    }
}

/// Worker output.
#[derive(Clone, Debug)]
pub enum BackgroundOutput {
    /// The remover found no subject; nothing was written.
    NoPersonDetected,
    /// Cut-out written to a new file; the previous source is untouched.
    Removed {
        /// File holding the cut-out bitmap.
        source: String,
        /// Display bitmap of the new source, for the cache.
        prepared: PreparedBitmap,
    },
}

/// Result handed back to the interaction thread.
#[derive(Debug)]
pub struct BackgroundResult {
    pub(crate) ticket: Ticket,
    /// Edited layer.
    pub layer: LayerId,
    /// What the worker produced.
    pub output: CollageResult<BackgroundOutput>,
}

impl BackgroundJob {
    pub(crate) fn new(
        ticket: Ticket,
        layer: LayerId,
        source: String,
        target: String,
        store: Arc<dyn AssetStore>,
        remover: Arc<dyn BackgroundRemover>,
        cache_max_dim: u32,
    ) -> Self {
        Self {
            ticket,
            layer,
            source,
            target,
            store,
            remover,
            cache_max_dim,
        }
    }

    /// Edited layer.
    pub fn layer(&self) -> LayerId {
        self.layer
    }

    /// Segment the source and write the cut-out to the target file. The source is only read.
    #[tracing::instrument(skip(self), fields(layer = %self.layer))]
    pub fn run(self) -> BackgroundResult {
        let output = self.remove();
        if let Err(e) = &output {
            tracing::warn!(error = %e, "background removal failed; layer left unchanged");
        }
        BackgroundResult {
            ticket: self.ticket,
            layer: self.layer,
            output,
        }
    }

    fn remove(&self) -> CollageResult<BackgroundOutput> {
        let original = self.store.read(&self.source)?;
        let bitmap = decode_bitmap(&original)?;
        let Some(cut) = self.remover.remove_background(&bitmap) else {
            return Ok(BackgroundOutput::NoPersonDetected);
        };
        if cut.dimensions() != bitmap.dimensions() {
            return Err(CollageError::validation(format!(
                "remover returned {:?}, expected {:?}",
                cut.dimensions(),
                bitmap.dimensions()
            )));
        }
        let encoded = encode_png_rgba(&cut)?;
        self.store.write(&self.target, &encoded).map_err(|e| {
            CollageError::persist(format!("cut-out '{}' not written: {e}", self.target))
        })?;
        Ok(BackgroundOutput::Removed {
            source: self.target.clone(),
            prepared: PreparedBitmap::from_image(cut, self.cache_max_dim),
        })
    }
}
