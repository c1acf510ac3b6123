use std::path::Path;
use std::time::Duration;

use crate::assets::cache::{DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_MAX_DIM};
use crate::foundation::error::{CollageError, CollageResult};
use crate::raster::mask::DEFAULT_MASK_MAX_DIM;
use crate::raster::region::DEFAULT_CLOSE_FRACTION;
use crate::render::compositor::RenderSettings;

/// Tunables for an [`crate::EditSession`].
///
/// Unknown JSON keys are rejected; missing keys take their defaults.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionOpts {
    /// Bitmap cache entry limit.
    pub cache_capacity: usize,
    /// Long-side bound for cached bitmaps, in pixels.
    pub cache_max_dim: u32,
    /// Long-side bound for newly synthesized masks, in pixels.
    pub mask_max_dim: u32,
    /// Distance between the two halves of a tear, in canvas units.
    pub tear_separation: f64,
    /// Minimum time between tear starts, in milliseconds.
    pub tear_cooldown_ms: u64,
    /// Minimum time between mask stroke starts, in milliseconds.
    pub mask_cooldown_ms: u64,
    /// Closing tolerance for drawn paths, as a fraction of the smaller bitmap side.
    pub close_fraction: f64,
    /// Output pixels per canvas unit for render and export.
    pub export_scale: f64,
    /// Allowed relative aspect difference between a mask and its source.
    pub mask_aspect_tolerance: f64,
}

impl Default for SessionOpts {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_max_dim: DEFAULT_CACHE_MAX_DIM,
            mask_max_dim: DEFAULT_MASK_MAX_DIM,
            tear_separation: 20.0,
            tear_cooldown_ms: 1000,
            mask_cooldown_ms: 0,
            close_fraction: DEFAULT_CLOSE_FRACTION,
            export_scale: 1.0,
            mask_aspect_tolerance: 0.02,
        }
    }
}

impl SessionOpts {
    /// Parse options from JSON.
    pub fn from_json_str(s: &str) -> CollageResult<Self> {
        let opts: Self = serde_json::from_str(s).map_err(|e| CollageError::serde(e.to_string()))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Read options from a JSON file.
    pub fn from_json_path(path: impl AsRef<Path>) -> CollageResult<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path).map_err(|e| {
            CollageError::asset(format!("failed to read options '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&s)
    }

    /// Apply `COLLAGE_CACHE_CAPACITY` and `COLLAGE_CACHE_MAX_DIM` when set to positive integers.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(n) = env_positive("COLLAGE_CACHE_CAPACITY") {
            self.cache_capacity = n;
        }
        if let Some(n) = env_positive("COLLAGE_CACHE_MAX_DIM").and_then(|n| u32::try_from(n).ok()) {
            self.cache_max_dim = n;
        }
        self
    }

    /// Check value ranges.
    pub fn validate(&self) -> CollageResult<()> {
        if self.cache_capacity == 0 {
            return Err(CollageError::validation("cache_capacity must be >= 1"));
        }
        if self.cache_max_dim == 0 || self.mask_max_dim == 0 {
            return Err(CollageError::validation("max dims must be >= 1"));
        }
        if !(self.tear_separation.is_finite() && self.tear_separation >= 0.0) {
            return Err(CollageError::validation("tear_separation must be finite and >= 0"));
        }
        if !(self.close_fraction.is_finite() && (0.0..=1.0).contains(&self.close_fraction)) {
            return Err(CollageError::validation("close_fraction must be in [0, 1]"));
        }
        if !(self.export_scale.is_finite() && self.export_scale > 0.0) {
            return Err(CollageError::validation("export_scale must be finite and > 0"));
        }
        if !(self.mask_aspect_tolerance.is_finite() && self.mask_aspect_tolerance >= 0.0) {
            return Err(CollageError::validation("mask_aspect_tolerance must be >= 0"));
        }
        Ok(())
    }

    /// Return options with a different cache entry limit.
    pub fn with_cache_capacity(mut self, n: usize) -> Self {
        self.cache_capacity = n;
        self
    }

    /// Return options with a different cache dimension bound.
    pub fn with_cache_max_dim(mut self, px: u32) -> Self {
        self.cache_max_dim = px;
        self
    }

    /// Return options with a different synthesized mask bound.
    pub fn with_mask_max_dim(mut self, px: u32) -> Self {
        self.mask_max_dim = px;
        self
    }

    /// Return options with a different tear separation.
    pub fn with_tear_separation(mut self, d: f64) -> Self {
        self.tear_separation = d;
        self
    }

    /// Return options with a different tear cool-down.
    pub fn with_tear_cooldown(mut self, d: Duration) -> Self {
        self.tear_cooldown_ms = u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Return options with a different mask stroke cool-down.
    pub fn with_mask_cooldown(mut self, d: Duration) -> Self {
        self.mask_cooldown_ms = u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Return options with a different export scale.
    pub fn with_export_scale(mut self, s: f64) -> Self {
        self.export_scale = s;
        self
    }

    /// Tear cool-down as a duration.
    pub fn tear_cooldown(&self) -> Duration {
        Duration::from_millis(self.tear_cooldown_ms)
    }

    /// Mask stroke cool-down as a duration.
    pub fn mask_cooldown(&self) -> Duration {
        Duration::from_millis(self.mask_cooldown_ms)
    }

    /// Render settings derived from these options.
    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            scale: self.export_scale,
            mask_aspect_tolerance: self.mask_aspect_tolerance,
        }
    }
}

fn env_positive(key: &str) -> Option<usize> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .filter(|&n| n > 0)
}

#[cfg(test)]
#[path = "../../tests/unit/session/opts.rs"]
mod tests;
