use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use image::RgbaImage;
use image::imageops::FilterType;

use crate::assets::decode::decode_bitmap;
use crate::assets::store::AssetStore;
use crate::foundation::error::CollageResult;

/// Default number of bitmaps kept decoded.
pub const DEFAULT_CACHE_CAPACITY: usize = 10;
/// Default long-side bound for cached bitmaps, in pixels.
pub const DEFAULT_CACHE_MAX_DIM: u32 = 1000;

/// Tight pixel bounding box, `[x0, x1) x [y0, y1)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PixelBounds {
    /// Inclusive left edge.
    pub x0: u32,
    /// Inclusive top edge.
    pub y0: u32,
    /// Exclusive right edge.
    pub x1: u32,
    /// Exclusive bottom edge.
    pub y1: u32,
}

impl PixelBounds {
    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.y1 - self.y0
    }
}

/// Side-channel facts about a cached bitmap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitmapMeta {
    /// Any pixel with alpha below 255.
    pub has_transparency: bool,
    /// Bounding box of pixels with non-zero alpha; `None` when fully transparent.
    pub opaque_bounds: Option<PixelBounds>,
}

impl BitmapMeta {
    /// Scan `img` for transparency and opaque bounds.
    pub fn scan(img: &RgbaImage) -> Self {
        let mut has_transparency = false;
        let mut bounds: Option<PixelBounds> = None;
        for (x, y, px) in img.enumerate_pixels() {
            let a = px.0[3];
            if a < 255 {
                has_transparency = true;
            }
            if a == 0 {
                continue;
            }
            bounds = Some(match bounds {
                None => PixelBounds {
                    x0: x,
                    y0: y,
                    x1: x + 1,
                    y1: y + 1,
                },
                Some(b) => PixelBounds {
                    x0: b.x0.min(x),
                    y0: b.y0.min(y),
                    x1: b.x1.max(x + 1),
                    y1: b.y1.max(y + 1),
                },
            });
        }
        Self {
            has_transparency,
            opaque_bounds: bounds,
        }
    }
}

/// Decoded, downsampled bitmap ready for display, plus its metadata.
#[derive(Clone, Debug)]
pub struct PreparedBitmap {
    /// Display bitmap, straight-alpha RGBA8.
    pub image: Arc<RgbaImage>,
    /// Metadata computed on [`PreparedBitmap::image`].
    pub meta: BitmapMeta,
    /// Size of the source before downsampling.
    pub source_size: (u32, u32),
}

impl PreparedBitmap {
    /// Decode and downsample. Pure, safe to call from worker threads.
    pub fn from_bytes(bytes: &[u8], max_dim: u32) -> CollageResult<Self> {
        Ok(Self::from_image(decode_bitmap(bytes)?, max_dim))
    }

    /// Downsample an already decoded bitmap so its long side is at most `max_dim`.
    pub fn from_image(img: RgbaImage, max_dim: u32) -> Self {
        let source_size = img.dimensions();
        let img = downsample_to(img, max_dim);
        let meta = BitmapMeta::scan(&img);
        Self {
            image: Arc::new(img),
            meta,
            source_size,
        }
    }

    /// Display width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Display height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

pub(crate) fn downsample_to(img: RgbaImage, max_dim: u32) -> RgbaImage {
    let (w, h) = img.dimensions();
    let long = w.max(h);
    if max_dim == 0 || long <= max_dim {
        return img;
    }
    let s = f64::from(max_dim) / f64::from(long);
    let nw = ((f64::from(w) * s).round() as u32).max(1);
    let nh = ((f64::from(h) * s).round() as u32).max(1);
    image::imageops::resize(&img, nw, nh, FilterType::Triangle)
}

/// Bounded LRU cache of decoded layer bitmaps keyed by stable file name.
///
/// Only the interaction thread touches the cache. Workers build [`PreparedBitmap`]s and hand
/// them back for [`BitmapCache::insert`].
#[derive(Debug)]
pub struct BitmapCache {
    capacity: usize,
    max_dim: u32,
    entries: HashMap<String, PreparedBitmap>,
    lru: VecDeque<String>,
    decode_counts: HashMap<String, u64>,
}

impl Default for BitmapCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_MAX_DIM)
    }
}

impl BitmapCache {
    /// Create a cache holding at most `capacity` bitmaps (at least one).
    pub fn new(capacity: usize, max_dim: u32) -> Self {
        Self {
            capacity: capacity.max(1),
            max_dim,
            entries: HashMap::new(),
            lru: VecDeque::new(),
            decode_counts: HashMap::new(),
        }
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Long-side bound applied on decode.
    pub fn max_dim(&self) -> u32 {
        self.max_dim
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return `true` if `name` is cached (does not touch recency).
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Cached names from least to most recently used.
    pub fn lru_order(&self) -> Vec<&str> {
        self.lru.iter().map(String::as_str).collect()
    }

    /// How many times `name` was decoded through [`BitmapCache::get_or_load`].
    pub fn decode_count(&self, name: &str) -> u64 {
        self.decode_counts.get(name).copied().unwrap_or(0)
    }

    /// Cached bitmap for `name`, marking it most recently used.
    pub fn get(&mut self, name: &str) -> Option<PreparedBitmap> {
        let hit = self.entries.get(name).cloned();
        if hit.is_some() {
            self.touch(name);
        }
        hit
    }

    /// Cached bitmap without touching recency.
    pub fn peek(&self, name: &str) -> Option<&PreparedBitmap> {
        self.entries.get(name)
    }

    /// Metadata for `name` if cached.
    pub fn meta(&self, name: &str) -> Option<BitmapMeta> {
        self.entries.get(name).map(|e| e.meta)
    }

    /// Cached bitmap or decode it from `store`, evicting the least recently used entry.
    pub fn get_or_load(
        &mut self,
        store: &dyn AssetStore,
        name: &str,
    ) -> CollageResult<PreparedBitmap> {
        if let Some(hit) = self.get(name) {
            return Ok(hit);
        }
        let bytes = store.read(name)?;
        let prepared = PreparedBitmap::from_bytes(&bytes, self.max_dim)?;
        *self.decode_counts.entry(name.to_owned()).or_insert(0) += 1;
        self.insert(name, prepared.clone());
        Ok(prepared)
    }

    /// Decode and downsample without touching any cache. Safe to call from worker threads.
    pub fn prepare(bytes: &[u8], max_dim: u32) -> CollageResult<PreparedBitmap> {
        PreparedBitmap::from_bytes(bytes, max_dim)
    }

    /// Store a bitmap prepared elsewhere (for example by an import worker).
    pub fn insert(&mut self, name: &str, prepared: PreparedBitmap) {
        self.entries.insert(name.to_owned(), prepared);
        self.touch(name);
        while self.lru.len() > self.capacity {
            if let Some(old) = self.lru.pop_front() {
                tracing::debug!(name = %old, "bitmap cache evict");
                self.entries.remove(&old);
            }
        }
    }

    /// Drop `name` and its metadata so the next read decodes fresh content.
    pub fn invalidate(&mut self, name: &str) -> bool {
        if let Some(pos) = self.lru.iter().position(|x| x == name) {
            self.lru.remove(pos);
        }
        self.entries.remove(name).is_some()
    }

    /// Drop everything, including decode counts.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.decode_counts.clear();
    }

    fn touch(&mut self, name: &str) {
        if let Some(pos) = self.lru.iter().position(|x| x == name) {
            self.lru.remove(pos);
        }
        self.lru.push_back(name.to_owned());
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/cache.rs"]
mod tests;
