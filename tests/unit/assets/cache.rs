use super::*;
use crate::assets::decode::encode_png_rgba;
use crate::assets::store::MemoryAssetStore;

fn solid(w: u32, h: u32, px: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(w, h, image::Rgba(px))
}

fn store_with(names: &[&str]) -> MemoryAssetStore {
    let store = MemoryAssetStore::new();
    for n in names {
        store
            .write(n, &encode_png_rgba(&solid(4, 2, [9, 9, 9, 255])).unwrap())
            .unwrap();
    }
    store
}

#[test]
fn load_same_name_only_decodes_once() {
    let store = store_with(&["a.png"]);
    let mut cache = BitmapCache::new(4, 1000);
    cache.get_or_load(&store, "a.png").unwrap();
    cache.get_or_load(&store, "a.png").unwrap();
    assert_eq!(cache.decode_count("a.png"), 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn never_exceeds_capacity_and_evicts_least_recent() {
    let names: Vec<String> = (0..15).map(|i| format!("img{i}.png")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let store = store_with(&refs);
    let mut cache = BitmapCache::new(DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_MAX_DIM);

    for n in &refs[..10] {
        cache.get_or_load(&store, n).unwrap();
    }
    // Refresh img0 so img1 becomes the oldest.
    cache.get_or_load(&store, "img0.png").unwrap();
    cache.get_or_load(&store, "img10.png").unwrap();
    assert_eq!(cache.len(), DEFAULT_CACHE_CAPACITY);
    assert!(cache.contains("img0.png"));
    assert!(!cache.contains("img1.png"));

    for n in &refs[11..] {
        cache.get_or_load(&store, n).unwrap();
        assert!(cache.len() <= DEFAULT_CACHE_CAPACITY);
    }
    assert_eq!(cache.lru_order().last().copied(), Some("img14.png"));
}

#[test]
fn invalidate_forces_fresh_decode() {
    let store = store_with(&["a.png"]);
    let mut cache = BitmapCache::new(2, 1000);
    let first = cache.get_or_load(&store, "a.png").unwrap();
    assert!(!first.meta.has_transparency);

    store
        .write("a.png", &encode_png_rgba(&solid(4, 2, [0, 0, 0, 0])).unwrap())
        .unwrap();
    assert!(cache.invalidate("a.png"));
    assert!(cache.meta("a.png").is_none());

    let second = cache.get_or_load(&store, "a.png").unwrap();
    assert!(second.meta.has_transparency);
    assert_eq!(second.meta.opaque_bounds, None);
    assert_eq!(cache.decode_count("a.png"), 2);
}

#[test]
fn decode_downsamples_long_side() {
    let p = PreparedBitmap::from_image(solid(3000, 1500, [1, 2, 3, 255]), 1000);
    assert_eq!((p.width(), p.height()), (1000, 500));
    assert_eq!(p.source_size, (3000, 1500));

    let small = PreparedBitmap::from_image(solid(10, 20, [1, 2, 3, 255]), 1000);
    assert_eq!((small.width(), small.height()), (10, 20));
}

#[test]
fn opaque_bounds_are_tight() {
    let mut img = solid(10, 8, [0, 0, 0, 0]);
    img.put_pixel(2, 3, image::Rgba([255, 0, 0, 255]));
    img.put_pixel(6, 5, image::Rgba([255, 0, 0, 10]));
    let meta = BitmapMeta::scan(&img);
    assert!(meta.has_transparency);
    assert_eq!(
        meta.opaque_bounds,
        Some(PixelBounds {
            x0: 2,
            y0: 3,
            x1: 7,
            y1: 6
        })
    );
}

#[test]
fn missing_asset_is_an_asset_error() {
    let store = MemoryAssetStore::new();
    let mut cache = BitmapCache::default();
    let err = cache.get_or_load(&store, "nope.png").unwrap_err();
    assert!(err.is_missing_or_corrupt());
    assert!(cache.is_empty());
}

#[test]
fn clear_resets_entries_and_counts() {
    let store = store_with(&["a.png", "b.png"]);
    let mut cache = BitmapCache::new(4, 1000);
    cache.get_or_load(&store, "a.png").unwrap();
    cache.get_or_load(&store, "b.png").unwrap();
    cache.clear();
    assert!(cache.is_empty());
    assert!(cache.lru_order().is_empty());
    assert_eq!(cache.decode_count("a.png"), 0);
    cache.get_or_load(&store, "a.png").unwrap();
    assert_eq!(cache.decode_count("a.png"), 1);
}
