use std::time::{Duration, Instant};

use super::*;
use crate::assets::decode::{decode_mask, encode_png_rgba};
use crate::assets::store::MemoryAssetStore;
use crate::edit::guard::OperationGuard;
use crate::raster::mask::non_white_count;

fn ticket() -> Ticket {
    OperationGuard::new(Duration::ZERO)
        .try_begin(Instant::now())
        .unwrap()
}

#[test]
fn buffer_maps_into_mask_pixels_and_drops_outside_points() {
    // 200x100 mask shown on a 100x100 surface: displayed at y in [25, 75].
    let mut b = StrokeBuffer::new(Size::new(100.0, 100.0), (200, 100), 4.0, BrushMode::Erase);
    assert_eq!(b.display_rect(), Rect::new(0.0, 25.0, 100.0, 75.0));
    assert!(!b.push(Point::new(50.0, 10.0)));
    assert!(b.push(Point::new(50.0, 50.0)));
    assert!(b.push(Point::new(100.0, 75.0)));
    assert!(!b.push(Point::new(f64::NAN, 50.0)));
    assert_eq!(b.mask_points(), &[Point::new(100.0, 50.0), Point::new(200.0, 100.0)]);
    assert_eq!(b.brush_in_mask_px(), 8.0);
    assert_eq!(b.preview_path().elements().len(), 2);
}

#[test]
fn starting_mask_prefers_valid_mask_then_erased_then_white() {
    let store = MemoryAssetStore::new();
    let mut img = ImageLayer::new("p.png", 4000, 2000, Size::new(400.0, 200.0));
    let white = starting_mask(&store, &img, 1024, 0.02).unwrap();
    assert_eq!(white.dimensions(), (1024, 512));
    assert_eq!(non_white_count(&white), 0);

    let mut erased = image::RgbaImage::from_pixel(4, 2, image::Rgba([1, 2, 3, 255]));
    erased.put_pixel(0, 0, image::Rgba([0, 0, 0, 0]));
    store.write("e.png", &encode_png_rgba(&erased).unwrap()).unwrap();
    img.erased = Some("e.png".into());
    let from_erased = starting_mask(&store, &img, 1024, 0.02).unwrap();
    assert_eq!(from_erased.dimensions(), (1024, 512));
    assert!(non_white_count(&from_erased) > 0);

    let m = GrayImage::from_pixel(40, 20, image::Luma([7]));
    store.write("m.png", &encode_png_gray(&m).unwrap()).unwrap();
    img.mask = Some("m.png".into());
    assert_eq!(starting_mask(&store, &img, 1024, 0.02), Some(m));

    img.pixel_width = 0;
    img.mask = None;
    assert!(starting_mask(&store, &img, 1024, 0.02).is_none());
}

#[test]
fn erase_band_across_midline() {
    let store = Arc::new(MemoryAssetStore::new());
    let mut b = StrokeBuffer::new(Size::new(200.0, 200.0), (200, 200), 20.0, BrushMode::Erase);
    b.push(Point::new(0.0, 100.0));
    b.push(Point::new(200.0, 100.0));
    let job = MaskStrokeJob::new(
        ticket(),
        LayerId(1),
        white_mask(200, 200),
        b,
        "mask_1.png".into(),
        store.clone(),
    );
    let out = job.run().output.unwrap();
    assert!(matches!(out, MaskStrokeOutput::Painted { ref name, .. } if name == "mask_1.png"));
    let mask = decode_mask(&store.read("mask_1.png").unwrap()).unwrap();
    assert!(mask.get_pixel(100, 100).0[0] <= 5);
    assert!(mask.get_pixel(100, 92).0[0] <= 5);
    assert!(mask.get_pixel(100, 80).0[0] >= 250);
    assert!(mask.get_pixel(100, 120).0[0] >= 250);
    let dark_rows = (0..200).filter(|&y| mask.get_pixel(100, y).0[0] < 128).count();
    assert!((18..=22).contains(&dark_rows), "band rows: {dark_rows}");
}

#[test]
fn reveal_restores_and_failures_leave_store_untouched() {
    let store = Arc::new(MemoryAssetStore::new());
    let mut b = StrokeBuffer::new(Size::new(10.0, 10.0), (10, 10), 4.0, BrushMode::Reveal);
    b.push(Point::new(0.0, 5.0));
    b.push(Point::new(10.0, 5.0));
    let black = GrayImage::new(10, 10);
    let job = MaskStrokeJob::new(ticket(), LayerId(1), black.clone(), b.clone(), "r.png".into(), store.clone());
    let MaskStrokeOutput::Painted { non_white, .. } = job.run().output.unwrap() else {
        panic!("expected paint");
    };
    assert!(non_white < 100);

    store.set_fail_writes(true);
    let job = MaskStrokeJob::new(ticket(), LayerId(1), black, b, "r2.png".into(), store.clone());
    assert!(matches!(job.run().output, Err(CollageError::Persist(_))));
    assert!(!store.exists("r2.png"));
}

#[test]
fn single_point_stroke_is_too_sparse() {
    let store = Arc::new(MemoryAssetStore::new());
    let mut b = StrokeBuffer::new(Size::new(10.0, 10.0), (10, 10), 4.0, BrushMode::Erase);
    b.push(Point::new(5.0, 5.0));
    let job = MaskStrokeJob::new(ticket(), LayerId(1), white_mask(10, 10), b, "x.png".into(), store.clone());
    assert_eq!(job.run().output.unwrap(), MaskStrokeOutput::TooSparse);
    assert!(!store.exists("x.png"));
}
