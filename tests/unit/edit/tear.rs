use std::time::{Duration, Instant};

use super::*;
use crate::assets::decode::{decode_bitmap, encode_png_gray};
use crate::assets::store::MemoryAssetStore;
use crate::edit::guard::OperationGuard;
use crate::geometry::transform::Transform;
use crate::raster::mask::white_mask;

const PARAMS: TearParams = TearParams {
    close_fraction: 0.05,
    mask_aspect_tolerance: 0.02,
    cache_max_dim: 1000,
};

fn ticket() -> Ticket {
    OperationGuard::new(Duration::ZERO)
        .try_begin(Instant::now())
        .unwrap()
}

fn setup(store: &MemoryAssetStore) -> Layer {
    let img = RgbaImage::from_fn(40, 20, |x, y| image::Rgba([x as u8 * 6, y as u8 * 12, 7, 255]));
    store.write("photo.png", &encode_png_rgba(&img).unwrap()).unwrap();
    Layer::new(
        LayerId(1),
        Transform::IDENTITY,
        3,
        LayerContent::Image(ImageLayer::new("photo.png", 40, 20, Size::new(40.0, 20.0))),
    )
}

fn names() -> [String; 2] {
    ["a.png".to_owned(), "b.png".to_owned()]
}

#[test]
fn horizontal_tear_conserves_every_pixel() {
    let store = Arc::new(MemoryAssetStore::new());
    let layer = setup(&store);
    let canvas = Size::new(100.0, 100.0);
    // Local y = 10 across the full width.
    let path = [Point::new(30.0, 50.0), Point::new(70.0, 50.0)];
    let job = TearJob::capture(ticket(), &layer, canvas, &path, names(), store.clone(), PARAMS)
        .unwrap();
    let TearOutput::Split(pieces) = job.run().output.unwrap() else {
        panic!("expected a split");
    };
    assert_eq!(pieces.pixel_size, (40, 20));

    let original = decode_bitmap(&store.read("photo.png").unwrap()).unwrap();
    let a = decode_bitmap(&store.read("a.png").unwrap()).unwrap();
    let b = decode_bitmap(&store.read("b.png").unwrap()).unwrap();
    for ((o, pa), pb) in original.pixels().zip(a.pixels()).zip(b.pixels()) {
        let kept: Vec<_> = [pa, pb].into_iter().filter(|p| p.0[3] != 0).collect();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0], o);
    }
    assert_eq!(a.get_pixel(5, 15).0[3], 255);
    assert_eq!(a.get_pixel(5, 4).0[3], 0);
}

#[test]
fn sparse_path_is_a_noop() {
    let store = Arc::new(MemoryAssetStore::new());
    let layer = setup(&store);
    let path = [Point::new(30.0, 50.0)];
    let job = TearJob::capture(
        ticket(),
        &layer,
        Size::new(100.0, 100.0),
        &path,
        names(),
        store.clone(),
        PARAMS,
    )
    .unwrap();
    assert!(matches!(job.run().output, Ok(TearOutput::TooSparse)));
    assert!(!store.exists("a.png"));
}

#[test]
fn write_failure_is_a_persist_error() {
    let store = Arc::new(MemoryAssetStore::new());
    let layer = setup(&store);
    store.set_fail_writes(true);
    let path = [Point::new(30.0, 50.0), Point::new(70.0, 50.0)];
    let job = TearJob::capture(
        ticket(),
        &layer,
        Size::new(100.0, 100.0),
        &path,
        names(),
        store,
        PARAMS,
    )
    .unwrap();
    assert!(matches!(job.run().output, Err(CollageError::Persist(_))));
}

#[test]
fn existing_mask_is_baked_into_pieces() {
    let store = Arc::new(MemoryAssetStore::new());
    let mut layer = setup(&store);
    let mut mask = white_mask(40, 20);
    mask.put_pixel(5, 15, image::Luma([0]));
    store.write("m.png", &encode_png_gray(&mask).unwrap()).unwrap();
    layer.as_image_mut().unwrap().mask = Some("m.png".into());

    let path = [Point::new(30.0, 50.0), Point::new(70.0, 50.0)];
    let job = TearJob::capture(
        ticket(),
        &layer,
        Size::new(100.0, 100.0),
        &path,
        names(),
        store.clone(),
        PARAMS,
    )
    .unwrap();
    assert!(matches!(job.run().output, Ok(TearOutput::Split(_))));
    let a = decode_bitmap(&store.read("a.png").unwrap()).unwrap();
    assert_eq!(a.get_pixel(5, 15).0[3], 0);
    assert_eq!(a.get_pixel(6, 15).0[3], 255);
}

#[test]
fn local_points_map_through_the_fitted_bitmap_rect() {
    let image = ImageLayer::new("p.png", 400, 300, Size::new(200.0, 150.0));
    let px = local_to_pixels(&image, &[Point::new(0.0, 0.0), Point::new(100.0, 75.0)], 400, 300);
    assert_eq!(px, vec![Point::new(0.0, 0.0), Point::new(200.0, 150.0)]);
}

#[test]
fn children_take_z_and_offsets() {
    let store = MemoryAssetStore::new();
    let mut original = setup(&store);
    original.opacity = 0.5;
    original.transform = Transform::new(10.0, -4.0, 2.0, 0.3);
    let pieces = TearPieces {
        names: names(),
        pixel_size: (40, 20),
        prepared: [
            PreparedBitmap::from_image(RgbaImage::new(40, 20), 1000),
            PreparedBitmap::from_image(RgbaImage::new(40, 20), 1000),
        ],
    };
    let [a, b] = child_layers(&original, &pieces, [LayerId(7), LayerId(8)], 20.0).unwrap();
    assert_eq!((a.id, a.z_index), (LayerId(7), 3));
    assert_eq!((b.id, b.z_index), (LayerId(8), 4));
    assert_eq!((a.transform.x, a.transform.y), (0.0, -24.0));
    assert_eq!((b.transform.x, b.transform.y), (20.0, 16.0));
    assert_eq!(a.transform.scale, 2.0);
    assert_eq!(b.transform.rotation, 0.3);
    assert_eq!(a.opacity, 0.5);
    assert_eq!(a.as_image().unwrap().source, "a.png");
    assert_eq!(b.as_image().unwrap().size, Size::new(40.0, 20.0));
}
