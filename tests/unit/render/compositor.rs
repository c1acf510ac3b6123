use super::*;
use crate::assets::decode::{encode_png_gray, encode_png_rgba};
use crate::assets::store::MemoryAssetStore;
use crate::geometry::transform::Transform;
use crate::model::drawing::DrawStroke;
use crate::raster::mask::white_mask;
use crate::render::frame::fingerprint;

fn red_store() -> MemoryAssetStore {
    let store = MemoryAssetStore::new();
    let img = image::RgbaImage::from_pixel(20, 10, image::Rgba([255, 0, 0, 255]));
    store.write("red.png", &encode_png_rgba(&img).unwrap()).unwrap();
    store
}

fn canvas_with_red() -> (Canvas, LayerId) {
    let mut c = Canvas::new(100.0, 100.0).unwrap();
    let id = c.add_image(
        ImageLayer::new("red.png", 20, 10, Size::new(20.0, 10.0)),
        Transform::IDENTITY,
    );
    (c, id)
}

fn render(c: &Canvas, store: &MemoryAssetStore) -> FrameRGBA {
    let mut cache = BitmapCache::default();
    render_canvas(c, &mut cache, store, RenderSettings::default()).unwrap()
}

fn near(px: [u8; 4], want: [u8; 4]) -> bool {
    px.iter().zip(want).all(|(&a, b)| a.abs_diff(b) <= 3)
}

#[test]
fn output_size_is_stable() {
    assert_eq!(output_size(Size::new(1080.0, 1920.0), 1.0), (1080, 1920));
    assert_eq!(output_size(Size::new(100.0, 50.0), 2.0), (200, 100));
    assert_eq!(output_size(Size::new(100.0, 50.0), f64::NAN), (100, 50));
}

#[test]
fn image_is_centered_over_background() {
    let store = red_store();
    let (c, _) = canvas_with_red();
    let f = render(&c, &store);
    assert_eq!((f.width, f.height), (100, 100));
    assert!(near(f.pixel(50, 50).unwrap(), [255, 0, 0, 255]));
    assert!(near(f.pixel(41, 46).unwrap(), [255, 0, 0, 255]));
    assert!(near(f.pixel(10, 10).unwrap(), [255, 255, 255, 255]));
    assert!(near(f.pixel(50, 60).unwrap(), [255, 255, 255, 255]));
}

#[test]
fn mask_clips_at_draw_time() {
    let store = red_store();
    let (mut c, id) = canvas_with_red();
    let mut mask = white_mask(20, 10);
    for y in 0..10 {
        for x in 0..10 {
            mask.put_pixel(x, y, image::Luma([0]));
        }
    }
    store.write("m.png", &encode_png_gray(&mask).unwrap()).unwrap();
    c.layer_mut(id).unwrap().as_image_mut().unwrap().mask = Some("m.png".into());
    let f = render(&c, &store);
    assert!(near(f.pixel(43, 50).unwrap(), [255, 255, 255, 255]));
    assert!(near(f.pixel(57, 50).unwrap(), [255, 0, 0, 255]));
}

#[test]
fn bad_mask_renders_as_full_reveal() {
    let store = red_store();
    let (mut c, id) = canvas_with_red();
    store.write("bad.png", b"junk").unwrap();
    let square = encode_png_gray(&white_mask(5, 5)).unwrap();
    store.write("square.png", &square).unwrap();
    for name in ["bad.png", "square.png", "missing.png"] {
        c.layer_mut(id).unwrap().as_image_mut().unwrap().mask = Some(name.into());
        let f = render(&c, &store);
        assert!(near(f.pixel(43, 50).unwrap(), [255, 0, 0, 255]), "{name}");
    }
}

#[test]
fn opacity_blends_with_background() {
    let store = red_store();
    let (mut c, id) = canvas_with_red();
    c.layer_mut(id).unwrap().set_opacity(0.5);
    let px = render(&c, &store).pixel(50, 50).unwrap();
    assert_eq!(px[0], 255);
    assert!((i32::from(px[1]) - 128).abs() <= 3, "{px:?}");
}

#[test]
fn missing_bitmap_is_skipped_not_fatal() {
    let store = red_store();
    let (mut c, _) = canvas_with_red();
    let ghost = c.add_image(
        ImageLayer::new("ghost.png", 20, 10, Size::new(20.0, 10.0)),
        Transform::new(30.0, 0.0, 1.0, 0.0),
    );
    let mut cache = BitmapCache::default();
    let scene = Scene::prepare(&c, &mut cache, &store, RenderSettings::default()).unwrap();
    assert_eq!(scene.skipped(), &[ghost]);
    assert_eq!(scene.drawn_layers().len(), 1);
    assert!(near(scene.render().unwrap().pixel(50, 50).unwrap(), [255, 0, 0, 255]));
}

#[test]
fn text_without_font_is_skipped() {
    let store = red_store();
    let (mut c, _) = canvas_with_red();
    let t = c.add_text(
        TextLayer {
            text: "hello".into(),
            font: "nofont.ttf".into(),
            size: 24.0,
            color: Rgba8::BLACK,
        },
        Transform::IDENTITY,
    );
    let mut cache = BitmapCache::default();
    let scene = Scene::prepare(&c, &mut cache, &store, RenderSettings::default()).unwrap();
    assert_eq!(scene.skipped(), &[t]);
}

#[test]
fn higher_z_paints_on_top() {
    let store = red_store();
    let blue = image::RgbaImage::from_pixel(20, 10, image::Rgba([0, 0, 255, 255]));
    store.write("blue.png", &encode_png_rgba(&blue).unwrap()).unwrap();
    let (mut c, red) = canvas_with_red();
    c.add_image(
        ImageLayer::new("blue.png", 20, 10, Size::new(20.0, 10.0)),
        Transform::new(5.0, 0.0, 1.0, 0.0),
    );
    assert!(near(render(&c, &store).pixel(50, 50).unwrap(), [0, 0, 255, 255]));
    c.layer_mut(red).unwrap().z_index = 10;
    assert!(near(render(&c, &store).pixel(50, 50).unwrap(), [255, 0, 0, 255]));
}

#[test]
fn drawing_overlay_goes_on_top() {
    let store = red_store();
    let (mut c, _) = canvas_with_red();
    c.drawing = Some(Drawing {
        strokes: vec![DrawStroke {
            points: vec![(0.0, 50.5).into(), (100.0, 50.5).into()],
            color: Rgba8::rgb(0, 255, 0),
            width: 4.0,
        }],
    });
    let f = render(&c, &store);
    assert!(near(f.pixel(50, 50).unwrap(), [0, 255, 0, 255]));
    assert!(near(f.pixel(10, 50).unwrap(), [0, 255, 0, 255]));
    assert!(near(f.pixel(10, 40).unwrap(), [255, 255, 255, 255]));
}

#[test]
fn rendering_twice_is_bit_identical_and_scales() {
    let store = red_store();
    let (mut c, id) = canvas_with_red();
    c.layer_mut(id).unwrap().transform = Transform::new(7.0, -3.0, 1.7, 0.4);
    let a = render(&c, &store);
    let b = render(&c, &store);
    assert_eq!(fingerprint(&a), fingerprint(&b));
    assert_eq!(a, b);

    let mut cache = BitmapCache::default();
    let settings = RenderSettings {
        scale: 2.0,
        ..RenderSettings::default()
    };
    let big = render_canvas(&c, &mut cache, &store, settings).unwrap();
    assert_eq!((big.width, big.height), (200, 200));
}
