use super::*;

const CANVAS: Size = Size::new(1080.0, 1920.0);
const CONTENT: Size = Size::new(400.0, 300.0);

fn close(a: Point, b: Point) -> bool {
    (a - b).hypot() < 1e-7
}

#[test]
fn identity_centers_content_on_canvas() {
    let t = Transform::IDENTITY;
    let p = t.to_canvas(Point::new(200.0, 150.0), CANVAS, CONTENT);
    assert!(close(p, Point::new(540.0, 960.0)));
    let tl = t.to_canvas(Point::ZERO, CANVAS, CONTENT);
    assert!(close(tl, Point::new(340.0, 810.0)));
}

#[test]
fn round_trip_over_rotation_and_scale_grid() {
    let samples = [
        Point::ZERO,
        Point::new(400.0, 300.0),
        Point::new(13.5, 271.25),
        Point::new(-50.0, 800.0),
    ];
    for ri in 0..16 {
        let rotation = std::f64::consts::TAU * f64::from(ri) / 16.0;
        for &scale in &[0.1, 0.5, 1.0, 2.75, 15.0] {
            let t = Transform::new(-123.0, 456.5, scale, rotation);
            for &p in &samples {
                let back = t.to_local(t.to_canvas(p, CANVAS, CONTENT), CANVAS, CONTENT);
                assert!(close(back, p), "rot={rotation} scale={scale} p={p:?} back={back:?}");
            }
        }
    }
}

#[test]
fn to_local_matches_affine_inverse() {
    let t = Transform::new(30.0, -40.0, 1.7, 0.9);
    let a = t.content_affine(CANVAS, CONTENT);
    let p = Point::new(610.0, 1002.0);
    assert!(close(t.to_local(p, CANVAS, CONTENT), a.inverse() * p));
}

#[test]
fn scale_is_clamped() {
    assert_eq!(Transform::new(0.0, 0.0, 0.0, 0.0).scale, MIN_SCALE);
    assert_eq!(Transform::new(0.0, 0.0, -3.0, 0.0).scale, MIN_SCALE);
    assert_eq!(Transform::new(0.0, 0.0, 99.0, 0.0).scale, MAX_SCALE);
    assert_eq!(clamp_scale(f64::NAN), 1.0);
}

#[test]
fn quarter_turn_rotates_about_layer_center() {
    let t = Transform::new(0.0, 0.0, 1.0, std::f64::consts::FRAC_PI_2);
    // Right-middle edge of the content swings to bottom-middle.
    let p = t.to_canvas(Point::new(400.0, 150.0), CANVAS, CONTENT);
    assert!(close(p, Point::new(540.0, 1160.0)));
}
