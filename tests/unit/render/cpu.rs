use super::*;
use crate::foundation::core::Rect;
use kurbo::Shape;

#[test]
fn dims_reject_zero_and_oversize() {
    assert!(dims_u16(0, 4).is_err());
    assert!(dims_u16(4, 70_000).is_err());
    assert_eq!(dims_u16(3, 2).unwrap(), (3, 2));
}

#[test]
fn rect_fill_covers_exact_pixels() {
    let path = Rect::new(2.0, 1.0, 6.0, 3.0).to_path(0.1);
    let cov = fill_coverage(&path, 8, 4).unwrap();
    assert!(cov.get_pixel(3, 2).0[0] >= 250);
    assert!(cov.get_pixel(0, 0).0[0] <= 5);
    assert!(cov.get_pixel(7, 3).0[0] <= 5);
    let full = cov.as_raw().iter().filter(|&&v| v >= 128).count();
    assert_eq!(full, 8);
}

#[test]
fn premul_pixmap_rejects_wrong_len() {
    assert!(pixmap_from_premul_bytes(&[0; 12], 2, 2).is_err());
    assert!(pixmap_from_premul_bytes(&[0; 16], 2, 2).is_ok());
}
