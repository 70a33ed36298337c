use super::*;

#[test]
fn transparent_has_exact_size_and_zero_alpha() {
    let r = Raster::transparent(7, 3);
    assert_eq!(r.dimensions(), (7, 3));
    assert_eq!(r.data.len(), 7 * 3 * 4);
    assert!(r.is_fully_transparent());
}

#[test]
fn solid_stores_premultiplied_pixels() {
    let r = Raster::solid(2, 2, Rgba8::rgba(255, 0, 0, 128));
    assert_eq!(r.pixel(1, 1), Some([128, 0, 0, 128]));
    assert_eq!(r.pixel(2, 0), None);
}

#[test]
fn put_pixel_ignores_out_of_bounds() {
    let mut r = Raster::transparent(2, 2);
    r.put_pixel(1, 0, [1, 2, 3, 4]);
    r.put_pixel(5, 5, [9, 9, 9, 9]);
    assert_eq!(r.pixel(1, 0), Some([1, 2, 3, 4]));
    assert_eq!(r.data.iter().filter(|&&b| b == 9).count(), 0);
}

#[test]
fn from_premul_checks_length() {
    assert!(Raster::from_premul(2, 2, vec![0; 16]).is_ok());
    assert!(matches!(
        Raster::from_premul(2, 2, vec![0; 15]),
        Err(MotionError::Render(_))
    ));
}
