use std::io::Cursor;

use super::*;

fn png_bytes(width: u32, height: u32, px: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(px));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_image_png_dimensions_and_premul() {
    let raster = decode_image(&png_bytes(1, 1, [100, 50, 200, 128])).unwrap();
    assert_eq!(raster.dimensions(), (1, 1));
    assert_eq!(
        raster.data,
        vec![
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128u8
        ]
    );
}

#[test]
fn decode_sized_resizes_to_requested_dimensions() {
    let raster = decode_image_sized(&png_bytes(8, 4, [1, 2, 3, 255]), 16, 10).unwrap();
    assert_eq!(raster.dimensions(), (16, 10));
    assert_eq!(raster.pixel(15, 9), Some([1, 2, 3, 255]));
}

#[test]
fn garbage_bytes_fail_to_decode() {
    assert!(decode_image(b"<ServiceExceptionReport/>").is_err());
}

#[test]
fn save_png_round_trips_straight_alpha() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("frame.png");
    let raster = decode_image(&png_bytes(2, 2, [255, 0, 0, 255])).unwrap();
    save_png(&raster, &path).unwrap();
    let back = decode_image(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(back, raster);
}
