use super::*;

use chrono::{TimeDelta, TimeZone as _, Utc};

use crate::assets::fonts::FontSpec;
use crate::foundation::color::Rgba8;

fn viewport() -> ViewportSpec {
    ViewportSpec::new(0.0, 1.0, 0.0, 1.0, 8, 6).unwrap()
}

fn window() -> TimeWindow {
    let start = Utc.with_ymd_and_hms(2020, 4, 1, 0, 0, 0).unwrap();
    TimeWindow {
        index: 0,
        start,
        end: start + TimeDelta::minutes(30),
    }
}

#[test]
fn transparent_frame_shows_basemap() {
    let base = Raster::solid(8, 6, Rgba8::rgb(30, 60, 90));
    let out = composite(
        &base,
        &Raster::transparent(8, 6),
        &window(),
        &viewport(),
        None,
        None,
    )
    .unwrap();
    assert_eq!(out, base);
}

#[test]
fn frame_pixels_cover_basemap() {
    let base = Raster::solid(8, 6, Rgba8::rgb(30, 60, 90));
    let mut frame = Raster::transparent(8, 6);
    frame.put_pixel(3, 2, [255, 0, 0, 255]);
    let out = composite(&base, &frame, &window(), &viewport(), None, None).unwrap();
    assert_eq!(out.dimensions(), (8, 6));
    assert_eq!(out.pixel(3, 2), Some([255, 0, 0, 255]));
    assert_eq!(out.pixel(0, 0), Some([30, 60, 90, 255]));
}

#[test]
fn mismatched_basemap_is_a_render_error() {
    let base = Raster::solid(4, 4, Rgba8::BLACK);
    let err = composite(
        &base,
        &Raster::transparent(8, 6),
        &window(),
        &viewport(),
        None,
        None,
    )
    .unwrap_err();
    assert!(matches!(err, MotionError::Render(_)));
}

const DEJAVU_SANS: &str = concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/tests/fixtures/fonts/DejaVuSans.ttf"
);

fn inked(layer: &Raster, base: &Raster) -> Vec<(u32, u32)> {
    (0..layer.height)
        .flat_map(|y| (0..layer.width).map(move |x| (x, y)))
        .filter(|&(x, y)| layer.pixel(x, y) != base.pixel(x, y))
        .collect()
}

#[test]
fn watermark_is_drawn_over_annotation() {
    let viewport = ViewportSpec::new(0.0, 1.0, 0.0, 1.0, 320, 48).unwrap();
    let font = FontSpec::from_file("DejaVu Sans", 24.0, DEJAVU_SANS);
    let red = Rgba8::rgb(255, 0, 0);
    let blue = Rgba8::rgb(0, 0, 255);
    let annotation =
        FrameAnnotation::new(4, 8, font.clone(), red, true, "%Y-%m-%d %H:%M").unwrap();
    let watermark = FrameWatermark::new("HHHH", 4, 8, font, blue).unwrap();

    let base = Raster::solid(320, 48, Rgba8::WHITE);
    let points = Raster::transparent(320, 48);
    let annotated =
        composite(&base, &points, &window(), &viewport, Some(&annotation), None).unwrap();
    let marked = composite(&base, &points, &window(), &viewport, None, Some(&watermark)).unwrap();
    let out = composite(
        &base,
        &points,
        &window(),
        &viewport,
        Some(&annotation),
        Some(&watermark),
    )
    .unwrap();
    assert_ne!(out, base);

    let red_px = inked(&out, &base)
        .into_iter()
        .filter_map(|(x, y)| out.pixel(x, y))
        .filter(|p| p[0] > 200 && p[1] < 80 && p[2] < 80)
        .count();
    assert!(red_px > 0, "annotation left no red pixels");

    let solid_watermark: Vec<_> = inked(&marked, &base)
        .into_iter()
        .filter(|&(x, y)| marked.pixel(x, y) == Some([0, 0, 255, 255]))
        .collect();
    assert!(!solid_watermark.is_empty());
    for &(x, y) in &solid_watermark {
        assert_eq!(out.pixel(x, y), Some([0, 0, 255, 255]), "pixel ({x}, {y})");
    }

    let annotation_px = inked(&annotated, &base);
    let overlap = solid_watermark
        .iter()
        .filter(|p| annotation_px.contains(p))
        .count();
    assert!(overlap > 0, "annotation and watermark never overlap");
}
