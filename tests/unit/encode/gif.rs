use super::*;
use image::AnimationDecoder as _;

fn decode_frames(path: &std::path::Path) -> Vec<image::Frame> {
    let file = std::io::BufReader::new(std::fs::File::open(path).unwrap());
    image::codecs::gif::GifDecoder::new(file)
        .unwrap()
        .into_frames()
        .collect_frames()
        .unwrap()
}

#[test]
fn writes_looping_gif_with_all_frames() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nested/out.gif");
    let mut sink = GifSink::new(&out, 4).unwrap();
    for v in [0u8, 120, 240] {
        sink.append(&Raster::solid(6, 4, Rgba8::rgb(v, v, v))).unwrap();
    }
    assert_eq!(sink.finalize().unwrap(), out);
    assert!(!dir.path().join("nested/out.gif.partial").exists());

    let frames = decode_frames(&out);
    assert_eq!(frames.len(), 3);
    for f in &frames {
        assert_eq!(f.buffer().dimensions(), (6, 4));
        let (numer, denom) = f.delay().numer_denom_ms();
        assert_eq!(numer / denom, 250);
    }
}

#[test]
fn translucent_pixels_flatten_over_background() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("bg.gif");
    let mut sink = GifSink::new(&out, 1)
        .unwrap()
        .with_background(Rgba8::rgb(0, 0, 255));
    sink.append(&Raster::transparent(2, 2)).unwrap();
    sink.finalize().unwrap();

    let frames = decode_frames(&out);
    let px = frames[0].buffer().get_pixel(0, 0).0;
    assert_eq!(px[3], 255);
    assert!(px[2] > 200 && px[0] < 30);
}

#[test]
fn empty_gif_is_not_written() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("empty.gif");
    let mut sink = GifSink::new(&out, 2).unwrap();
    assert!(matches!(sink.finalize(), Err(MotionError::Encoding(_))));
    drop(sink);
    assert!(!out.exists());
}

#[test]
fn zero_frame_rate_is_rejected() {
    assert!(matches!(
        GifSink::new("x.gif", 0),
        Err(MotionError::Validation(_))
    ));
}
