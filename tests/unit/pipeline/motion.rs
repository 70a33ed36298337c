use super::*;

use chrono::{TimeDelta, TimeZone as _, Utc};

use crate::assets::basemap::SolidBasemap;
use crate::data::dataset::PointDataset;
use crate::data::point::Point;
use crate::encode::sink::InMemorySink;

fn viewport() -> ViewportSpec {
    ViewportSpec::new(0.0, 10.0, 0.0, 10.0, 10, 10).unwrap()
}

fn playback(windows: i64) -> PlaybackSpec {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    PlaybackSpec::new(
        start,
        start + TimeDelta::minutes(windows),
        TimeDelta::minutes(1),
        TimeDelta::minutes(1),
        10,
    )
    .unwrap()
}

fn video(points: Vec<Point>) -> MotionVideo {
    MotionVideo::new(
        Arc::new(PointDataset::new(points)),
        Box::new(SolidBasemap::new(Rgba8::rgb(20, 30, 40))),
    )
}

struct FailingSource;

impl WindowedDataSource for FailingSource {
    fn subset(&self, _window: &TimeWindow) -> MotionResult<Vec<Point>> {
        Err(MotionError::Other(anyhow::anyhow!("backend unavailable")))
    }
}

struct FailingBasemap;

impl BasemapProvider for FailingBasemap {
    fn fetch(&self, _viewport: &ViewportSpec) -> MotionResult<Raster> {
        Err(MotionError::tile_fetch("503"))
    }
}

/// Accepts frames until `fail_at`, then reports an encoder error.
struct BrokenSink {
    appended: usize,
    fail_at: usize,
}

impl FrameSink for BrokenSink {
    fn append(&mut self, _frame: &Raster) -> MotionResult<()> {
        if self.appended == self.fail_at {
            return Err(MotionError::encoding("pipe closed"));
        }
        self.appended += 1;
        Ok(())
    }

    fn finalize(&mut self) -> MotionResult<PathBuf> {
        Ok(PathBuf::from("unused"))
    }
}

struct UndersizedBasemap;

impl BasemapProvider for UndersizedBasemap {
    fn fetch(&self, _viewport: &ViewportSpec) -> MotionResult<Raster> {
        Ok(Raster::solid(2, 2, Rgba8::BLACK))
    }
}

#[test]
fn successful_render_walks_every_state() {
    let mut mv = video(Vec::new());
    assert_eq!(mv.state(), RenderState::Idle);
    let mut sink = InMemorySink::new();
    let report = mv
        .render(&viewport(), &playback(3), &mut sink, &RenderOptions::default())
        .unwrap();

    assert_eq!(report.frames, 3);
    assert_eq!(
        report.states,
        vec![
            RenderState::Idle,
            RenderState::FetchingBasemap,
            RenderState::Rendering,
            RenderState::Finalizing,
            RenderState::Done,
        ]
    );
    assert_eq!(mv.state(), RenderState::Done);
    assert!(sink.is_finalized());
}

#[test]
fn data_source_failure_names_the_window() {
    let mut mv = MotionVideo::new(
        Arc::new(FailingSource),
        Box::new(SolidBasemap::new(Rgba8::BLACK)),
    );
    let mut sink = InMemorySink::new();
    let err = mv
        .render(&viewport(), &playback(2), &mut sink, &RenderOptions::default())
        .unwrap_err();
    match err {
        MotionError::DataSource { window, message } => {
            assert_eq!(window.index, 0);
            assert!(message.contains("backend unavailable"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(mv.state(), RenderState::Failed);
    assert!(!sink.is_finalized());
}

#[test]
fn basemap_failure_produces_no_frames() {
    let mut mv = MotionVideo::new(Arc::new(PointDataset::default()), Box::new(FailingBasemap));
    let mut sink = InMemorySink::new();
    let err = mv
        .render(&viewport(), &playback(2), &mut sink, &RenderOptions::default())
        .unwrap_err();
    assert!(matches!(err, MotionError::TileFetch(_)));
    assert!(sink.frames().is_empty());
    assert_eq!(mv.state(), RenderState::Failed);
}

#[test]
fn cancelled_token_stops_before_first_window() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let options = RenderOptions {
        cancel: Some(cancel.clone()),
        ..RenderOptions::default()
    };
    let mut mv = video(Vec::new());
    let mut sink = InMemorySink::new();
    let err = mv
        .render(&viewport(), &playback(2), &mut sink, &options)
        .unwrap_err();
    assert!(matches!(err, MotionError::Cancelled { window } if window.index == 0));
    assert!(sink.frames().is_empty());
    assert!(cancel.is_cancelled());
}

#[test]
fn zero_threads_is_rejected_before_fetch() {
    let options = RenderOptions {
        threading: RenderThreading {
            parallel: true,
            chunk_size: 2,
            threads: Some(0),
        },
        ..RenderOptions::default()
    };
    let mut mv = video(Vec::new());
    let mut sink = InMemorySink::new();
    let err = mv
        .render(&viewport(), &playback(2), &mut sink, &options)
        .unwrap_err();
    assert!(matches!(err, MotionError::Validation(_)));
    assert_eq!(
        mv.state(),
        RenderState::Failed,
        "validation failures are render failures"
    );
}

#[test]
fn chunked_render_matches_sequential_order() {
    let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let points: Vec<Point> = (0..5)
        .map(|i| Point::new(t0 + TimeDelta::minutes(i) + TimeDelta::seconds(5), i as f64 * 2.0 + 0.5, 5.0))
        .collect();

    let mut sequential = InMemorySink::new();
    video(points.clone())
        .render(&viewport(), &playback(5), &mut sequential, &RenderOptions::default())
        .unwrap();

    let options = RenderOptions {
        threading: RenderThreading {
            parallel: true,
            chunk_size: 2,
            threads: Some(3),
        },
        ..RenderOptions::default()
    };
    let mut chunked = InMemorySink::new();
    video(points)
        .render(&viewport(), &playback(5), &mut chunked, &options)
        .unwrap();

    assert_eq!(sequential.frames(), chunked.frames());
    assert_ne!(sequential.frames()[0], sequential.frames()[1]);
}

#[test]
fn render_frame_picks_one_window() {
    let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 1, 30).unwrap();
    let mv = video(vec![Point::new(t0, 5.5, 5.5)]);
    let options = RenderOptions::default();

    let empty = mv.render_frame(&viewport(), &playback(3), 0, &options).unwrap();
    let hit = mv.render_frame(&viewport(), &playback(3), 1, &options).unwrap();
    assert_eq!(empty.pixel(5, 4), Some([20, 30, 40, 255]));
    assert_ne!(hit.pixel(5, 4), Some([20, 30, 40, 255]));

    let err = mv.render_frame(&viewport(), &playback(3), 3, &options).unwrap_err();
    assert!(matches!(err, MotionError::Validation(_)));
    assert_eq!(mv.state(), RenderState::Idle);
}

#[test]
fn output_path_appends_extension() {
    assert_eq!(
        output_path(Path::new("out/nyc.v1"), "gif"),
        PathBuf::from("out/nyc.v1.gif")
    );
}

#[test]
fn sink_failure_names_the_window() {
    for parallel in [false, true] {
        let options = RenderOptions {
            threading: RenderThreading {
                parallel,
                chunk_size: 2,
                threads: Some(2),
            },
            ..RenderOptions::default()
        };
        let mut sink = BrokenSink {
            appended: 0,
            fail_at: 2,
        };
        let mut mv = video(Vec::new());
        let err = mv
            .render(&viewport(), &playback(4), &mut sink, &options)
            .unwrap_err();
        let MotionError::Encoding(msg) = &err else {
            panic!("unexpected error: {err}");
        };
        assert!(msg.starts_with("window #2 ["), "{msg}");
        assert!(msg.ends_with("pipe closed"), "{msg}");
        assert_eq!(sink.appended, 2);
        assert_eq!(mv.state(), RenderState::Failed);
    }
}

#[test]
fn composite_failure_names_the_window() {
    let mv = MotionVideo::new(Arc::new(PointDataset::default()), Box::new(UndersizedBasemap));
    let err = mv
        .render_frame(&viewport(), &playback(3), 1, &RenderOptions::default())
        .unwrap_err();
    let MotionError::Render(msg) = &err else {
        panic!("unexpected error: {err}");
    };
    assert!(msg.starts_with("window #1 ["), "{msg}");
    assert!(msg.contains("basemap is 2x2"), "{msg}");
}

#[test]
fn oversized_point_radius_is_rejected_before_fetch() {
    let options = RenderOptions {
        point_radius_px: u32::MAX,
        ..RenderOptions::default()
    };
    let mut mv = MotionVideo::new(Arc::new(PointDataset::default()), Box::new(FailingBasemap));
    let mut sink = InMemorySink::new();
    let err = mv
        .render(&viewport(), &playback(2), &mut sink, &options)
        .unwrap_err();
    assert!(matches!(err, MotionError::Validation(_)), "{err}");
    assert_eq!(mv.state(), RenderState::Failed);
    assert!(sink.frames().is_empty());
}
