use super::*;

use chrono::{TimeZone as _, Utc};

#[test]
fn display_prefixes_are_stable() {
    assert!(
        MotionError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        MotionError::tile_fetch("x")
            .to_string()
            .contains("tile fetch error:")
    );
    assert!(MotionError::render("x").to_string().contains("render error:"));
    assert!(
        MotionError::encoding("x")
            .to_string()
            .contains("encoding error:")
    );
    assert!(MotionError::config("x").to_string().contains("config error:"));
}

#[test]
fn data_source_error_names_the_window() {
    let start = Utc.with_ymd_and_hms(2020, 4, 1, 0, 0, 0).unwrap();
    let window = TimeWindow {
        index: 3,
        start,
        end: start + chrono::TimeDelta::minutes(30),
    };
    let msg = MotionError::data_source(window, "partition offline").to_string();
    assert!(msg.contains("#3"));
    assert!(msg.contains("2020-04-01T00:00:00"));
    assert!(msg.contains("partition offline"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = MotionError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
