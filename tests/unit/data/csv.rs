use super::*;

use chrono::TimeZone as _;

use crate::data::dataset::WindowedDataSource as _;
use crate::scene::playback::TimeWindow;

const ACLED: &str = "\
timestamp,longitude,latitude,event_type,fatalities
2020-01-03T00:00:00Z,36.8,-1.3,Protests,
1578096000,36.9,-1.2,Riots,2
2020-01-02 12:30:00,37.0,-1.1,,0
";

fn columns() -> CsvColumns {
    CsvColumns {
        category: Some("event_type".to_owned()),
        weight: Some("fatalities".to_owned()),
        ..CsvColumns::default()
    }
}

#[test]
fn reads_points_with_optional_columns() {
    let ds = PointDataset::from_csv_reader(ACLED.as_bytes(), &columns(), 2).unwrap();
    assert_eq!(ds.len(), 3);

    let pts: Vec<_> = ds.iter().cloned().collect();
    // Sorted by time: 01-02 12:30, 01-03 00:00, 01-04 00:00.
    assert_eq!(pts[0].category, None);
    assert_eq!(pts[0].weight, Some(0.0));
    assert_eq!(pts[1].category.as_deref(), Some("Protests"));
    assert_eq!(pts[1].weight, None);
    assert_eq!(pts[2].category.as_deref(), Some("Riots"));
    assert_eq!(pts[2].weight, Some(2.0));

    let w = TimeWindow {
        index: 0,
        start: Utc.with_ymd_and_hms(2020, 1, 3, 0, 0, 0).unwrap(),
        end: Utc.with_ymd_and_hms(2020, 1, 4, 0, 0, 0).unwrap(),
    };
    assert_eq!(ds.subset(&w).unwrap().len(), 1);
}

#[test]
fn missing_column_is_a_config_error() {
    let cols = CsvColumns {
        longitude: "lng".to_owned(),
        ..CsvColumns::default()
    };
    let err = PointDataset::from_csv_reader(ACLED.as_bytes(), &cols, 1).unwrap_err();
    assert!(matches!(err, MotionError::Config(ref m) if m.contains("lng")));
}

#[test]
fn malformed_coordinate_names_the_row() {
    let data = "timestamp,longitude,latitude\n2020-01-01,abc,1.0\n";
    let err = PointDataset::from_csv_reader(data.as_bytes(), &CsvColumns::default(), 1)
        .unwrap_err()
        .to_string();
    assert!(err.contains("row 1"));
    assert!(err.contains("longitude"));
}

#[test]
fn timestamp_layouts() {
    let midnight = Utc.with_ymd_and_hms(2020, 4, 1, 0, 0, 0).unwrap();
    assert_eq!(parse_timestamp("2020-04-01"), Some(midnight));
    assert_eq!(parse_timestamp("2020-04-01T00:00:00"), Some(midnight));
    assert_eq!(parse_timestamp("2020-04-01T02:00:00+02:00"), Some(midnight));
    assert_eq!(parse_timestamp("1585699200"), Some(midnight));
    assert_eq!(parse_timestamp("yesterday"), None);
}
