use super::*;

fn nyc() -> ViewportSpec {
    ViewportSpec::new(-74.3, -73.7, 40.5, 40.9, 100, 100).unwrap()
}

#[test]
fn valid_viewport_derives_center() {
    let v = nyc();
    assert!((v.center_lon() - -74.0).abs() < 1e-9);
    assert!((v.center_lat() - 40.7).abs() < 1e-9);
    assert_eq!(v.bbox(), (-74.3, 40.5, -73.7, 40.9));
}

#[test]
fn inverted_or_degenerate_bounds_fail_validation() {
    let cases = [
        ViewportSpec::new(-73.7, -74.3, 40.5, 40.9, 100, 100),
        ViewportSpec::new(-74.0, -74.0, 40.5, 40.9, 100, 100),
        ViewportSpec::new(-74.3, -73.7, 40.9, 40.5, 100, 100),
        ViewportSpec::new(-74.3, -73.7, 40.5, 40.9, 0, 100),
        ViewportSpec::new(-74.3, -73.7, 40.5, 40.9, 100, 0),
        ViewportSpec::new(f64::NAN, -73.7, 40.5, 40.9, 100, 100),
    ];
    for case in cases {
        assert!(matches!(case, Err(MotionError::Validation(_))));
    }
}

#[test]
fn bins_are_north_up_and_edges_fold_inward() {
    let v = ViewportSpec::new(0.0, 10.0, 0.0, 10.0, 10, 10).unwrap();
    assert_eq!(v.bin_of(0.0, 10.0), Some((0, 0)));
    assert_eq!(v.bin_of(10.0, 0.0), Some((9, 9)));
    assert_eq!(v.bin_of(5.5, 2.5), Some((5, 7)));
}

#[test]
fn out_of_extent_points_have_no_bin() {
    let v = nyc();
    assert_eq!(v.bin_of(-75.0, 40.7), None);
    assert_eq!(v.bin_of(-74.0, 41.0), None);
    assert_eq!(v.bin_of(f64::INFINITY, 40.7), None);
}
