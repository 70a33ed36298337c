use super::*;
use serde_json::json;

#[test]
fn fire_is_a_non_empty_continuous_palette() {
    let ColorMapping::Continuous(p) = ColorMapping::fire() else {
        panic!("fire must be continuous");
    };
    assert_eq!(p.first(), Some(&Rgba8::BLACK));
    assert_eq!(p.last(), Some(&Rgba8::WHITE));
}

#[test]
fn empty_mappings_fail_validation() {
    assert!(ColorMapping::Continuous(vec![]).validate().is_err());
    assert!(ColorMapping::Categorical(BTreeMap::new()).validate().is_err());
}

#[test]
fn duplicate_categories_are_rejected() {
    let err = ColorMapping::categorical([("Riots", Rgba8::BLACK), ("Riots", Rgba8::WHITE)]);
    assert!(matches!(err, Err(MotionError::Validation(_))));
}

#[test]
fn palette_sampling_interpolates_between_stops() {
    let p = [Rgba8::rgb(0, 0, 0), Rgba8::rgb(100, 0, 0), Rgba8::rgb(100, 200, 0)];
    assert_eq!(sample_palette(&p, 0.0), p[0]);
    assert_eq!(sample_palette(&p, 0.25), Rgba8::rgb(50, 0, 0));
    assert_eq!(sample_palette(&p, 0.5), p[1]);
    assert_eq!(sample_palette(&p, 1.0), p[2]);
    assert_eq!(sample_palette(&p, 7.0), p[2]);
    assert_eq!(sample_palette(&p[..1], 0.3), p[0]);
}

#[test]
fn serde_is_externally_tagged() {
    let m: ColorMapping = serde_json::from_value(json!({
        "categorical": {"Protests": "#ff33cc", "Riots": "#ffff00"}
    }))
    .unwrap();
    assert!(m.is_categorical());

    let m: ColorMapping = serde_json::from_value(json!({"continuous": ["#000", "#fff"]})).unwrap();
    assert_eq!(
        m,
        ColorMapping::Continuous(vec![Rgba8::BLACK, Rgba8::WHITE])
    );
}
