use super::*;

#[test]
fn size_and_family_are_validated() {
    assert!(FontSpec::system("sans-serif", 14.0).validate().is_ok());
    assert!(FontSpec::system("sans-serif", 0.0).validate().is_err());
    assert!(FontSpec::system("sans-serif", f32::NAN).validate().is_err());
    assert!(FontSpec::system("  ", 14.0).validate().is_err());
}

#[test]
fn missing_font_file_is_an_error() {
    let spec = FontSpec::from_file("Nope", 12.0, "/definitely/not/here.ttf");
    assert!(spec.load_fontdb().is_err());
}

#[test]
fn no_sources_yields_empty_database() {
    let spec = FontSpec {
        family: "Anything".to_owned(),
        size_px: 12.0,
        font_files: Vec::new(),
        font_dirs: vec![std::env::temp_dir().join("motionshader-no-such-font-dir")],
        system_fonts: false,
    };
    let db = spec.load_fontdb().unwrap();
    assert_eq!(db.len(), 0);
}

#[test]
fn serde_defaults_optional_sources() {
    let spec: FontSpec =
        serde_json::from_str(r#"{"family": "DejaVu Sans", "size_px": 14}"#).unwrap();
    assert!(spec.font_files.is_empty());
    assert!(spec.system_fonts);

    let explicit: FontSpec = serde_json::from_str(
        r#"{"family": "DejaVu Sans", "size_px": 14, "font_files": ["a.ttf"], "system_fonts": false}"#,
    )
    .unwrap();
    assert!(!explicit.system_fonts);
}
