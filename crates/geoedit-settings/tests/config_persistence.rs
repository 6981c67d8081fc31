use geoedit_settings::{Config, ConfigError};
use tempfile::TempDir;

#[test]
fn test_toml_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config.viewport.point_zoom = 15.0;
    config.style.selected_stroke = "#ff8800".to_string();
    config.save_to_file(&path).unwrap();

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_json_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    let mut config = Config::default();
    config.import.csv_max_bytes = 1024;
    config.save_to_file(&path).unwrap();

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded.import.csv_max_bytes, 1024);
}

#[test]
fn test_partial_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[map]\nhit_tolerance_px = 4.0\n").unwrap();

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded.map.hit_tolerance_px, 4.0);
    assert_eq!(loaded.viewport, Config::default().viewport);
}

#[test]
fn test_invalid_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[viewport]\ndefault_zoom = -3.0\n").unwrap();

    let err = Config::load_from_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::ValueOutOfRange { .. }));
}
