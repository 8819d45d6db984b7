// core/tests/test_storage.rs
use std::fs;

use fleettrack_core::{load_config, save_config, ShiftConfig, TrackError, UnitScale};

fn tmp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("fleettrack_{}_{}", std::process::id(), name))
}

#[test]
fn test_save_and_load_config() {
    let path = tmp_path("cfg_roundtrip.json");

    let cfg = ShiftConfig {
        moving_speed_threshold: 5.0,
        max_gap_seconds: 120,
        split_idle_resume_at_gap: false,
        units: UnitScale::raw_telematics(),
        event_ids: vec![2, 811],
        day_offset_minutes: 180,
    };

    save_config(&cfg, &path).expect("could not save config");
    let loaded = load_config(&path).expect("could not load config");
    assert_eq!(loaded, cfg);

    fs::remove_file(&path).ok();
}

#[test]
fn missing_file_gives_defaults() {
    let path = tmp_path("does_not_exist.json");
    let _ = fs::remove_file(&path);
    assert_eq!(load_config(&path).unwrap(), ShiftConfig::default());
}

#[test]
fn partial_file_fills_in_defaults() {
    let path = tmp_path("partial.json");
    fs::write(&path, r#"{ "max_gap_seconds": 600 }"#).unwrap();

    let cfg = load_config(&path).unwrap();
    assert_eq!(cfg.max_gap_seconds, 600);
    assert_eq!(cfg.moving_speed_threshold, 3.0);
    assert_eq!(cfg.event_ids, vec![2, 802, 803, 804, 811]);

    fs::remove_file(&path).ok();
}

#[test]
fn bad_field_reports_its_path() {
    let path = tmp_path("bad.json");
    fs::write(&path, r#"{ "units": { "speed_divisor": "fast" } }"#).unwrap();

    match load_config(&path) {
        Err(TrackError::Json { path: field, .. }) => assert_eq!(field, "units.speed_divisor"),
        other => panic!("expected Json error, got {other:?}"),
    }
    fs::remove_file(&path).ok();
}

#[test]
fn invalid_values_are_not_saved() {
    let path = tmp_path("invalid.json");
    let cfg = ShiftConfig {
        max_gap_seconds: -1,
        ..Default::default()
    };
    assert!(matches!(save_config(&cfg, &path), Err(TrackError::InvalidConfig(_))));
    assert!(!path.exists());
}

#[test]
fn out_of_range_numbers_are_config_errors() {
    let path = tmp_path("out_of_range.json");
    for body in [
        r#"{ "max_gap_seconds": 9223372036854775807 }"#,
        r#"{ "day_offset_minutes": 40000000 }"#,
        r#"{ "units": { "speed_divisor": -100.0 } }"#,
    ] {
        fs::write(&path, body).unwrap();
        assert!(
            matches!(load_config(&path), Err(TrackError::InvalidConfig(_))),
            "{body}"
        );
    }
    fs::remove_file(&path).ok();
}
