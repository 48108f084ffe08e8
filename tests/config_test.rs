//! Configuration persistence tests

use head_pose_midi::{
    calibration::FieldValue,
    config::{Config, EXAMPLE_CONFIG},
    pose::{Axis, NeutralOffsets},
};
use std::fs;
use std::path::PathBuf;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("head-pose-midi-{}-{name}", std::process::id()))
}

#[test]
fn test_save_and_reload() {
    let path = temp_path("roundtrip.yaml");
    let mut config = Config::default();
    config.calibrate_axis(Axis::Yaw, -12.5, true);
    config.calibrate_axis(Axis::Yaw, 40.0, false);
    config
        .update_axis_field(Axis::Roll, "enabled", FieldValue::Bool(false))
        .unwrap();
    config.set_neutral_offsets(NeutralOffsets {
        pitch: 1.5,
        yaw: -2.0,
        roll: 0.25,
    });
    config.midi.port_index = Some(2);

    config.to_file(&path).unwrap();
    let loaded = Config::from_file(&path).unwrap();
    fs::remove_file(&path).ok();

    assert_eq!(loaded, config);
}

#[test]
fn test_partial_file_merged_with_defaults() {
    let path = temp_path("partial.yaml");
    fs::write(&path, "pitch:\n  input_min: -15.0\nneutral:\n  yaw: 4.0\nfilter:\n  jump_threshold: 45.0\n").unwrap();

    let loaded = Config::from_file(&path).unwrap();
    fs::remove_file(&path).ok();

    assert_eq!(loaded.axes.pitch.input_min, -15.0);
    assert_eq!(loaded.axes.pitch.input_max, 30.0);
    assert_eq!(loaded.axes.pitch.cc_number, 1);
    assert_eq!(loaded.neutral.yaw, 4.0);
    assert_eq!(loaded.neutral.pitch, 0.0);
    assert_eq!(loaded.filter.jump_threshold, 45.0);
    assert_eq!(loaded.filter.smoothing_factor, 0.3);
    assert_eq!(loaded.midi.virtual_port_name, "Face to MIDI");
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let path = temp_path("does-not-exist.yaml");
    assert!(Config::from_file(&path).is_err());
    assert_eq!(Config::load_or_default(&path), Config::default());
}

#[test]
fn test_invalid_file_falls_back_to_defaults() {
    let path = temp_path("invalid.yaml");
    fs::write(&path, "pitch: [1, 2\n").unwrap();

    assert!(Config::from_file(&path).is_err());
    assert_eq!(Config::load_or_default(&path), Config::default());
    fs::remove_file(&path).ok();
}

#[test]
fn test_example_config_parses() {
    let config = Config::from_yaml_str(EXAMPLE_CONFIG).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.axes.roll.cc_number, 3);
}
