use std::io::Write;

use fitscan_core::config::{EngineConfig, RoundingMode};
use fitscan_core::ConfigError;

#[test]
fn default_config_is_valid() {
    let config = EngineConfig::default();
    config.validate().expect("defaults validate");
    assert!((config.aggregation.weights.total() - 1.0).abs() < 1e-12);
    assert_eq!(config.scoring.rounding, RoundingMode::HalfUp);
}

#[test]
fn yaml_roundtrip_through_file() {
    let mut config = EngineConfig::default();
    config.scoring.rounding = RoundingMode::Floor;
    config.anomalies.max_materials = 80;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(config.to_yaml().unwrap().as_bytes()).unwrap();

    let loaded = EngineConfig::load(file.path()).expect("load");
    assert_eq!(loaded, config);
}

#[test]
fn partial_yaml_falls_back_to_defaults() {
    let config = EngineConfig::from_yaml(
        "scoring:\n  rounding: floor\nsizing:\n  scale_delta_threshold: 0.05\n",
    )
    .unwrap();

    assert_eq!(config.scoring.rounding, RoundingMode::Floor);
    assert_eq!(config.scoring.ceiling, 100);
    assert_eq!(config.sizing.scale_delta_threshold, 0.05);
    assert_eq!(config.sizing.single_path_discount, 0.8);
    assert!(config
        .anomalies
        .fashion_generators
        .iter()
        .any(|g| g == "clo3d"));
}

#[test]
fn weights_must_sum_to_one() {
    let err = EngineConfig::from_yaml(
        "aggregation:\n  weights:\n    garment_elements: 0.5\n    materials: 0.5\n",
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)), "got {err:?}");
}

#[test]
fn textile_fallback_must_stay_low() {
    let err = EngineConfig::from_yaml("materials:\n  default_textile_confidence: 0.7\n")
        .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = EngineConfig::load_or_default(Some(&dir.path().join("absent.yaml"))).unwrap();
    assert_eq!(config, EngineConfig::default());

    let err = EngineConfig::load(&dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn malformed_yaml_is_reported() {
    let err = EngineConfig::from_yaml("scoring: [not, a, map").unwrap_err();
    assert!(matches!(err, ConfigError::Yaml(_)));
}

#[test]
fn score_ceiling_must_stay_within_hundred() {
    let err = EngineConfig::from_yaml("scoring:\n  ceiling: 250\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)), "got {err:?}");

    let err = EngineConfig::from_yaml("scoring:\n  ceiling: 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));

    let config = EngineConfig::from_yaml("scoring:\n  ceiling: 90\n").unwrap();
    assert_eq!(config.scoring.ceiling, 90);
}
