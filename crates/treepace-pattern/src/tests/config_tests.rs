//! Tests for [`EngineConfig`].

use crate::EngineConfig;

#[test]
fn defaults() {
    let config = EngineConfig::default();
    assert_eq!(config.max_passes(), 100);
    assert_eq!(config.max_matches(), 10_000);
    assert_eq!(config.max_quantifier_bound(), 1024);
    assert!(!config.allow_overlap());
}

#[test]
fn builders_override_single_fields() {
    let config = EngineConfig::default()
        .with_max_passes(3)
        .with_allow_overlap(true);
    assert_eq!(config, EngineConfig::new(3, 10_000, 1024, true));
}

#[test]
fn deserialises_partial_json() {
    let config: EngineConfig =
        serde_json::from_str(r#"{"max_passes": 7, "allow_overlap": true}"#).expect("config");
    assert_eq!(config.max_passes(), 7);
    assert!(config.allow_overlap());
    assert_eq!(config.max_matches(), 10_000);
}

#[test]
fn rejects_unknown_fields() {
    let result = serde_json::from_str::<EngineConfig>(r#"{"max_pass": 7}"#);
    assert!(result.is_err());
}
