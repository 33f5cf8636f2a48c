//! # Configuration Tests
//!
//! Defaults, JSON deserialization, and validation of the simulator configuration.

use mesisim_core::common::SimError;
use mesisim_core::config::*;
use pretty_assertions::assert_eq;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.general.execution_mode, ExecutionMode::Interleaved);
    assert!(!config.general.dump_state);
    assert_eq!(
        config.system,
        SystemConfig {
            num_cores: 2,
            cache_slots: 2,
            memory_size: 24,
            initial_memory: Vec::new(),
        }
    );
}

#[test]
fn test_empty_json_uses_defaults() {
    let config = Config::from_json("{}").unwrap();
    assert_eq!(config.system, SystemConfig::default());
    assert_eq!(config.general.execution_mode, ExecutionMode::Interleaved);
}

#[test]
fn test_partial_system_section() {
    let config = Config::from_json(r#"{ "system": { "memory_size": 64 } }"#).unwrap();
    assert_eq!(config.system.memory_size, 64);
    assert_eq!(config.system.num_cores, 2);
    assert_eq!(config.system.cache_slots, 2);
}

#[test]
fn test_execution_mode_accepts_lowercase_alias() {
    let config =
        Config::from_json(r#"{ "general": { "execution_mode": "serialized", "dump_state": true } }"#)
            .unwrap();
    assert_eq!(config.general.execution_mode, ExecutionMode::Serialized);
    assert!(config.general.dump_state);
}

#[test]
fn test_zero_dimension_rejected() {
    let err = Config::from_json(r#"{ "system": { "cache_slots": 0 } }"#).unwrap_err();
    match err {
        SimError::InvalidConfig(msg) => assert_eq!(msg, "cache_slots must be at least 1"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_initial_memory_parsed() {
    let config =
        Config::from_json(r#"{ "system": { "memory_size": 4, "initial_memory": [7, 0, 9] } }"#)
            .unwrap();
    assert_eq!(config.system.initial_memory, vec![7, 0, 9]);
}

#[test]
fn test_oversized_initial_memory_rejected() {
    let err =
        Config::from_json(r#"{ "system": { "memory_size": 2, "initial_memory": [1, 2, 3] } }"#)
            .unwrap_err();
    match err {
        SimError::InvalidConfig(msg) => {
            assert_eq!(msg, "initial_memory holds 3 bytes but memory_size is 2");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_malformed_json_rejected() {
    assert!(matches!(
        Config::from_json("{ system: }"),
        Err(SimError::ConfigFormat(_))
    ));
}

#[test]
fn test_unknown_mode_rejected() {
    assert!(Config::from_json(r#"{ "general": { "execution_mode": "Random" } }"#).is_err());
}
