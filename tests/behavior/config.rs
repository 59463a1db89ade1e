//! Configuration (de)serialization.

use frameflow::{Cadence, SchedulerConfig};

#[test]
fn test_config_round_trips_through_json() {
    let config = SchedulerConfig {
        name: "render-units".to_string(),
        updates_enabled: false,
    };

    let json = serde_json::to_string(&config).unwrap();
    let back: SchedulerConfig = serde_json::from_str(&json).unwrap();

    assert_eq!(back.name, "render-units");
    assert!(!back.updates_enabled);
}

#[test]
fn test_missing_fields_fall_back_to_defaults() {
    let config: SchedulerConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config.name, "frame-scheduler");
    assert!(config.updates_enabled);
}

#[test]
fn test_cadence_serializes_as_its_variant_name() {
    assert_eq!(
        serde_json::to_string(&Cadence::Immediate).unwrap(),
        "\"Immediate\""
    );
    let back: Cadence = serde_json::from_str("\"Default\"").unwrap();
    assert_eq!(back, Cadence::Default);
}
