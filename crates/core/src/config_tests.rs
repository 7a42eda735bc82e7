use super::*;

#[test]
fn key_round_trips_through_str() {
    for key in ConfigKey::ALL {
        let parsed: ConfigKey = key.as_str().parse().unwrap();
        assert_eq!(parsed, key);
    }
}

#[test]
fn unknown_key_rejected() {
    assert!("bogus".parse::<ConfigKey>().is_err());
}

#[test]
fn validate_rejects_out_of_range() {
    assert!(ConfigKey::TickIntervalMs.validate(10).is_err());
    assert!(ConfigKey::TickIntervalMs.validate(50).is_ok());
    assert!(ConfigKey::BackoffBase.validate(0).is_err());
    assert!(ConfigKey::MaxRetries.validate(0).is_ok());
}

#[test]
fn default_engine_config_matches_key_defaults() {
    let cfg = EngineConfig::default();
    assert_eq!(cfg.max_retries, 3);
    assert_eq!(cfg.backoff_base, 2);
    assert_eq!(cfg.tick_interval_ms, 200);
}
