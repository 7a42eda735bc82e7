use crate::prelude::TestDaemon;

/// `config set` then `config get` round-trips the same value back.
#[test]
fn config_set_then_get_round_trips() {
    let daemon = TestDaemon::start();

    daemon
        .cli()
        .args(&["config", "set", "max_retries", "5"])
        .passes();

    daemon
        .cli()
        .args(&["config", "get", "max_retries"])
        .passes()
        .stdout_has("5");
}

/// `config list` enumerates every tunable the §8 scenarios exercise.
#[test]
fn config_list_contains_every_scenario_key() {
    let daemon = TestDaemon::start();

    let listing = daemon.cli().args(&["config", "list"]).passes();
    let stdout = listing.stdout();
    for key in [
        "max_retries",
        "backoff_base",
        "backoff_factor_ms",
        "tick_interval_ms",
        "save_interval_ms",
    ] {
        assert!(stdout.contains(key), "config list missing {key}:\n{stdout}");
    }
}

/// Reading a key that was never set is rejected, not silently defaulted.
#[test]
fn config_get_unknown_key_is_rejected() {
    let daemon = TestDaemon::start();
    daemon
        .cli()
        .args(&["config", "get", "not_a_real_key"])
        .fails();
}
