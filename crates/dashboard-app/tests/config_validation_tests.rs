use std::env;
use std::path::PathBuf;
use std::sync::Mutex;

use dashboard_app::DashboardConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

#[test]
fn toml_config_validates() {
    let _guard = ENV_LOCK.lock().expect("env lock");
    env::set_var("B2500_CONFIG", fixture_path("config-valid.toml"));

    let config = DashboardConfig::load().expect("load config");
    config.validate().expect("validate config");

    assert_eq!(config.family, "b2500");
    assert_eq!(config.slots, vec!["1".to_string(), "2".to_string()]);
    assert_eq!(config.stream.host, "192.168.1.40");
    assert_eq!(config.metrics_listen.as_deref(), Some("127.0.0.1:9184"));
    assert_eq!(config.actions().base_url, "http://192.168.1.40");

    env::remove_var("B2500_CONFIG");
}

#[test]
fn json_config_validates_and_derives_the_action_base() {
    let _guard = ENV_LOCK.lock().expect("env lock");
    env::set_var("B2500_CONFIG", fixture_path("config-valid.json"));

    let config = DashboardConfig::load().expect("load config");
    config.validate().expect("validate config");

    // No [actions] section: the base falls back to the stream endpoint.
    assert_eq!(config.actions().base_url, "http://10.0.0.7:8080");

    env::remove_var("B2500_CONFIG");
}

#[test]
fn invalid_config_fails_validation() {
    let _guard = ENV_LOCK.lock().expect("env lock");
    env::set_var("B2500_CONFIG", fixture_path("config-invalid.toml"));

    let config = DashboardConfig::load().expect("load config");
    assert!(config.validate().is_err());

    env::remove_var("B2500_CONFIG");
}

#[test]
fn env_overrides_take_precedence() {
    let _guard = ENV_LOCK.lock().expect("env lock");
    env::set_var("B2500_CONFIG", fixture_path("config-valid.toml"));
    env::set_var("B2500_SLOTS", "3, 4");
    env::set_var("B2500_PORT", "8123");

    let config = DashboardConfig::load().expect("load config");
    config.validate().expect("validate config");

    assert_eq!(config.slots, vec!["3".to_string(), "4".to_string()]);
    assert_eq!(config.stream.port, 8123);

    env::remove_var("B2500_CONFIG");
    env::remove_var("B2500_SLOTS");
    env::remove_var("B2500_PORT");
}

#[test]
fn duplicate_slots_fail_validation() {
    let _guard = ENV_LOCK.lock().expect("env lock");

    let mut config = DashboardConfig::default();
    config.slots = vec!["1".to_string(), "1".to_string()];
    assert!(config.validate().is_err());

    config.slots = vec!["one".to_string()];
    assert!(config.validate().is_err());

    config.slots = vec!["1".to_string(), "12".to_string()];
    config.validate().expect("digit slots validate");
}

fn fixture_path(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    path.to_string_lossy().to_string()
}
