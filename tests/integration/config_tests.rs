use figment::providers::{Env, Serialized};
use figment::Figment;
use romdedupe::config::{Config, ENV_PREFIX};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_config_load_defaults() {
    // Use figment directly without Env to avoid interference from other tests
    let figment = Figment::from(Serialized::defaults(Config::default()));
    let config: Config = figment.extract().unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_config_load_from_env() {
    // Only lookup tuning keys; scans in parallel tests must not see a change
    std::env::set_var("ROMDEDUPE_RETRY__BACKOFF_MS", "25");
    std::env::set_var("ROMDEDUPE_RATE_LIMIT__HOURLY_CAP", "60");

    let figment = Figment::from(Serialized::defaults(Config::default()))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));
    let config: Config = figment.extract().unwrap();

    assert_eq!(config.retry.backoff_ms, 25);
    assert_eq!(config.retry.max_attempts, 3);
    assert_eq!(config.rate_limit.hourly_cap, 60);
    assert_eq!(config.rate_limiter().requests_in_window(), 0);

    std::env::remove_var("ROMDEDUPE_RETRY__BACKOFF_MS");
    std::env::remove_var("ROMDEDUPE_RATE_LIMIT__HOURLY_CAP");
}

#[test]
fn test_config_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
threads = 8
follow_symlinks = true
extensions = ["rom"]
skip_dirs = ["to_delete", "backup"]
europe_supersedes_japan = false

[rate_limit]
min_interval_ms = 250
"#,
    )
    .unwrap();

    let config = Config::load_from_path(&config_path, None);
    assert_eq!(config.threads, 8);
    assert!(config.follow_symlinks);
    assert_eq!(config.skip_dirs, vec!["to_delete", "backup"]);
    assert!(!config.policy().europe_supersedes_japan);
    assert_eq!(config.rate_limit.min_interval_ms, 250);
    assert_eq!(config.rate_limit.hourly_cap, 500);
    assert!(config.walker_config().accepts("Homebrew (World).ROM"));
}

#[test]
fn test_config_profile_overrides_base() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
threads = 8

[profile.archive]
threads = 2
use_cache = false
"#,
    )
    .unwrap();

    let base = Config::load_from_path(&config_path, None);
    assert_eq!(base.threads, 8);
    assert!(base.use_cache);

    let archive = Config::load_from_path(&config_path, Some("archive"));
    assert_eq!(archive.threads, 2);
    assert!(!archive.use_cache);

    // Unknown profiles fall back to the base settings
    let missing = Config::load_from_path(&config_path, Some("nope"));
    assert_eq!(missing.threads, 8);

    assert_eq!(Config::list_profiles(&config_path), vec!["archive"]);
}

#[test]
fn test_config_wrong_type_yields_defaults() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "threads = \"many\"\n").unwrap();

    let config = Config::load_from_path(&config_path, None);
    assert_eq!(config.threads, Config::default().threads);
}
