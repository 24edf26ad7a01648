use std::collections::HashMap;

use super::*;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn missing_file_and_env_yield_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = load_settings_with(&dir.path().join("browser.toml"), env_from(&[]));

    assert_eq!(settings, Settings::default());
    assert_eq!(settings.api_base_url, "http://localhost:3000/api");
    assert_eq!(settings.page_size, 20);
    assert_eq!(settings.filter_debounce(), Duration::from_millis(300));
    assert_eq!(settings.load_more_threshold, 5);
}

#[test]
fn file_values_are_overridden_by_env() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("browser.toml");
    fs::write(
        &path,
        r#"
api_base_url = "http://items.internal:8080/api"
page_size = 50
filter_debounce_ms = 150
"#,
    )
    .expect("write config");

    let settings = load_settings_with(
        &path,
        env_from(&[
            ("API_BASE_URL", "http://ignored:1/api"),
            ("APP__API_BASE_URL", "http://env:9000/api"),
            ("APP__LOAD_MORE_THRESHOLD", "8"),
            ("APP__PAGE_SIZE", "not-a-number"),
        ]),
    );

    assert_eq!(settings.api_base_url, "http://env:9000/api");
    assert_eq!(settings.page_size, 50);
    assert_eq!(settings.filter_debounce_ms, 150);
    assert_eq!(settings.load_more_threshold, 8);
    assert_eq!(settings.reconciler_options().page_size, 50);
}

#[test]
fn malformed_file_is_ignored() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("browser.toml");
    fs::write(&path, "page_size = [").expect("write config");

    let settings = load_settings_with(&path, env_from(&[]));
    assert_eq!(settings.page_size, DEFAULT_PAGE_SIZE);
}

#[test]
fn validate_rejects_bad_url_and_zero_page_size() {
    let mut settings = Settings::default();
    assert!(settings.validate().is_ok());

    settings.api_base_url = "localhost without scheme".into();
    assert!(settings.validate().is_err());

    settings = Settings {
        page_size: 0,
        ..Settings::default()
    };
    assert!(settings.validate().is_err());
}

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
    assert_eq!(normalize_database_url("sqlite:cache.db"), "sqlite://cache.db");
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
}

#[test]
fn prepare_creates_parent_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    let target = dir.path().join("nested").join("cache.db");

    let url = prepare_database_url(&target.display().to_string()).expect("prepare");

    assert!(url.starts_with("sqlite://"));
    assert!(dir.path().join("nested").exists());
}
