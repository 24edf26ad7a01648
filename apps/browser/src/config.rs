use std::{fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use selection_core::{
    debounce::DEFAULT_FILTER_DEBOUNCE, transport::DEFAULT_API_BASE_URL,
    viewport::DEFAULT_LOAD_MORE_THRESHOLD, ReconcilerOptions, DEFAULT_PAGE_SIZE,
};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_CONFIG_PATH: &str = "browser.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub page_size: u64,
    pub cache_database_url: String,
    pub filter_debounce_ms: u64,
    pub load_more_threshold: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            page_size: DEFAULT_PAGE_SIZE,
            cache_database_url: "sqlite://./data/browser.db".into(),
            filter_debounce_ms: DEFAULT_FILTER_DEBOUNCE.as_millis() as u64,
            load_more_threshold: DEFAULT_LOAD_MORE_THRESHOLD,
        }
    }
}

impl Settings {
    pub fn reconciler_options(&self) -> ReconcilerOptions {
        ReconcilerOptions {
            page_size: self.page_size,
            load_more_threshold: self.load_more_threshold,
        }
    }

    pub fn filter_debounce(&self) -> Duration {
        Duration::from_millis(self.filter_debounce_ms)
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.api_base_url)
            .with_context(|| format!("api_base_url '{}' is not a valid url", self.api_base_url))?;
        anyhow::ensure!(self.page_size > 0, "page_size must be at least 1");
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    page_size: Option<u64>,
    cache_database_url: Option<String>,
    filter_debounce_ms: Option<u64>,
    load_more_threshold: Option<usize>,
}

pub fn load_settings(config_path: &Path) -> Settings {
    load_settings_with(config_path, |key| std::env::var(key).ok())
}

/// Defaults, then the optional toml file, then environment overrides.
/// Unreadable files and unparseable numbers are ignored.
pub fn load_settings_with(config_path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(config_path) {
        if let Ok(file_cfg) = toml::from_str::<FileSettings>(&raw) {
            if let Some(v) = file_cfg.api_base_url {
                settings.api_base_url = v;
            }
            if let Some(v) = file_cfg.page_size {
                settings.page_size = v;
            }
            if let Some(v) = file_cfg.cache_database_url {
                settings.cache_database_url = v;
            }
            if let Some(v) = file_cfg.filter_debounce_ms {
                settings.filter_debounce_ms = v;
            }
            if let Some(v) = file_cfg.load_more_threshold {
                settings.load_more_threshold = v;
            }
        }
    }

    if let Some(v) = env("API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = env("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = env("CACHE_DATABASE_URL") {
        settings.cache_database_url = v;
    }
    if let Some(v) = env("APP__CACHE_DATABASE_URL") {
        settings.cache_database_url = v;
    }

    if let Some(parsed) = env("APP__PAGE_SIZE").and_then(|v| v.parse::<u64>().ok()) {
        settings.page_size = parsed;
    }
    if let Some(parsed) = env("APP__FILTER_DEBOUNCE_MS").and_then(|v| v.parse::<u64>().ok()) {
        settings.filter_debounce_ms = parsed;
    }
    if let Some(parsed) = env("APP__LOAD_MORE_THRESHOLD").and_then(|v| v.parse::<usize>().ok()) {
        settings.load_more_threshold = parsed;
    }

    settings
}

pub fn prepare_database_url(raw_database_url: &str) -> Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    storage::ensure_sqlite_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().cache_database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:") || raw_database_url.contains("://") {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        return format!("sqlite://{}", path.replace('\\', "/"));
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
