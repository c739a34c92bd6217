use std::{fs, path::Path};

use serde::Deserialize;
use shared::order::SortSpec;

pub const CONFIG_FILE: &str = "notes.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    pub default_sort: SortSpec,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://./data/notes.db".into(),
            default_sort: SortSpec::default(),
            log_filter: "info".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    database_url: Option<String>,
    default_sort: Option<String>,
    log: Option<String>,
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(CONFIG_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then the toml file (if readable), then environment variables.
/// Unparseable sort values keep whatever the previous layer set.
fn load_settings_from(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        if let Ok(file_cfg) = toml::from_str::<FileSettings>(&raw) {
            if let Some(v) = file_cfg.database_url {
                settings.database_url = v;
            }
            if let Some(sort) = file_cfg.default_sort.and_then(|v| v.parse().ok()) {
                settings.default_sort = sort;
            }
            if let Some(v) = file_cfg.log {
                settings.log_filter = v;
            }
        }
    }

    if let Some(v) = env("NOTES_DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = env("APP__DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(sort) = env("NOTES_DEFAULT_SORT").and_then(|v| v.parse().ok()) {
        settings.default_sort = sort;
    }
    if let Some(v) = env("NOTES_LOG") {
        settings.log_filter = v;
    }

    settings
}

pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }
    if raw_database_url.starts_with("sqlite::memory:") {
        return raw_database_url.to_string();
    }
    if let Some(path) = raw_database_url.strip_prefix("sqlite://") {
        return sqlite_url(path);
    }
    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        return sqlite_url(path);
    }
    if raw_database_url.contains("://") {
        return raw_database_url.to_string();
    }

    sqlite_url(raw_database_url)
}

fn sqlite_url(path: &str) -> String {
    let path = path.replace('\\', "/");
    if has_drive_letter(&path) {
        format!("sqlite:{path}")
    } else {
        format!("sqlite://{path}")
    }
}

fn has_drive_letter(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
