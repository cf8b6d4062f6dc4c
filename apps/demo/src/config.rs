use std::{collections::HashMap, fs, io, path::Path};

use anyhow::Context;

pub const DEFAULT_SOURCE_URL: &str = "http://reshade.io:1234/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub source_url: String,
    pub group_value: String,
    pub fetch_timeout_ms: u64,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.into(),
            group_value: r#"[{"Common":false},{"Rare":true}]"#.into(),
            fetch_timeout_ms: 5_000,
            log_filter: "info".into(),
        }
    }
}

/// Defaults, then the flat string table in `path` (if present), then
/// `APP__*` environment variables.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(path) {
        Ok(raw) => {
            let file_cfg = toml::from_str::<HashMap<String, String>>(&raw)
                .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
            apply_file(&mut settings, &file_cfg);
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()));
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file(settings: &mut Settings, file_cfg: &HashMap<String, String>) {
    if let Some(v) = file_cfg.get("source_url") {
        settings.source_url = v.clone();
    }
    if let Some(v) = file_cfg.get("group_value") {
        settings.group_value = v.clone();
    }
    if let Some(parsed) = file_cfg
        .get("fetch_timeout_ms")
        .and_then(|v| v.parse::<u64>().ok())
    {
        settings.fetch_timeout_ms = parsed;
    }
    if let Some(v) = file_cfg.get("log_filter") {
        settings.log_filter = v.clone();
    }
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("APP__SOURCE_URL") {
        settings.source_url = v;
    }
    if let Some(v) = lookup("APP__GROUP_VALUE") {
        settings.group_value = v;
    }
    if let Some(parsed) = lookup("APP__FETCH_TIMEOUT_MS").and_then(|v| v.parse::<u64>().ok()) {
        settings.fetch_timeout_ms = parsed;
    }
    if let Some(v) = lookup("APP__LOG_FILTER") {
        settings.log_filter = v;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
