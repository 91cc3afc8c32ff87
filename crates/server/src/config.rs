use std::{collections::HashMap, fs, path::Path};

use tracing::warn;

pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_bind: String,
    pub max_body_bytes: usize,
    /// Empty means any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:5000".into(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            allowed_origins: Vec::new(),
        }
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new("server.toml"), |key| std::env::var(key).ok())
}

pub(crate) fn load_settings_from(
    config_path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(config_path) {
        match toml::from_str::<HashMap<String, toml::Value>>(&raw) {
            Ok(file_cfg) => apply_file_config(&mut settings, &file_cfg),
            Err(error) => warn!(path = %config_path.display(), %error, "ignoring unparseable config file"),
        }
    }

    if let Some(v) = env("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = env("APP__MAX_BODY_BYTES") {
        match v.trim().parse::<usize>() {
            Ok(parsed) if parsed > 0 => settings.max_body_bytes = parsed,
            _ => warn!(value = %v, "ignoring invalid APP__MAX_BODY_BYTES"),
        }
    }

    if let Some(v) = env("APP__ALLOWED_ORIGINS") {
        settings.allowed_origins = parse_origins(&v);
    }

    settings
}

fn apply_file_config(settings: &mut Settings, file_cfg: &HashMap<String, toml::Value>) {
    if let Some(v) = file_cfg.get("bind_addr").and_then(toml::Value::as_str) {
        settings.server_bind = v.to_string();
    }

    match file_cfg.get("max_body_bytes") {
        Some(toml::Value::Integer(n)) if *n > 0 => settings.max_body_bytes = *n as usize,
        Some(other) => warn!(value = %other, "ignoring invalid max_body_bytes"),
        None => {}
    }

    match file_cfg.get("allowed_origins") {
        Some(toml::Value::String(raw)) => settings.allowed_origins = parse_origins(raw),
        Some(toml::Value::Array(items)) => {
            let joined = items
                .iter()
                .filter_map(toml::Value::as_str)
                .collect::<Vec<_>>()
                .join(",");
            settings.allowed_origins = parse_origins(&joined);
        }
        Some(other) => warn!(value = %other, "ignoring invalid allowed_origins"),
        None => {}
    }
}

/// Comma separated list; `*` anywhere means any origin.
pub(crate) fn parse_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(|origin| origin.trim_end_matches('/').to_string())
        .collect();

    if origins.iter().any(|origin| origin == "*") {
        return Vec::new();
    }
    origins
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
