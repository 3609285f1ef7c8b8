use std::{fs, path::Path};

use tracing::warn;

pub const DEFAULT_SETTINGS_FILE: &str = "pipeline.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub org_id: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8080/api".into(),
            api_token: None,
            org_id: None,
            request_timeout_secs: 30,
        }
    }
}

/// Defaults, then `path` (or `pipeline.toml`) if readable, then environment.
pub fn load_settings(path: Option<&Path>) -> ClientSettings {
    let mut settings = ClientSettings::default();

    let path = path.unwrap_or_else(|| Path::new(DEFAULT_SETTINGS_FILE));
    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<toml::Table>(&raw) {
            Ok(file_cfg) => apply_file(&mut settings, &file_cfg),
            Err(err) => warn!(
                path = %path.display(),
                "config: ignoring unparsable settings file: {err}"
            ),
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings.api_base_url = normalize_base_url(&settings.api_base_url);
    settings
}

fn apply_file(settings: &mut ClientSettings, file_cfg: &toml::Table) {
    if let Some(v) = file_cfg.get("api_base_url").and_then(|v| v.as_str()) {
        settings.api_base_url = v.to_string();
    }
    if let Some(v) = file_cfg.get("api_token").and_then(|v| v.as_str()) {
        settings.api_token = Some(v.to_string());
    }
    if let Some(v) = file_cfg.get("org_id").and_then(|v| v.as_str()) {
        settings.org_id = Some(v.to_string());
    }
    if let Some(v) = file_cfg
        .get("request_timeout_secs")
        .and_then(|v| v.as_integer())
        .and_then(|v| u64::try_from(v).ok())
    {
        settings.request_timeout_secs = v;
    }
}

pub(crate) fn apply_env(settings: &mut ClientSettings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("PIPELINE_API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = lookup("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = lookup("PIPELINE_API_TOKEN") {
        settings.api_token = Some(v);
    }
    if let Some(v) = lookup("APP__API_TOKEN") {
        settings.api_token = Some(v);
    }

    if let Some(v) = lookup("APP__ORG_ID") {
        settings.org_id = Some(v);
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }
}

pub fn normalize_base_url(raw_base_url: &str) -> String {
    let raw_base_url = raw_base_url.trim();

    if raw_base_url.is_empty() {
        return ClientSettings::default().api_base_url;
    }

    let with_scheme = if raw_base_url.contains("://") {
        raw_base_url.to_string()
    } else {
        format!("http://{raw_base_url}")
    };

    with_scheme.trim_end_matches('/').to_string()
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
