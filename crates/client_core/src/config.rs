use std::{collections::HashMap, fs, path::Path};

use serde::Deserialize;
use shared::protocol::STATUS_FEED_PATH;
use url::Url;

use crate::error::TransportError;

pub const SETTINGS_FILE: &str = "dashboard.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct ClientSettings {
    pub server_url: String,
    pub event_buffer: usize,
    pub feed_queue: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8000".into(),
            event_buffer: 256,
            feed_queue: 256,
        }
    }
}

impl ClientSettings {
    /// Server url without a trailing slash, validated as http(s).
    pub fn api_base(&self) -> Result<String, TransportError> {
        let parsed = Url::parse(self.server_url.trim())
            .map_err(|err| TransportError::InvalidUrl(format!("{}: {err}", self.server_url)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(TransportError::InvalidUrl(format!(
                "{}: server_url must start with http:// or https://",
                self.server_url
            )));
        }
        Ok(self.server_url.trim().trim_end_matches('/').to_string())
    }

    pub fn status_feed_url(&self) -> Result<String, TransportError> {
        status_feed_url(&self.api_base()?)
    }
}

/// Maps the http(s) server url onto the ws(s) status endpoint.
pub fn status_feed_url(server_url: &str) -> Result<String, TransportError> {
    let base = server_url.trim_end_matches('/');
    let ws_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        return Err(TransportError::InvalidUrl(format!(
            "{server_url}: server_url must start with http:// or https://"
        )));
    };
    Ok(format!("{ws_base}{STATUS_FEED_PATH}"))
}

pub fn load_settings() -> ClientSettings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then the optional settings file, then environment overrides.
pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<HashMap<String, toml::Value>>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.get("server_url").and_then(toml::Value::as_str) {
                    settings.server_url = v.to_string();
                }
                if let Some(v) = file_cfg.get("event_buffer").and_then(as_count) {
                    settings.event_buffer = v;
                }
                if let Some(v) = file_cfg.get("feed_queue").and_then(as_count) {
                    settings.feed_queue = v;
                }
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "ignoring unreadable settings file");
            }
        }
    }

    if let Some(v) = env("DASHBOARD_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = env("APP__SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = env("APP__EVENT_BUFFER").and_then(|v| v.parse().ok()) {
        settings.event_buffer = v;
    }
    if let Some(v) = env("APP__FEED_QUEUE").and_then(|v| v.parse().ok()) {
        settings.feed_queue = v;
    }

    settings.event_buffer = settings.event_buffer.max(1);
    settings.feed_queue = settings.feed_queue.max(1);
    settings
}

fn as_count(value: &toml::Value) -> Option<usize> {
    match value {
        toml::Value::Integer(v) => usize::try_from(*v).ok(),
        toml::Value::String(v) => v.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
