use super::*;

use std::{
    env,
    time::{SystemTime, UNIX_EPOCH},
};

fn temp_settings_file(contents: &str) -> std::path::PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let path = env::temp_dir().join(format!("dashboard_settings_test_{suffix}.toml"));
    fs::write(&path, contents).expect("write settings");
    path
}

#[test]
fn defaults_apply_without_file_or_env() {
    let settings = load_settings_from(Path::new("/nonexistent/dashboard.toml"), |_| None);
    assert_eq!(settings.server_url, "http://127.0.0.1:8000");
    assert_eq!(settings.event_buffer, 256);
}

#[test]
fn file_values_are_overridden_by_env() {
    let path = temp_settings_file(
        "server_url = \"http://file.example:9000\"\nevent_buffer = 32\nfeed_queue = \"8\"\n",
    );

    let from_file = load_settings_from(&path, |_| None);
    assert_eq!(from_file.server_url, "http://file.example:9000");
    assert_eq!(from_file.event_buffer, 32);
    assert_eq!(from_file.feed_queue, 8);

    let with_env = load_settings_from(&path, |key| match key {
        "APP__SERVER_URL" => Some("https://env.example".to_string()),
        "APP__EVENT_BUFFER" => Some("0".to_string()),
        _ => None,
    });
    assert_eq!(with_env.server_url, "https://env.example");
    assert_eq!(with_env.event_buffer, 1);

    fs::remove_file(path).expect("cleanup");
}

#[test]
fn unreadable_settings_file_falls_back_to_defaults() {
    let path = temp_settings_file("server_url = [not toml");
    let settings = load_settings_from(&path, |_| None);
    assert_eq!(settings.server_url, ClientSettings::default().server_url);
    fs::remove_file(path).expect("cleanup");
}

#[test]
fn status_feed_url_follows_server_scheme() {
    assert_eq!(
        status_feed_url("http://localhost:8000/").expect("ws"),
        "ws://localhost:8000/api/v1/ws/status"
    );
    assert_eq!(
        status_feed_url("https://dash.example").expect("wss"),
        "wss://dash.example/api/v1/ws/status"
    );
    assert!(status_feed_url("ftp://dash.example").is_err());
}

#[test]
fn api_base_rejects_non_http_urls() {
    let settings = ClientSettings {
        server_url: "localhost:8000".to_string(),
        ..ClientSettings::default()
    };
    assert!(settings.api_base().is_err());

    let settings = ClientSettings {
        server_url: "http://localhost:8000/".to_string(),
        ..ClientSettings::default()
    };
    assert_eq!(settings.api_base().expect("base"), "http://localhost:8000");
}
