use super::{load_settings_from, parse_origins, Settings, DEFAULT_MAX_BODY_BYTES};

use std::{
    collections::HashMap,
    env, fs,
    path::Path,
    time::{SystemTime, UNIX_EPOCH},
};

fn no_env(_: &str) -> Option<String> {
    None
}

fn temp_config(name: &str, contents: &str) -> std::path::PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = env::temp_dir().join(format!("sheet_chat_server_config_{name}_{suffix}"));
    fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("server.toml");
    fs::write(&path, contents).expect("write config");
    path
}

#[test]
fn missing_config_file_yields_defaults() {
    let settings = load_settings_from(Path::new("/nonexistent/server.toml"), no_env);
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.server_bind, "127.0.0.1:5000");
    assert_eq!(settings.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
    assert!(settings.allowed_origins.is_empty());
}

#[test]
fn file_values_are_applied() {
    let path = temp_config(
        "file",
        r#"
bind_addr = "0.0.0.0:8080"
max_body_bytes = 2048
allowed_origins = ["http://localhost:5173", "https://sheets.example.com/"]
"#,
    );

    let settings = load_settings_from(&path, no_env);
    assert_eq!(settings.server_bind, "0.0.0.0:8080");
    assert_eq!(settings.max_body_bytes, 2048);
    assert_eq!(
        settings.allowed_origins,
        vec!["http://localhost:5173", "https://sheets.example.com"]
    );

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn environment_overrides_file() {
    let path = temp_config("env", "bind_addr = \"0.0.0.0:8080\"\nmax_body_bytes = 2048\n");
    let vars: HashMap<&str, &str> = HashMap::from([
        ("APP__BIND_ADDR", "127.0.0.1:9000"),
        ("APP__MAX_BODY_BYTES", "4096"),
        ("APP__ALLOWED_ORIGINS", "http://a.test, http://b.test/"),
    ]);

    let settings = load_settings_from(&path, |key| vars.get(key).map(|v| v.to_string()));
    assert_eq!(settings.server_bind, "127.0.0.1:9000");
    assert_eq!(settings.max_body_bytes, 4096);
    assert_eq!(settings.allowed_origins, vec!["http://a.test", "http://b.test"]);

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn invalid_values_keep_previous_settings() {
    let path = temp_config("invalid", "max_body_bytes = \"lots\"\n");
    let settings = load_settings_from(&path, |key| {
        (key == "APP__MAX_BODY_BYTES").then(|| "zero".to_string())
    });
    assert_eq!(settings.max_body_bytes, DEFAULT_MAX_BODY_BYTES);

    fs::remove_dir_all(path.parent().expect("parent")).expect("cleanup");
}

#[test]
fn wildcard_origin_means_any() {
    assert!(parse_origins("http://a.test, *").is_empty());
    assert_eq!(parse_origins(" http://a.test ,, "), vec!["http://a.test"]);
}
