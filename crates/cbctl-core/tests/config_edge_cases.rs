use std::fs;
use std::path::PathBuf;

use cbctl_core::AdminError;
use cbctl_core::config::{Config, ConfigError, Profile};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Missing and empty files
// ---------------------------------------------------------------------------

#[test]
fn load_from_nonexistent_path_returns_default_config() {
    let path = PathBuf::from("/tmp/cbctl-test-nonexistent/does/not/exist/config.toml");
    assert!(!path.exists());

    let config = Config::load_from_path(&path).expect("missing file is an empty config");

    assert!(config.profiles.is_empty());
    assert!(config.default_profile.is_none());
}

#[test]
fn load_empty_config_file_returns_default_config() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "").unwrap();

    let config = Config::load_from_path(&config_path).expect("empty file should parse as default");

    assert!(config.profiles.is_empty());
    assert!(config.default_profile.is_none());
}

// ---------------------------------------------------------------------------
// Invalid content
// ---------------------------------------------------------------------------

#[test]
fn load_corrupt_toml_returns_parse_error() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "[[[broken").unwrap();

    let err = Config::load_from_path(&config_path).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));
    assert!(err.to_string().contains("parse"), "{err}");
}

#[test]
fn load_wrong_port_type_returns_parse_error() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
[profiles.local]
host = "127.0.0.1"
port = "eighty-ninety-one"
"#,
    )
    .unwrap();

    assert!(matches!(
        Config::load_from_path(&config_path),
        Err(ConfigError::ParseError(_))
    ));
}

#[test]
fn config_error_converts_into_admin_error() {
    let err: AdminError = ConfigError::ProfileNotFound {
        name: "prod".to_string(),
    }
    .into();
    assert!(matches!(err, AdminError::Config(_)));
    assert!(err.to_string().contains("prod"));
}

// ---------------------------------------------------------------------------
// Save / load round trip
// ---------------------------------------------------------------------------

#[test]
fn save_creates_parent_directories_and_round_trips() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("nested").join("cbctl").join("config.toml");

    let mut config = Config::default();
    config.set_profile(
        "prod".to_string(),
        Profile {
            connection_string: Some("couchbases://db1.example.com/travel-sample".to_string()),
            username: "ops".to_string(),
            password: Some("keyring:prod-password".to_string()),
            timeout_secs: Some(30),
            ..Profile::default()
        },
    );
    config.default_profile = Some("prod".to_string());
    config.save_to_path(&config_path).unwrap();

    let loaded = Config::load_from_path(&config_path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.resolve_profile(None).unwrap(), "prod");
}

#[test]
#[serial_test::serial]
fn env_references_expand_on_load() {
    unsafe {
        std::env::set_var("CBCTL_EDGE_HOST", "10.20.30.40");
        std::env::remove_var("CBCTL_EDGE_PASSWORD");
    }

    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
[profiles.local]
host = "${CBCTL_EDGE_HOST}"
password = "${CBCTL_EDGE_PASSWORD:-password}"
"#,
    )
    .unwrap();

    let config = Config::load_from_path(&config_path).unwrap();
    let profile = &config.profiles["local"];
    assert_eq!(profile.host.as_deref(), Some("10.20.30.40"));
    assert_eq!(profile.password.as_deref(), Some("password"));

    unsafe {
        std::env::remove_var("CBCTL_EDGE_HOST");
    }
}

// ---------------------------------------------------------------------------
// Permissions
// ---------------------------------------------------------------------------

#[cfg(unix)]
fn is_root() -> bool {
    std::process::Command::new("id")
        .arg("-u")
        .output()
        .ok()
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim() == "0")
        .unwrap_or(false)
}

#[cfg(unix)]
#[test]
fn unreadable_config_returns_load_error() {
    use std::os::unix::fs::PermissionsExt;

    if is_root() {
        return;
    }

    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "default_profile = \"local\"").unwrap();
    fs::set_permissions(&config_path, fs::Permissions::from_mode(0o000)).unwrap();

    let result = Config::load_from_path(&config_path);
    fs::set_permissions(&config_path, fs::Permissions::from_mode(0o644)).unwrap();

    assert!(matches!(result, Err(ConfigError::LoadError { .. })));
}
