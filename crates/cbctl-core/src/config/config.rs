//! Configuration file handling
//!
//! Configuration is stored in TOML format with multiple named profiles:
//!
//! ```toml
//! default_profile = "local"
//!
//! [profiles.local]
//! host = "127.0.0.1"
//! port = 8091
//! username = "Administrator"
//! password = "${CB_PASSWORD:-password}"
//!
//! [profiles.prod]
//! connection_string = "couchbases://db1.example.com,db2.example.com"
//! username = "ops"
//! password = "keyring:prod-password"
//! timeout_secs = 30
//! ```

#[cfg(target_os = "macos")]
use directories::BaseDirs;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::credential::CredentialStore;
use super::error::{ConfigError, Result};

/// Environment variable overriding the profile username
pub const USERNAME_ENV: &str = "CBCTL_USERNAME";

/// Environment variable overriding the profile password
pub const PASSWORD_ENV: &str = "CBCTL_PASSWORD";

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Profile used when none is named on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
    /// Map of profile name -> profile configuration
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

/// A named cluster connection
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Connection string; mutually exclusive with `host`/`port`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(default = "default_username")]
    pub username: String,
    /// Optional for interactive prompting. Supports `keyring:` references.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub tls: bool,
    /// Per-request timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            connection_string: None,
            host: None,
            port: None,
            bucket: None,
            username: default_username(),
            password: None,
            tls: false,
            timeout_secs: None,
        }
    }
}

fn default_username() -> String {
    "Administrator".to_string()
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A profile with its credentials resolved
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedProfile {
    pub connection_string: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub bucket: Option<String>,
    pub username: String,
    pub password: Option<String>,
    pub tls: bool,
    pub timeout: Option<Duration>,
}

impl std::fmt::Debug for ResolvedProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedProfile")
            .field("connection_string", &self.connection_string)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("bucket", &self.bucket)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<REDACTED>"))
            .field("tls", &self.tls)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Profile {
    /// Check if this profile has a stored password
    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }

    /// Human-readable target, for listings
    pub fn target(&self) -> String {
        match (&self.connection_string, &self.host) {
            (Some(connstr), _) => connstr.clone(),
            (None, Some(host)) => match self.port {
                Some(port) => format!("{}:{}", host, port),
                None => host.clone(),
            },
            (None, None) => "localhost".to_string(),
        }
    }

    /// Reject profiles that name a cluster twice
    pub fn validate(&self, name: &str) -> Result<()> {
        if self.connection_string.is_some() && (self.host.is_some() || self.port.is_some()) {
            return Err(ConfigError::InvalidProfile {
                name: name.to_string(),
                reason: "set either connection_string or host/port, not both".to_string(),
            });
        }
        if self.username.trim().is_empty() {
            return Err(ConfigError::InvalidProfile {
                name: name.to_string(),
                reason: "username must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Resolve credentials (keyring references, env overrides)
    pub fn resolve(&self, name: &str) -> Result<ResolvedProfile> {
        self.resolve_with_env(name, true)
    }

    /// Resolve credentials, consulting [`USERNAME_ENV`] and [`PASSWORD_ENV`]
    /// only when `use_env` is set
    pub fn resolve_with_env(&self, name: &str, use_env: bool) -> Result<ResolvedProfile> {
        self.validate(name)?;
        let store = CredentialStore::new();
        let (username_env, password_env) = if use_env {
            (Some(USERNAME_ENV), Some(PASSWORD_ENV))
        } else {
            (None, None)
        };

        let username = store
            .get_credential(&self.username, username_env)
            .map_err(|e| {
                ConfigError::CredentialError(format!("Failed to resolve username: {}", e))
            })?;
        let password = self
            .password
            .as_ref()
            .map(|p| {
                store.get_credential(p, password_env).map_err(|e| {
                    ConfigError::CredentialError(format!("Failed to resolve password: {}", e))
                })
            })
            .transpose()?;

        Ok(ResolvedProfile {
            connection_string: self.connection_string.clone(),
            host: self.host.clone(),
            port: self.port,
            bucket: self.bucket.clone(),
            username,
            password,
            tls: self.tls,
            timeout: self.timeout_secs.map(Duration::from_secs),
        })
    }
}

impl Config {
    /// Pick the profile to use: explicit name, then the default, then the
    /// only profile if exactly one exists
    pub fn resolve_profile(&self, explicit_profile: Option<&str>) -> Result<String> {
        if let Some(name) = explicit_profile {
            return if self.profiles.contains_key(name) {
                Ok(name.to_string())
            } else {
                Err(ConfigError::ProfileNotFound {
                    name: name.to_string(),
                })
            };
        }

        if let Some(default) = &self.default_profile {
            return if self.profiles.contains_key(default) {
                Ok(default.clone())
            } else {
                Err(ConfigError::ProfileNotFound {
                    name: default.clone(),
                })
            };
        }

        match self.profiles.len() {
            0 => Err(ConfigError::NoProfiles {
                suggestion: "Use 'cbctl profile set' to create a profile.".to_string(),
            }),
            1 => Ok(self
                .profiles
                .keys()
                .next()
                .cloned()
                .unwrap_or_default()),
            _ => {
                let names: Vec<&str> = self
                    .list_profiles()
                    .into_iter()
                    .map(|(n, _)| n.as_str())
                    .collect();
                Err(ConfigError::NoProfiles {
                    suggestion: format!(
                        "Several profiles exist ({}); pick one with --profile or 'cbctl profile default <name>'.",
                        names.join(", ")
                    ),
                })
            }
        }
    }

    /// Load configuration from the standard location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path. A missing file is an empty config.
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::LoadError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        let expanded_content = Self::expand_env_vars(&content);
        let config: Config = toml::from_str(&expanded_content)?;

        Ok(config)
    }

    /// Save configuration to the standard location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to_path(&config_path)
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::SaveError {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self)?;

        fs::write(config_path, content).map_err(|e| ConfigError::SaveError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        Ok(())
    }

    /// Set or update a profile
    pub fn set_profile(&mut self, name: String, profile: Profile) {
        self.profiles.insert(name, profile);
    }

    /// Remove a profile by name, clearing the default if it pointed there
    pub fn remove_profile(&mut self, name: &str) -> Option<Profile> {
        if self.default_profile.as_deref() == Some(name) {
            self.default_profile = None;
        }
        self.profiles.remove(name)
    }

    /// List all profiles sorted by name
    pub fn list_profiles(&self) -> Vec<(&String, &Profile)> {
        let mut profiles: Vec<_> = self.profiles.iter().collect();
        profiles.sort_by_key(|(name, _)| *name);
        profiles
    }

    /// Get the path to the configuration file
    ///
    /// On Linux: ~/.config/cbctl/config.toml
    /// On macOS: ~/.config/cbctl/config.toml when that directory exists,
    /// otherwise ~/Library/Application Support/com.cbctl.cbctl/config.toml
    /// On Windows: %APPDATA%\cbctl\cbctl\config\config.toml
    pub fn config_path() -> Result<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            if let Some(base_dirs) = BaseDirs::new() {
                let linux_style_dir = base_dirs.home_dir().join(".config").join("cbctl");
                if linux_style_dir.exists() {
                    return Ok(linux_style_dir.join("config.toml"));
                }
            }
        }

        let proj_dirs =
            ProjectDirs::from("com", "cbctl", "cbctl").ok_or(ConfigError::ConfigDirError)?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Expand `${VAR}` and `${VAR:-default}` references.
    ///
    /// Unset variables without a default are left as written so profiles that
    /// are not in use never fail to load.
    fn expand_env_vars(content: &str) -> String {
        shellexpand::env_with_context_no_errors(content, |var| std::env::var(var).ok())
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn local_profile() -> Profile {
        Profile {
            host: Some("127.0.0.1".to_string()),
            port: Some(8091),
            password: Some("password".to_string()),
            ..Profile::default()
        }
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        config.set_profile("local".to_string(), local_profile());
        config.default_profile = Some("local".to_string());

        let serialized = toml::to_string_pretty(&config).unwrap();
        assert!(serialized.contains("default_profile = \"local\""));
        assert!(serialized.contains("[profiles.local]"));
        assert!(!serialized.contains("tls"));

        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_profile_defaults() {
        let config: Config = toml::from_str(
            r#"
[profiles.minimal]
connection_string = "couchbase://db1"
"#,
        )
        .unwrap();
        let profile = &config.profiles["minimal"];
        assert_eq!(profile.username, "Administrator");
        assert!(!profile.has_password());
        assert!(!profile.tls);
        assert_eq!(profile.target(), "couchbase://db1");
    }

    #[test]
    #[serial_test::serial]
    fn test_env_var_expansion() {
        unsafe {
            std::env::set_var("CBCTL_TEST_HOST", "10.0.0.9");
            std::env::remove_var("CBCTL_TEST_UNSET");
        }

        let content = r#"
[profiles.test]
host = "${CBCTL_TEST_HOST}"
password = "${CBCTL_TEST_UNSET:-fallback}"
bucket = "${CBCTL_TEST_UNSET}"
"#;
        let expanded = Config::expand_env_vars(content);
        assert!(expanded.contains("10.0.0.9"));
        assert!(expanded.contains("fallback"));
        assert!(expanded.contains("${CBCTL_TEST_UNSET}"));

        unsafe {
            std::env::remove_var("CBCTL_TEST_HOST");
        }
    }

    #[test]
    fn test_profile_resolution_order() {
        let mut config = Config::default();
        assert!(matches!(
            config.resolve_profile(None),
            Err(ConfigError::NoProfiles { .. })
        ));

        config.set_profile("local".to_string(), local_profile());
        assert_eq!(config.resolve_profile(None).unwrap(), "local");

        config.set_profile("prod".to_string(), Profile::default());
        assert!(matches!(
            config.resolve_profile(None),
            Err(ConfigError::NoProfiles { .. })
        ));

        config.default_profile = Some("prod".to_string());
        assert_eq!(config.resolve_profile(None).unwrap(), "prod");
        assert_eq!(config.resolve_profile(Some("local")).unwrap(), "local");
        assert!(matches!(
            config.resolve_profile(Some("missing")),
            Err(ConfigError::ProfileNotFound { .. })
        ));
    }

    #[test]
    fn test_remove_default_profile_clears_default() {
        let mut config = Config::default();
        config.set_profile("local".to_string(), local_profile());
        config.default_profile = Some("local".to_string());

        assert!(config.remove_profile("local").is_some());
        assert_eq!(config.default_profile, None);
        assert!(config.remove_profile("local").is_none());
    }

    #[test]
    fn test_conflicting_target_is_invalid() {
        let profile = Profile {
            connection_string: Some("http://10.0.0.1:8091".to_string()),
            host: Some("10.0.0.2".to_string()),
            ..Profile::default()
        };
        assert!(matches!(
            profile.resolve("broken"),
            Err(ConfigError::InvalidProfile { .. })
        ));
    }

    #[test]
    #[serial_test::serial]
    fn test_resolve_applies_env_overrides() {
        unsafe {
            std::env::set_var(PASSWORD_ENV, "from-env");
            std::env::remove_var(USERNAME_ENV);
        }

        let resolved = local_profile().resolve("local").unwrap();
        assert_eq!(resolved.username, "Administrator");
        assert_eq!(resolved.password.as_deref(), Some("from-env"));
        assert!(!format!("{:?}", resolved).contains("from-env"));

        let isolated = local_profile().resolve_with_env("local", false).unwrap();
        assert_ne!(isolated.password.as_deref(), Some("from-env"));

        unsafe {
            std::env::remove_var(PASSWORD_ENV);
        }
    }
}
