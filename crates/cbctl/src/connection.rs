//! Connection management for the admin client

use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use cbctl_core::AdminClient;
use cbctl_core::config::{Config, ConfigError, PASSWORD_ENV, ResolvedProfile, USERNAME_ENV};
use tracing::{debug, info, trace};

use crate::cli::ConnectionArgs;
use crate::error::{CbctlError, Result as CliResult};

/// Environment variable naming the cluster
pub const CONNECTION_STRING_ENV: &str = "CBCTL_CONNECTION_STRING";

const DEFAULT_USERNAME: &str = "Administrator";

/// Where and as whom to connect, after flags, environment and profile have
/// been merged
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub profile: Option<String>,
    pub connection_string: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub bucket: Option<String>,
    pub username: String,
    pub password: Option<String>,
    pub tls: bool,
    pub timeout: Option<Duration>,
}

impl std::fmt::Debug for ConnectionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionTarget")
            .field("profile", &self.profile)
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

impl ConnectionTarget {
    /// Short description for log lines and prompts
    pub fn describe(&self) -> String {
        match (&self.connection_string, &self.host) {
            (Some(connstr), _) => connstr.clone(),
            (None, Some(host)) => match self.port {
                Some(port) => format!("{}:{}", host, port),
                None => host.clone(),
            },
            (None, None) => "localhost".to_string(),
        }
    }
}

/// Connection manager for creating authenticated clients
#[derive(Clone)]
pub struct ConnectionManager {
    pub config: Config,
    pub config_path: Option<PathBuf>,
}

impl ConnectionManager {
    /// Create a new connection manager with a custom config path
    pub fn with_config_path(config: Config, config_path: Option<PathBuf>) -> Self {
        Self {
            config,
            config_path,
        }
    }

    /// Save the configuration to the appropriate location
    pub fn save_config(&self, config: &Config) -> CliResult<()> {
        if let Some(ref path) = self.config_path {
            config
                .save_to_path(path)
                .context("Failed to save configuration")?;
        } else {
            config.save().context("Failed to save configuration")?;
        }
        Ok(())
    }

    /// Merge flags, environment and profile into one target.
    ///
    /// Precedence is flags, then `CBCTL_*` environment variables, then the
    /// profile, then defaults. When `--config-file` is given explicitly the
    /// environment is ignored so the file fully describes the connection.
    pub fn resolve_target(
        &self,
        profile_name: Option<&str>,
        args: &ConnectionArgs,
    ) -> CliResult<ConnectionTarget> {
        let use_env_vars = self.config_path.is_none();
        debug!(
            "Config path: {:?}, use_env_vars: {}",
            self.config_path, use_env_vars
        );
        if !use_env_vars {
            info!("--config-file specified explicitly, ignoring environment variables");
        }

        let env = |name: &str| {
            if use_env_vars {
                std::env::var(name).ok().filter(|v| !v.is_empty())
            } else {
                None
            }
        };

        let env_connstr = env(CONNECTION_STRING_ENV);
        let cluster_named = args.names_cluster() || env_connstr.is_some();
        let (profile, resolved) =
            self.resolve_profile(profile_name, use_env_vars, cluster_named)?;
        if let Some(ref name) = profile {
            info!("Using profile: {}", name);
        }

        let mut target = ConnectionTarget {
            profile,
            connection_string: None,
            host: None,
            port: None,
            bucket: None,
            username: args
                .username
                .clone()
                .or_else(|| env(USERNAME_ENV))
                .or_else(|| resolved.as_ref().map(|p| p.username.clone()))
                .unwrap_or_else(|| DEFAULT_USERNAME.to_string()),
            password: args
                .password
                .clone()
                .or_else(|| env(PASSWORD_ENV))
                .or_else(|| resolved.as_ref().and_then(|p| p.password.clone())),
            tls: args.tls || resolved.as_ref().is_some_and(|p| p.tls),
            timeout: args
                .request_timeout
                .map(Duration::from_secs)
                .or_else(|| resolved.as_ref().and_then(|p| p.timeout)),
        };

        if args.names_cluster() {
            debug!("Cluster taken from command-line flags");
            target.connection_string = args.connection_string.clone();
            target.host = args.host.clone();
            target.port = args.port;
        } else if let Some(connstr) = env_connstr {
            debug!("Found {} environment variable", CONNECTION_STRING_ENV);
            target.connection_string = Some(connstr);
        } else if let Some(profile) = resolved {
            target.connection_string = profile.connection_string;
            target.host = profile.host;
            target.port = profile.port;
            target.bucket = profile.bucket;
        }

        trace!("Resolved connection target: {:?}", target);
        Ok(target)
    }

    fn resolve_profile(
        &self,
        profile_name: Option<&str>,
        use_env_vars: bool,
        cluster_named: bool,
    ) -> CliResult<(Option<String>, Option<ResolvedProfile>)> {
        let name = match self.config.resolve_profile(profile_name) {
            Ok(name) => name,
            Err(ConfigError::NoProfiles { .. })
                if profile_name.is_none()
                    && (self.config.profiles.is_empty() || cluster_named) =>
            {
                debug!("No profile selected, using flags and defaults");
                return Ok((None, None));
            }
            Err(e) => return Err(e.into()),
        };
        let profile = self
            .config
            .profiles
            .get(&name)
            .ok_or_else(|| CbctlError::ProfileNotFound { name: name.clone() })?;
        let resolved = profile.resolve_with_env(&name, use_env_vars)?;
        Ok((Some(name), Some(resolved)))
    }

    /// Connect an admin client, prompting for a missing password when stdin
    /// is a terminal
    pub async fn create_admin_client(
        &self,
        profile_name: Option<&str>,
        args: &ConnectionArgs,
    ) -> CliResult<AdminClient> {
        debug!("Creating admin client");
        let target = self.resolve_target(profile_name, args)?;

        let password = match target.password.clone() {
            Some(password) => password,
            None if std::io::stdin().is_terminal() => rpassword::prompt_password(format!(
                "Password for {}@{}: ",
                target.username,
                target.describe()
            ))
            .context("Failed to read password")?,
            None => {
                return Err(CbctlError::MissingCredentials {
                    target: target.describe(),
                });
            }
        };

        let mut builder = AdminClient::builder()
            .credentials(target.username.clone(), password)
            .tls(target.tls);
        if let Some(connstr) = target.connection_string {
            builder = builder.connection_string(connstr);
        }
        if let Some(host) = target.host {
            builder = builder.host(host);
        }
        if let Some(port) = target.port {
            builder = builder.port(port);
        }
        if let Some(bucket) = target.bucket {
            builder = builder.bucket(bucket);
        }
        if let Some(timeout) = target.timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.connect().await?;
        info!("Connected to {}", client.endpoint());
        Ok(client)
    }
}
