//! Error types for cbctl
//!
//! Library failures are folded into [`CbctlError`] so `main` can print one
//! cargo-style diagnostic with suggestions for each kind.

use cbctl_core::AdminError;
use cbctl_core::config::ConfigError;
use colored::Colorize;
use thiserror::Error;

/// Cargo-style diagnostic formatter for CLI errors.
///
/// Produces structured output like:
/// ```text
/// error: Profile 'prod' not found
///
///   tip: list available profiles:
///       cbctl profile list
/// ```
pub struct CliDiagnostic {
    message: String,
    detail: Option<String>,
    tips: Vec<(String, Vec<String>)>,
}

impl CliDiagnostic {
    /// Start a new error diagnostic with the given message.
    pub fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            detail: None,
            tips: Vec::new(),
        }
    }

    /// Add a detail line below the error message.
    pub fn detail(mut self, text: &str) -> Self {
        self.detail = Some(text.to_string());
        self
    }

    /// Add a tip with optional example commands.
    pub fn tip(mut self, description: &str, commands: &[&str]) -> Self {
        self.tips.push((
            description.to_string(),
            commands.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    /// Print the diagnostic to stderr with colored formatting.
    pub fn print(&self) {
        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);

        if let Some(detail) = &self.detail {
            eprintln!("  {}", detail);
        }

        for (description, commands) in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{}", description);
            for cmd in commands {
                eprintln!("      {}", cmd);
            }
        }
    }
}

/// Main error type for the cbctl application
#[derive(Error, Debug)]
pub enum CbctlError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("No profile selected. {suggestion}")]
    NoProfileConfigured { suggestion: String },

    #[error("No password available for {target}")]
    MissingCredentials { target: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    #[error("{message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Timeout: {message}")]
    Timeout { message: String },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    #[error("File error for '{path}': {message}")]
    FileError { path: String, message: String },

    #[error("Output formatting error: {message}")]
    OutputError { message: String },
}

/// Result type for cbctl operations
pub type Result<T> = std::result::Result<T, CbctlError>;

impl CbctlError {
    /// Get helpful suggestions for resolving this error
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            CbctlError::ProfileNotFound { name } => vec![
                "List available profiles: cbctl profile list".to_string(),
                format!("Create profile '{}': cbctl profile set {} --host <host>", name, name),
            ],
            CbctlError::NoProfileConfigured { .. } => vec![
                "List profiles: cbctl profile list".to_string(),
                "Pick a default: cbctl profile default <name>".to_string(),
                "Or pass a cluster directly: cbctl --connection-string couchbase://127.0.0.1 ..."
                    .to_string(),
            ],
            CbctlError::MissingCredentials { .. } => vec![
                "Pass --password or set CBCTL_PASSWORD".to_string(),
                "Store it in the profile: cbctl profile set <name> --password <password>".to_string(),
            ],
            CbctlError::AuthenticationFailed { .. } => vec![
                "Check your credentials: cbctl profile show <profile>".to_string(),
                "Override them for one run with CBCTL_USERNAME / CBCTL_PASSWORD".to_string(),
            ],
            CbctlError::ConnectionError { message }
                if message.contains("certificate") || message.contains("tls") =>
            {
                vec![
                    "Check that the cluster serves TLS on the management port (18091)".to_string(),
                    "Use a couchbase:// connection string for a plaintext cluster".to_string(),
                ]
            }
            CbctlError::ConnectionError { .. } => vec![
                "Check network connectivity".to_string(),
                "Verify the host and port: cbctl profile show <profile>".to_string(),
                "Parse the connection string: cbctl connstr <string>".to_string(),
            ],
            CbctlError::ApiError { status: 404, .. } => vec![
                "Verify the bucket or user name is correct".to_string(),
                "List what exists: cbctl bucket list / cbctl user list".to_string(),
            ],
            CbctlError::Timeout { .. } => vec![
                "Raise the deadline with --timeout".to_string(),
                "Inspect node status: cbctl bucket info <name>".to_string(),
            ],
            CbctlError::InvalidInput { .. } => vec![
                "Check the command syntax: cbctl <command> --help".to_string(),
            ],
            CbctlError::FileError { path, .. } => vec![
                format!("Check that file exists: {}", path),
                "Verify file permissions are correct".to_string(),
            ],
            _ => vec![],
        }
    }

    /// Print a cargo-style diagnostic to stderr using colored formatting.
    pub fn print_diagnostic(&self) {
        let mut diag = CliDiagnostic::error(&format!("{}", self));

        for suggestion in self.suggestions() {
            diag = diag.tip(&suggestion, &[]);
        }

        diag.print();
    }
}

impl From<AdminError> for CbctlError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::Argument(message) => CbctlError::InvalidInput { message },
            AdminError::Auth { message } => CbctlError::AuthenticationFailed { message },
            AdminError::Network { message, .. } => CbctlError::ConnectionError { message },
            AdminError::Timeout { .. } => CbctlError::Timeout {
                message: err.to_string(),
            },
            AdminError::Unsupported { .. } => CbctlError::Unsupported {
                message: err.to_string(),
            },
            AdminError::Config(config_err) => CbctlError::from(config_err),
            AdminError::Http(ref result) => CbctlError::ApiError {
                status: result.http_status(),
                message: err.to_string(),
            },
            AdminError::Decode { .. } => CbctlError::OutputError {
                message: err.to_string(),
            },
        }
    }
}

impl From<ConfigError> for CbctlError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ProfileNotFound { name } => CbctlError::ProfileNotFound { name },
            ConfigError::NoProfiles { suggestion } => CbctlError::NoProfileConfigured { suggestion },
            other => CbctlError::Config(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for CbctlError {
    fn from(err: serde_json::Error) -> Self {
        CbctlError::OutputError {
            message: format!("JSON error: {}", err),
        }
    }
}

impl From<std::io::Error> for CbctlError {
    fn from(err: std::io::Error) -> Self {
        CbctlError::OutputError {
            message: format!("IO error: {}", err),
        }
    }
}

impl From<anyhow::Error> for CbctlError {
    fn from(err: anyhow::Error) -> Self {
        CbctlError::Config(format!("{:#}", err))
    }
}
