//! Error taxonomy for cluster administration
//!
//! Every public operation in this crate returns [`Result`]. The variants map
//! one-to-one onto the failure kinds a caller needs to tell apart: bad input,
//! rejected credentials, an unreachable cluster, a non-success HTTP status,
//! a readiness deadline, and operations the session cannot perform.
//!
//! # Example
//!
//! ```rust
//! use cbctl_core::{AdminError, HttpResult};
//!
//! fn describe(err: &AdminError) -> &'static str {
//!     if err.is_not_found() {
//!         "missing"
//!     } else if err.is_retryable() {
//!         "try again later"
//!     } else {
//!         "fatal"
//!     }
//! }
//!
//! let err = AdminError::Http(Box::new(HttpResult::from_body("/badpath", 404, "")));
//! assert_eq!(describe(&err), "missing");
//! ```

use std::time::Duration;
use thiserror::Error;

use crate::config::ConfigError;
use crate::result::HttpResult;

/// Errors returned by the admin client and its collaborators
#[derive(Error, Debug)]
pub enum AdminError {
    /// Caller-supplied input is structurally invalid. Raised before any I/O.
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// The cluster rejected the supplied credentials (handshake, 401 or 403)
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    /// The transport could not obtain an HTTP response
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// The cluster answered a well-formed request with a non-success status
    #[error("HTTP {} for '{}': {}", .0.http_status(), .0.url(), .0.body_text())]
    Http(Box<HttpResult>),

    /// A bucket did not become ready before the caller's deadline
    #[error("Bucket '{bucket}' not ready after {timeout:?}{}", last_error_suffix(.last_error))]
    Timeout {
        bucket: String,
        timeout: Duration,
        last_error: Option<String>,
    },

    /// The operation is not available on this session type
    #[error("Operation '{operation}' is not supported on an administrative session")]
    Unsupported { operation: &'static str },

    /// A response arrived but its body could not be read or did not have
    /// the expected shape
    #[error("Unexpected response from '{url}': {source}")]
    Decode {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Profile configuration could not be loaded or resolved
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

fn last_error_suffix(last_error: &Option<String>) -> String {
    last_error
        .as_ref()
        .map(|e| format!(" (last: {e})"))
        .unwrap_or_default()
}

/// Result type alias for admin operations
pub type Result<T> = std::result::Result<T, AdminError>;

impl AdminError {
    /// Shorthand for building an [`AdminError::Argument`]
    pub(crate) fn argument(message: impl Into<String>) -> Self {
        AdminError::Argument(message.into())
    }

    /// Returns the HTTP result carried by an [`AdminError::Http`]
    #[must_use]
    pub fn http_result(&self) -> Option<&HttpResult> {
        match self {
            AdminError::Http(result) => Some(result),
            _ => None,
        }
    }

    /// Returns the HTTP status code, if the failure produced one
    #[must_use]
    pub fn http_status(&self) -> Option<u16> {
        self.http_result().map(HttpResult::http_status)
    }

    /// Returns true if the caller supplied invalid input
    #[must_use]
    pub fn is_argument(&self) -> bool {
        matches!(self, AdminError::Argument(_))
    }

    /// Returns true if this is an authentication/authorization error
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, AdminError::Auth { .. })
    }

    /// Returns true if no HTTP response was obtained
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, AdminError::Network { .. })
    }

    /// Returns true if the cluster returned a non-success status
    #[must_use]
    pub fn is_http(&self) -> bool {
        matches!(self, AdminError::Http(_))
    }

    /// Returns true if this is a "not found" error (404)
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.http_status() == Some(404)
    }

    /// Returns true if this is a timeout, at the transport or readiness level
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            AdminError::Timeout { .. } => true,
            AdminError::Network {
                source: Some(err), ..
            } => err.is_timeout(),
            _ => false,
        }
    }

    /// Returns true if the operation cannot run on this session type
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, AdminError::Unsupported { .. })
    }

    /// Returns true if a later attempt might succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            AdminError::Network { .. } | AdminError::Timeout { .. } => true,
            AdminError::Http(result) => {
                result.http_status() == 429 || result.http_status() >= 500
            }
            _ => false,
        }
    }
}
