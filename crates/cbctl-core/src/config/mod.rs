//! Connection profiles for cbctl
//!
//! Profiles are stored in a TOML file and name a cluster (connection string
//! or host/port), the administrator account, and optional transport settings.
//!
//! # Features
//!
//! - Multiple named profiles with a default
//! - `${VAR}` and `${VAR:-default}` expansion in the config file
//! - Credentials stored in the OS keyring (`secure-storage` feature)
//! - Platform-specific config file locations

#[allow(clippy::module_inception)]
pub mod config;
pub mod credential;
pub mod error;

pub use config::{Config, PASSWORD_ENV, Profile, ResolvedProfile, USERNAME_ENV};
pub use credential::{CredentialStorage, CredentialStore};
pub use error::{ConfigError, Result};
