//! Management API path construction
//!
//! Pure functions; identical inputs always produce identical paths.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AdminError, Result};

/// Cluster information endpoint, also used for the connection handshake
pub const POOLS_PATH: &str = "/pools";

/// Collection endpoint for bucket management
pub const BUCKETS_PATH: &str = "/pools/default/buckets";

/// Collection endpoint for RBAC user management
pub const USERS_PATH: &str = "/settings/rbac/users";

/// Namespace a user identity lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AuthDomain {
    /// Users defined on the cluster itself
    Local,
    /// Users authenticated by an external directory (LDAP, PAM, ...)
    External,
}

impl AuthDomain {
    /// Lowercase path segment for this domain
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthDomain::Local => "local",
            AuthDomain::External => "external",
        }
    }
}

impl fmt::Display for AuthDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthDomain {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "local" => Ok(AuthDomain::Local),
            "external" => Ok(AuthDomain::External),
            _ => Err(AdminError::argument(format!(
                "unknown auth domain '{}' (valid: local, external)",
                s
            ))),
        }
    }
}

/// Build the path for a user collection or a single user.
///
/// ```rust
/// use cbctl_core::paths::{AuthDomain, build_user_path};
///
/// assert_eq!(
///     build_user_path(Some(AuthDomain::Local), None).unwrap(),
///     "/settings/rbac/users/local"
/// );
/// assert_eq!(
///     build_user_path(Some(AuthDomain::Local), Some("user")).unwrap(),
///     "/settings/rbac/users/local/user"
/// );
/// assert!(build_user_path(None, Some("user")).is_err());
/// ```
pub fn build_user_path(domain: Option<AuthDomain>, user_id: Option<&str>) -> Result<String> {
    let domain = domain.ok_or_else(|| AdminError::argument("auth domain is required"))?;
    let base = format!("{}/{}", USERS_PATH, domain.as_str());

    match user_id {
        None => Ok(base),
        Some(id) => Ok(format!("{}/{}", base, segment(id, "user id")?)),
    }
}

/// Build the path for the bucket collection or a single bucket
pub fn build_bucket_path(name: Option<&str>) -> Result<String> {
    match name {
        None => Ok(BUCKETS_PATH.to_string()),
        Some(name) => Ok(format!("{}/{}", BUCKETS_PATH, segment(name, "bucket name")?)),
    }
}

/// Validate and percent-encode a single path segment
fn segment(value: &str, what: &str) -> Result<String> {
    if value.trim().is_empty() {
        return Err(AdminError::argument(format!("{} must not be empty", what)));
    }
    Ok(urlencoding::encode(value).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_collection_paths() {
        assert_eq!(
            build_user_path(Some(AuthDomain::Local), None).unwrap(),
            "/settings/rbac/users/local"
        );
        assert_eq!(
            build_user_path(Some(AuthDomain::External), None).unwrap(),
            "/settings/rbac/users/external"
        );
    }

    #[test]
    fn test_single_user_paths_are_stable() {
        for domain in [AuthDomain::Local, AuthDomain::External] {
            let first = build_user_path(Some(domain), Some("user")).unwrap();
            let second = build_user_path(Some(domain), Some("user")).unwrap();
            assert_eq!(first, format!("/settings/rbac/users/{}/user", domain));
            assert_eq!(first, second);

            // Collection path is unaffected by earlier calls
            assert_eq!(
                build_user_path(Some(domain), None).unwrap(),
                format!("/settings/rbac/users/{}", domain)
            );
        }
    }

    #[test]
    fn test_missing_domain_is_argument_error() {
        assert!(build_user_path(None, None).unwrap_err().is_argument());
        assert!(build_user_path(None, Some("custom-user")).unwrap_err().is_argument());
    }

    #[test]
    fn test_path_safe_user_ids_are_joined_verbatim() {
        for id in ["custom-user", "app_1", "alice.smith", "svc~ops"] {
            assert_eq!(
                build_user_path(Some(AuthDomain::Local), Some(id)).unwrap(),
                format!("/settings/rbac/users/local/{}", id)
            );
        }
    }

    #[test]
    fn test_user_id_is_encoded() {
        assert_eq!(
            build_user_path(Some(AuthDomain::External), Some("cn=alice/ops")).unwrap(),
            "/settings/rbac/users/external/cn%3Dalice%2Fops"
        );
        assert!(build_user_path(Some(AuthDomain::Local), Some("")).unwrap_err().is_argument());
    }

    #[test]
    fn test_bucket_paths() {
        assert_eq!(build_bucket_path(None).unwrap(), "/pools/default/buckets");
        assert_eq!(
            build_bucket_path(Some("dummy")).unwrap(),
            "/pools/default/buckets/dummy"
        );
        assert!(build_bucket_path(Some("  ")).unwrap_err().is_argument());
    }

    #[test]
    fn test_domain_parsing() {
        assert_eq!("LOCAL".parse::<AuthDomain>().unwrap(), AuthDomain::Local);
        assert_eq!("external".parse::<AuthDomain>().unwrap(), AuthDomain::External);
        assert!("ldap".parse::<AuthDomain>().unwrap_err().is_argument());
    }
}
