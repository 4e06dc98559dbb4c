//! RBAC users and role assignments

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::{AdminError, Result};
use crate::paths::AuthDomain;

/// A role granted to a user, optionally scoped to a bucket (or `*`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub role: String,
    #[serde(
        rename = "bucket_name",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub scope: Option<String>,
}

impl RoleAssignment {
    /// Role scoped to one bucket, or every bucket with `*`
    pub fn new(role: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            scope: Some(scope.into()),
        }
    }

    /// Cluster-wide role
    pub fn global(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            scope: None,
        }
    }

    /// Wire form: `role[scope]` or `role`
    pub fn to_spec(&self) -> String {
        match &self.scope {
            Some(scope) => format!("{}[{}]", self.role, scope),
            None => self.role.clone(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.role.trim().is_empty() {
            return Err(AdminError::argument("role name must not be empty"));
        }
        if let Some(scope) = &self.scope
            && scope.trim().is_empty()
        {
            return Err(AdminError::argument(format!(
                "role '{}' has an empty scope",
                self.role
            )));
        }
        Ok(())
    }
}

impl fmt::Display for RoleAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_spec())
    }
}

/// Parses `role` or `role[scope]`
impl FromStr for RoleAssignment {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let assignment = match s.split_once('[') {
            None => RoleAssignment::global(s),
            Some((role, rest)) => {
                let scope = rest.strip_suffix(']').ok_or_else(|| {
                    AdminError::argument(format!("malformed role '{}' (expected role[scope])", s))
                })?;
                RoleAssignment::new(role.trim(), scope.trim())
            }
        };
        assignment.validate()?;
        Ok(assignment)
    }
}

impl From<(&str, &str)> for RoleAssignment {
    fn from((role, scope): (&str, &str)) -> Self {
        RoleAssignment::new(role, scope)
    }
}

/// Comma-joined `roles` form value. Empty role lists are rejected.
pub fn roles_param(roles: &[RoleAssignment]) -> Result<String> {
    if roles.is_empty() {
        return Err(AdminError::argument("at least one role is required"));
    }
    for role in roles {
        role.validate()?;
    }
    Ok(roles
        .iter()
        .map(RoleAssignment::to_spec)
        .collect::<Vec<_>>()
        .join(","))
}

/// A user as reported by `GET /settings/rbac/users/<domain>[/<id>]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub domain: AuthDomain,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub roles: Vec<RoleAssignment>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserRecord {
    /// Roles in wire form, comma-joined
    pub fn roles_display(&self) -> String {
        self.roles
            .iter()
            .map(RoleAssignment::to_spec)
            .collect::<Vec<_>>()
            .join(",")
    }
}
