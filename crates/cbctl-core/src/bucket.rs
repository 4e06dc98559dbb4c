//! Bucket configuration model
//!
//! [`BucketSpec`] describes a bucket to create, [`BucketChanges`] a partial
//! update, and [`BucketInfo`] the configuration the cluster reports back.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::{AdminError, Result};
use crate::transport::RequestBody;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Node status reported once a bucket is serving on that node
pub const HEALTHY_STATUS: &str = "healthy";

/// Storage engine of a bucket
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum BucketType {
    #[default]
    Couchbase,
    Memcached,
    Ephemeral,
}

impl BucketType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BucketType::Couchbase => "couchbase",
            BucketType::Memcached => "memcached",
            BucketType::Ephemeral => "ephemeral",
        }
    }

    /// Memcached buckets have no replicas
    pub fn supports_replicas(&self) -> bool {
        !matches!(self, BucketType::Memcached)
    }
}

impl fmt::Display for BucketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BucketType {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "couchbase" | "membase" => Ok(BucketType::Couchbase),
            "memcached" => Ok(BucketType::Memcached),
            "ephemeral" => Ok(BucketType::Ephemeral),
            _ => Err(AdminError::argument(format!(
                "unknown bucket type '{}' (valid: couchbase, memcached, ephemeral)",
                s
            ))),
        }
    }
}

/// Parameters for creating a bucket
#[derive(Clone, PartialEq, Eq)]
pub struct BucketSpec {
    name: String,
    bucket_type: BucketType,
    ram_quota_mb: u64,
    password: Option<String>,
    replicas: u32,
    flush_enabled: bool,
}

impl BucketSpec {
    /// A couchbase bucket with no password, no replicas and flush disabled
    pub fn new(name: impl Into<String>, ram_quota_mb: u64) -> Self {
        Self {
            name: name.into(),
            bucket_type: BucketType::default(),
            ram_quota_mb,
            password: None,
            replicas: 0,
            flush_enabled: false,
        }
    }

    pub fn bucket_type(mut self, bucket_type: BucketType) -> Self {
        self.bucket_type = bucket_type;
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn replicas(mut self, replicas: u32) -> Self {
        self.replicas = replicas;
        self
    }

    pub fn flush_enabled(mut self, enabled: bool) -> Self {
        self.flush_enabled = enabled;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> BucketType {
        self.bucket_type
    }

    pub fn ram_quota_mb(&self) -> u64 {
        self.ram_quota_mb
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AdminError::argument("bucket name must not be empty"));
        }
        if self.ram_quota_mb == 0 {
            return Err(AdminError::argument("RAM quota must be greater than zero"));
        }
        Ok(())
    }

    /// Form parameters for `POST /pools/default/buckets`
    pub fn form_params(&self) -> Result<Vec<(&'static str, String)>> {
        self.validate()?;

        let mut params = vec![
            ("name", self.name.clone()),
            ("bucketType", self.bucket_type.as_str().to_string()),
            ("ramQuotaMB", self.ram_quota_mb.to_string()),
            ("authType", "sasl".to_string()),
            ("saslPassword", self.password.clone().unwrap_or_default()),
            ("flushEnabled", flag(self.flush_enabled)),
        ];
        if self.bucket_type.supports_replicas() {
            params.push(("replicaNumber", self.replicas.to_string()));
        }
        Ok(params)
    }

    pub(crate) fn to_body(&self) -> Result<RequestBody> {
        RequestBody::form(&self.form_params()?)
    }
}

impl fmt::Debug for BucketSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketSpec")
            .field("name", &self.name)
            .field("bucket_type", &self.bucket_type)
            .field("ram_quota_mb", &self.ram_quota_mb)
            .field("password", &self.password.as_ref().map(|_| "<REDACTED>"))
            .field("replicas", &self.replicas)
            .field("flush_enabled", &self.flush_enabled)
            .finish()
    }
}

/// Partial bucket update. Unset fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketChanges {
    pub password: Option<String>,
    pub replicas: Option<u32>,
    pub ram_quota_mb: Option<u64>,
    pub flush_enabled: Option<bool>,
}

impl BucketChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn replicas(mut self, replicas: u32) -> Self {
        self.replicas = Some(replicas);
        self
    }

    pub fn ram_quota_mb(mut self, ram_quota_mb: u64) -> Self {
        self.ram_quota_mb = Some(ram_quota_mb);
        self
    }

    pub fn flush_enabled(mut self, enabled: bool) -> Self {
        self.flush_enabled = Some(enabled);
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Merge into `current`, producing the full configuration to submit
    pub fn merge(&self, current: &BucketInfo) -> Result<Vec<(&'static str, String)>> {
        let auth_type = if self.password.is_some() {
            "sasl".to_string()
        } else {
            current.auth_type.clone().unwrap_or_else(|| "sasl".to_string())
        };

        let mut params = vec![
            ("authType", auth_type),
            (
                "saslPassword",
                self.password
                    .clone()
                    .or_else(|| current.sasl_password.clone())
                    .unwrap_or_default(),
            ),
        ];

        if let Some(replicas) = self.replicas.or(current.replica_number) {
            params.push(("replicaNumber", replicas.to_string()));
        }

        let ram_quota_mb = match self.ram_quota_mb {
            Some(mb) => mb,
            None => current.ram_quota_mb().ok_or_else(|| {
                AdminError::argument(format!(
                    "bucket '{}' reports no RAM quota; pass one explicitly",
                    current.name
                ))
            })?,
        };
        if ram_quota_mb == 0 {
            return Err(AdminError::argument("RAM quota must be greater than zero"));
        }
        params.push(("ramQuotaMB", ram_quota_mb.to_string()));

        if let Some(enabled) = self.flush_enabled {
            params.push(("flushEnabled", flag(enabled)));
        }

        if let Some(port) = current.proxy_port {
            params.push(("proxyPort", port.to_string()));
        }

        Ok(params)
    }
}

fn flag(enabled: bool) -> String {
    if enabled { "1" } else { "0" }.to_string()
}

/// Memory quota reported for a bucket, in bytes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketQuota {
    pub ram: u64,
    #[serde(rename = "rawRAM", default)]
    pub raw_ram: u64,
}

/// A node serving a bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketNode {
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub status: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BucketNode {
    pub fn is_healthy(&self) -> bool {
        self.status == HEALTHY_STATUS
    }
}

/// Bucket configuration as reported by `GET /pools/default/buckets/<name>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sasl_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replica_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota: Option<BucketQuota>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_port: Option<u16>,
    #[serde(default)]
    pub nodes: Vec<BucketNode>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BucketInfo {
    /// At least one node, and every node healthy
    pub fn is_ready(&self) -> bool {
        !self.nodes.is_empty() && self.nodes.iter().all(BucketNode::is_healthy)
    }

    pub fn healthy_nodes(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_healthy()).count()
    }

    /// Human-readable health summary, e.g. `1/3 nodes healthy`
    pub fn health_summary(&self) -> String {
        format!("{}/{} nodes healthy", self.healthy_nodes(), self.nodes.len())
    }

    /// RAM quota in MB, derived from `quota.ram`
    pub fn ram_quota_mb(&self) -> Option<u64> {
        self.quota.as_ref().map(|q| q.ram / BYTES_PER_MB)
    }
}
