//! Administrative client for a cluster's management REST API
//!
//! [`AdminClient`] resolves resource paths, sends one request per operation
//! through its [`Transport`] and classifies the response. Bucket creation
//! returns as soon as the cluster accepts the request; call
//! [`AdminClient::wait_ready`] to block until the bucket is serving.
//!
//! # Example
//!
//! ```rust,no_run
//! use cbctl_core::{AdminClient, AuthDomain, BucketSpec, RoleAssignment};
//! use std::time::Duration;
//!
//! # async fn run() -> cbctl_core::Result<()> {
//! let admin = AdminClient::builder()
//!     .credentials("Administrator", "password")
//!     .connection_string("http://127.0.0.1:8091")
//!     .connect()
//!     .await?;
//!
//! admin
//!     .bucket_create(&BucketSpec::new("dummy", 100).password("letmein"))
//!     .await?;
//! admin.wait_ready("dummy", Duration::from_secs(15)).await?;
//!
//! admin
//!     .user_upsert(
//!         AuthDomain::Local,
//!         "custom-user",
//!         Some("s3cr3t"),
//!         &[RoleAssignment::new("data_reader", "dummy")],
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::bucket::{BucketChanges, BucketInfo, BucketSpec};
use crate::classify;
use crate::connstr::{ClusterEndpoint, ConnectionString, DEFAULT_MGMT_PORT, DEFAULT_MGMT_TLS_PORT};
use crate::dataplane::DataPlaneTarget;
use crate::error::{AdminError, Result};
use crate::paths::{AuthDomain, POOLS_PATH, build_bucket_path, build_user_path};
use crate::readiness::{self, DEFAULT_POLL_INTERVAL};
use crate::result::HttpResult;
use crate::transport::{
    Credentials, HttpMethod, HttpTransport, RequestBody, Transport, TransportOptions,
    validate_path,
};
use crate::user::{RoleAssignment, UserRecord, roles_param};

/// Host used when neither a connection string nor a host is given
pub const DEFAULT_HOST: &str = "localhost";

/// Authenticated session against one cluster endpoint.
///
/// Cloning is cheap; clones share the same transport, which is released when
/// the last clone is dropped.
#[derive(Debug, Clone)]
pub struct AdminClient {
    endpoint: ClusterEndpoint,
    transport: Arc<dyn Transport>,
}

impl AdminClient {
    /// Start building a client
    pub fn builder() -> AdminClientBuilder {
        AdminClientBuilder::default()
    }

    /// Wrap an existing transport. No handshake is performed.
    pub fn from_transport(endpoint: ClusterEndpoint, transport: Arc<dyn Transport>) -> Self {
        Self {
            endpoint,
            transport,
        }
    }

    /// Endpoint this session targets
    pub fn endpoint(&self) -> &ClusterEndpoint {
        &self.endpoint
    }

    /// Release this handle. The transport closes once no clone remains.
    pub fn close(self) {
        debug!("Closing admin session for {}", self.endpoint);
    }

    /// Send one request and classify the response
    pub async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&RequestBody>,
    ) -> Result<HttpResult> {
        let path = validate_path(path)?;
        let raw = self.transport.send(method, path, body).await?;
        classify::check(HttpResult::from_body(path, raw.status, &raw.body))
    }

    /// Generic management request.
    ///
    /// `method` is parsed case-insensitively; anything other than GET, POST,
    /// PUT or DELETE is rejected before a request is sent. The returned
    /// result (or the one carried by an HTTP error) reports `path` verbatim
    /// as its URL.
    pub async fn http_request(
        &self,
        path: &str,
        method: &str,
        body: Option<RequestBody>,
    ) -> Result<HttpResult> {
        let method: HttpMethod = method.parse()?;
        self.request(method, path, body.as_ref()).await
    }

    /// Create a bucket. Returns once the cluster accepts the request.
    pub async fn bucket_create(&self, spec: &BucketSpec) -> Result<HttpResult> {
        let body = spec.to_body()?;
        let path = build_bucket_path(None)?;
        info!("Creating {} bucket '{}'", spec.kind(), spec.name());
        self.request(HttpMethod::Post, &path, Some(&body)).await
    }

    /// Apply `changes` on top of `current` and submit the full configuration
    pub async fn bucket_update(
        &self,
        name: &str,
        current: &BucketInfo,
        changes: &BucketChanges,
    ) -> Result<HttpResult> {
        let path = build_bucket_path(Some(name))?;
        let body = RequestBody::form(&changes.merge(current)?)?;
        info!("Updating bucket '{}'", name);
        self.request(HttpMethod::Post, &path, Some(&body)).await
    }

    /// Delete a bucket. A missing bucket fails with an HTTP error.
    pub async fn bucket_remove(&self, name: &str) -> Result<HttpResult> {
        let path = build_bucket_path(Some(name))?;
        info!("Removing bucket '{}'", name);
        self.request(HttpMethod::Delete, &path, None).await
    }

    /// Current configuration of one bucket
    pub async fn bucket_info(&self, name: &str) -> Result<BucketInfo> {
        let path = build_bucket_path(Some(name))?;
        self.request(HttpMethod::Get, &path, None).await?.json()
    }

    /// Configuration of every bucket
    pub async fn buckets_list(&self) -> Result<Vec<BucketInfo>> {
        let path = build_bucket_path(None)?;
        self.request(HttpMethod::Get, &path, None).await?.json()
    }

    /// Wait for `bucket` to report every node healthy, polling at the default
    /// interval
    pub async fn wait_ready(&self, bucket: &str, timeout: Duration) -> Result<BucketInfo> {
        readiness::wait_ready(self, bucket, timeout, DEFAULT_POLL_INTERVAL, None).await
    }

    /// Create or replace a user.
    ///
    /// External users are authenticated elsewhere, so passing a password for
    /// [`AuthDomain::External`] is rejected.
    pub async fn user_upsert(
        &self,
        domain: impl Into<Option<AuthDomain>>,
        user_id: &str,
        password: Option<&str>,
        roles: &[RoleAssignment],
    ) -> Result<HttpResult> {
        let domain = domain.into();
        let path = build_user_path(domain, Some(user_id))?;
        if domain == Some(AuthDomain::External) && password.is_some() {
            return Err(AdminError::argument(
                "external users cannot have a password",
            ));
        }

        let mut params = vec![("roles", roles_param(roles)?)];
        if let Some(password) = password {
            params.push(("password", password.to_string()));
        }
        let body = RequestBody::form(&params)?;

        info!("Upserting user '{}' in {} domain", user_id, path_domain(domain));
        self.request(HttpMethod::Put, &path, Some(&body)).await
    }

    /// Every user in `domain`
    pub async fn users_get(&self, domain: impl Into<Option<AuthDomain>>) -> Result<Vec<UserRecord>> {
        let path = build_user_path(domain.into(), None)?;
        self.request(HttpMethod::Get, &path, None).await?.json()
    }

    /// One user
    pub async fn user_get(
        &self,
        domain: impl Into<Option<AuthDomain>>,
        user_id: &str,
    ) -> Result<UserRecord> {
        let path = build_user_path(domain.into(), Some(user_id))?;
        self.request(HttpMethod::Get, &path, None).await?.json()
    }

    /// Delete a user
    pub async fn user_remove(
        &self,
        domain: impl Into<Option<AuthDomain>>,
        user_id: &str,
    ) -> Result<HttpResult> {
        let domain = domain.into();
        let path = build_user_path(domain, Some(user_id))?;
        info!("Removing user '{}' from {} domain", user_id, path_domain(domain));
        self.request(HttpMethod::Delete, &path, None).await
    }

    /// Endpoint and bucket credentials for a data-plane client
    pub fn data_plane_target(&self, bucket: &str, password: Option<&str>) -> Result<DataPlaneTarget> {
        if bucket.trim().is_empty() {
            return Err(AdminError::argument("bucket name must not be empty"));
        }
        let endpoint = self.endpoint.clone().with_bucket(Some(bucket.to_string()));
        Ok(DataPlaneTarget::new(endpoint, password.map(str::to_string)))
    }
}

fn path_domain(domain: Option<AuthDomain>) -> &'static str {
    domain.map(|d| d.as_str()).unwrap_or("unknown")
}

/// Builder for [`AdminClient`]
#[derive(Default)]
pub struct AdminClientBuilder {
    username: Option<String>,
    password: Option<String>,
    connection_string: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    bucket: Option<String>,
    tls: bool,
    options: TransportOptions,
}

impl AdminClientBuilder {
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Target a cluster by connection string. Conflicts with `host`/`port`.
    pub fn connection_string(mut self, connection_string: impl Into<String>) -> Self {
        self.connection_string = Some(connection_string.into());
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    /// Use HTTPS for the management endpoint
    pub fn tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    /// Per-request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.request_timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.options.connect_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.options.user_agent = user_agent.into();
        self
    }

    /// Resolve the endpoint without touching the network
    pub fn endpoint(&self) -> Result<ClusterEndpoint> {
        let endpoint = match &self.connection_string {
            Some(_) if self.host.is_some() || self.port.is_some() => {
                return Err(AdminError::argument(
                    "specify either a connection string or host/port, not both",
                ));
            }
            Some(connstr) => {
                let endpoint = ConnectionString::parse(connstr)?.endpoint()?;
                let tls = endpoint.tls() || self.tls;
                endpoint.with_tls(tls)
            }
            None => {
                let host = self.host.as_deref().unwrap_or(DEFAULT_HOST);
                if host.trim().is_empty() {
                    return Err(AdminError::argument("host must not be empty"));
                }
                let port = self.port.unwrap_or(if self.tls {
                    DEFAULT_MGMT_TLS_PORT
                } else {
                    DEFAULT_MGMT_PORT
                });
                if port == 0 {
                    return Err(AdminError::argument("port must be greater than zero"));
                }
                ClusterEndpoint::new(host, port).with_tls(self.tls)
            }
        };

        Ok(match &self.bucket {
            Some(bucket) => endpoint.with_bucket(Some(bucket.clone())),
            None => endpoint,
        })
    }

    /// Build the client without a handshake
    pub fn build(self) -> Result<AdminClient> {
        let endpoint = self.endpoint()?;
        let credentials = Credentials::new(
            self.username.unwrap_or_default(),
            self.password.unwrap_or_default(),
        )?;
        let transport = HttpTransport::new(&endpoint, credentials, &self.options)?;
        Ok(AdminClient::from_transport(endpoint, Arc::new(transport)))
    }

    /// Build the client and verify the credentials with `GET /pools`
    pub async fn connect(self) -> Result<AdminClient> {
        let client = self.build()?;
        debug!("Handshake with {}", client.endpoint());
        client.request(HttpMethod::Get, POOLS_PATH, None).await?;
        info!("Connected to {}", client.endpoint());
        Ok(client)
    }
}
