//! Administrative client core for Couchbase-style clusters
//!
//! `cbctl-core` talks to a cluster's management REST API: it authenticates,
//! manages buckets and RBAC users, waits for newly created buckets to come
//! online, and reports every failure through one [`AdminError`] taxonomy.
//!
//! # Layers
//!
//! - [`transport`]: authenticated HTTP, one outbound call per request
//! - [`classify`]: status codes and transport failures to [`AdminError`]
//! - [`paths`]: management API paths
//! - [`client`]: [`AdminClient`], the bucket and user operations
//! - [`readiness`]: polling until a bucket reports every node healthy
//!
//! Supporting modules cover connection strings ([`connstr`]), the bucket
//! and user models, the data-plane boundary ([`dataplane`]) and connection
//! profiles ([`config`]).

pub mod bucket;
pub mod classify;
pub mod client;
pub mod config;
pub mod connstr;
pub mod dataplane;
pub mod error;
pub mod paths;
pub mod readiness;
pub mod result;
pub mod transport;
pub mod user;

pub use bucket::{BucketChanges, BucketInfo, BucketNode, BucketQuota, BucketSpec, BucketType};
pub use client::{AdminClient, AdminClientBuilder};
pub use connstr::{ClusterEndpoint, ConnectionString, HostSpec, Scheme};
pub use dataplane::{DataPlaneTarget, KeyValueOperations};
pub use error::{AdminError, Result};
pub use paths::{AuthDomain, build_bucket_path, build_user_path};
pub use readiness::{ReadinessCallback, ReadinessEvent, wait_ready};
pub use result::HttpResult;
pub use transport::{Credentials, HttpMethod, HttpTransport, RequestBody, Transport};
pub use user::{RoleAssignment, UserRecord};
