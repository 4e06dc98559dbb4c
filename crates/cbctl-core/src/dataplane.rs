//! Boundary to the data-plane (key/value) client
//!
//! Document operations travel over a separate binary protocol that this crate
//! does not speak. An administrative session implements
//! [`KeyValueOperations`] only to reject every call with
//! [`AdminError::Unsupported`]; [`DataPlaneTarget`] carries what a real
//! data-plane client needs to connect to a bucket.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

use crate::client::AdminClient;
use crate::connstr::{ClusterEndpoint, ConnectionString, HostSpec, Scheme};
use crate::error::{AdminError, Result};

/// Document operations offered by a bucket session
#[async_trait]
pub trait KeyValueOperations: Send + Sync {
    /// Store `value` under `key`, replacing any existing document
    async fn upsert(&self, key: &str, value: Value) -> Result<()>;

    /// Fetch the document stored under `key`
    async fn get(&self, key: &str) -> Result<Value>;

    /// Append raw bytes to an existing document
    async fn append(&self, key: &str, fragment: &str) -> Result<()>;

    /// Delete the document stored under `key`
    async fn remove(&self, key: &str) -> Result<()>;

    /// Release a lock taken on `key` with the given CAS value
    async fn unlock(&self, key: &str, cas: u64) -> Result<()>;
}

#[async_trait]
impl KeyValueOperations for AdminClient {
    async fn upsert(&self, _key: &str, _value: Value) -> Result<()> {
        Err(AdminError::Unsupported { operation: "upsert" })
    }

    async fn get(&self, _key: &str) -> Result<Value> {
        Err(AdminError::Unsupported { operation: "get" })
    }

    async fn append(&self, _key: &str, _fragment: &str) -> Result<()> {
        Err(AdminError::Unsupported { operation: "append" })
    }

    async fn remove(&self, _key: &str) -> Result<()> {
        Err(AdminError::Unsupported { operation: "remove" })
    }

    async fn unlock(&self, _key: &str, _cas: u64) -> Result<()> {
        Err(AdminError::Unsupported { operation: "unlock" })
    }
}

/// Connection details for a data-plane client bound to one bucket
#[derive(Clone, PartialEq, Eq)]
pub struct DataPlaneTarget {
    endpoint: ClusterEndpoint,
    password: Option<String>,
}

impl DataPlaneTarget {
    pub fn new(endpoint: ClusterEndpoint, password: Option<String>) -> Self {
        Self { endpoint, password }
    }

    pub fn endpoint(&self) -> &ClusterEndpoint {
        &self.endpoint
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Connection string for the data-plane client.
    ///
    /// On the default management port this is `couchbase(s)://host/bucket`.
    /// A non-default port can only be reached through HTTP bootstrap, so the
    /// management port is kept with an `http(s)` scheme.
    pub fn connection_string(&self) -> ConnectionString {
        let tls = self.endpoint.tls();
        let default_port = if tls {
            Scheme::Couchbases.default_port()
        } else {
            Scheme::Couchbase.default_port()
        };

        let (scheme, port) = match (tls, self.endpoint.port() == default_port) {
            (false, true) => (Scheme::Couchbase, None),
            (true, true) => (Scheme::Couchbases, None),
            (false, false) => (Scheme::Http, Some(self.endpoint.port())),
            (true, false) => (Scheme::Https, Some(self.endpoint.port())),
        };

        ConnectionString {
            scheme,
            hosts: vec![HostSpec {
                host: self.endpoint.host().to_string(),
                port,
            }],
            bucket: self.endpoint.bucket().map(str::to_string),
            options: Vec::new(),
        }
    }
}

impl fmt::Debug for DataPlaneTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataPlaneTarget")
            .field("endpoint", &self.endpoint)
            .field("password", &self.password.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{HttpMethod, RawResponse, RequestBody, Transport};
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct NeverCalled(AtomicUsize);

    #[async_trait]
    impl Transport for NeverCalled {
        async fn send(
            &self,
            _method: HttpMethod,
            _path: &str,
            _body: Option<&RequestBody>,
        ) -> Result<RawResponse> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(RawResponse {
                status: 200,
                body: String::new(),
            })
        }
    }

    #[tokio::test]
    async fn test_admin_session_rejects_document_operations() {
        let transport = Arc::new(NeverCalled::default());
        let admin = AdminClient::from_transport(
            ClusterEndpoint::new("127.0.0.1", 8091),
            transport.clone(),
        );

        assert!(admin.upsert("foo", json!("bar")).await.unwrap_err().is_unsupported());
        assert!(admin.get("foo").await.unwrap_err().is_unsupported());
        assert!(admin.append("foo", "bar").await.unwrap_err().is_unsupported());
        assert!(KeyValueOperations::remove(&admin, "foo").await.unwrap_err().is_unsupported());
        assert!(admin.unlock("foo", 1).await.unwrap_err().is_unsupported());
        assert!(admin.get("").await.unwrap_err().is_unsupported());

        assert_eq!(transport.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_connection_string_rendering() {
        let target = DataPlaneTarget::new(
            ClusterEndpoint::new("10.1.1.1", 8091).with_bucket(Some("dummy".into())),
            Some("letmein".into()),
        );
        assert_eq!(target.connection_string().encode(), "couchbase://10.1.1.1/dummy");
        assert!(!format!("{:?}", target).contains("letmein"));

        let target = DataPlaneTarget::new(
            ClusterEndpoint::new("10.1.1.1", 9000).with_bucket(Some("dummy".into())),
            None,
        );
        assert_eq!(target.connection_string().encode(), "http://10.1.1.1:9000/dummy");

        let target = DataPlaneTarget::new(
            ClusterEndpoint::new("db.example.com", 18091)
                .with_tls(true)
                .with_bucket(Some("dummy".into())),
            None,
        );
        assert_eq!(
            target.connection_string().encode(),
            "couchbases://db.example.com/dummy"
        );
    }
}
