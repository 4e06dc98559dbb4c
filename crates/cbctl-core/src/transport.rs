//! Authenticated HTTP transport to a cluster management endpoint
//!
//! The [`Transport`] trait is the seam between the admin client and the
//! network. [`HttpTransport`] is the production implementation built on
//! `reqwest`; tests substitute their own.
//!
//! A transport performs exactly one outbound call per [`Transport::send`] and
//! never retries.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, trace};

use crate::classify;
use crate::connstr::ClusterEndpoint;
use crate::error::{AdminError, Result};

/// User agent string for cbctl HTTP requests
pub const USER_AGENT: &str = concat!("cbctl/", env!("CARGO_PKG_VERSION"));

/// Default per-request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(75);

/// Default TCP connect timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// HTTP methods accepted by the management API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    fn as_reqwest(&self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Parse HTTP method case-insensitively
impl FromStr for HttpMethod {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "get" => Ok(HttpMethod::Get),
            "post" => Ok(HttpMethod::Post),
            "put" => Ok(HttpMethod::Put),
            "delete" => Ok(HttpMethod::Delete),
            _ => Err(AdminError::argument(format!(
                "invalid HTTP method: {} (valid: get, post, put, delete)",
                s
            ))),
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
            HttpMethod::Put => write!(f, "PUT"),
            HttpMethod::Delete => write!(f, "DELETE"),
        }
    }
}

/// Request payload
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// `application/json`
    Json(Value),
    /// `application/x-www-form-urlencoded`, already encoded
    Form(String),
}

impl RequestBody {
    /// Encode `params` as a form body
    pub fn form<T: Serialize + ?Sized>(params: &T) -> Result<Self> {
        serde_urlencoded::to_string(params)
            .map(RequestBody::Form)
            .map_err(|e| AdminError::argument(format!("cannot encode form parameters: {}", e)))
    }
}

/// Status and body of a response, before classification
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Username and password for HTTP Basic authentication
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Create credentials; the username must not be empty
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        let username = username.into();
        if username.trim().is_empty() {
            return Err(AdminError::argument("username must not be empty"));
        }
        Ok(Self {
            username,
            password: password.into(),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .finish()
    }
}

/// Check that a request path is usable before touching the network
pub fn validate_path(path: &str) -> Result<&str> {
    if path.trim().is_empty() {
        return Err(AdminError::argument("request path must not be empty"));
    }
    Ok(path)
}

/// Executes management requests against one cluster endpoint
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Perform a single request. Fails with [`AdminError::Network`] when no
    /// HTTP response could be obtained; any status code is returned as-is.
    async fn send(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&RequestBody>,
    ) -> Result<RawResponse>;
}

/// Timeouts and identity for [`HttpTransport`]
#[derive(Debug, Clone)]
pub struct TransportOptions {
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

/// `reqwest`-backed transport with HTTP Basic authentication.
///
/// `reqwest::Client` is safe to share between tasks, so the transport needs no
/// lock of its own.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    credentials: Credentials,
}

impl HttpTransport {
    /// Build a transport targeting `endpoint`
    pub fn new(
        endpoint: &ClusterEndpoint,
        credentials: Credentials,
        options: &TransportOptions,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .connect_timeout(options.connect_timeout)
            .user_agent(options.user_agent.as_str())
            .build()
            .map_err(classify::from_transport_error)?;

        let base_url = endpoint.base_url();
        debug!("HTTP transport targeting {}", base_url);

        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    /// Base URL requests are resolved against
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("credentials", &self.credentials)
            .finish()
    }
}

impl Drop for HttpTransport {
    fn drop(&mut self) {
        debug!("Closing HTTP transport for {}", self.base_url);
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&RequestBody>,
    ) -> Result<RawResponse> {
        let url = self.url_for(path);
        debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method.as_reqwest(), &url)
            .basic_auth(self.credentials.username(), Some(self.credentials.password()))
            .header(ACCEPT, "application/json");

        match body {
            Some(RequestBody::Json(value)) => {
                request = request.json(value);
            }
            Some(RequestBody::Form(form)) => {
                trace!("Form body: {} bytes", form.len());
                request = request
                    .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
                    .body(form.clone());
            }
            None => {}
        }

        let response = request
            .send()
            .await
            .map_err(classify::from_transport_error)?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| classify::from_body_error(path, status, e))?;

        debug!("{} {} -> {}", method, url, status);
        trace!("Response body: {}", body);

        Ok(RawResponse { status, body })
    }
}
