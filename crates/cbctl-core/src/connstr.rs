//! Connection strings and cluster endpoints
//!
//! A connection string has the form
//! `scheme://host[:port][,host[:port]...][/bucket][?key=value&...]`.
//! [`ConnectionString::parse`] and [`ConnectionString::encode`] round-trip,
//! and [`ConnectionString::endpoint`] normalizes to the same
//! [`ClusterEndpoint`] that explicit host/port parameters produce.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AdminError, Result};

/// Default management port
pub const DEFAULT_MGMT_PORT: u16 = 8091;

/// Default management port over TLS
pub const DEFAULT_MGMT_TLS_PORT: u16 = 18091;

/// Connection string scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Couchbase,
    Couchbases,
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Couchbase => "couchbase",
            Scheme::Couchbases => "couchbases",
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }

    /// True for schemes that imply TLS
    pub fn is_tls(&self) -> bool {
        matches!(self, Scheme::Couchbases | Scheme::Https)
    }

    /// Management port used when a host has none
    pub fn default_port(&self) -> u16 {
        if self.is_tls() {
            DEFAULT_MGMT_TLS_PORT
        } else {
            DEFAULT_MGMT_PORT
        }
    }
}

impl FromStr for Scheme {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "couchbase" => Ok(Scheme::Couchbase),
            "couchbases" => Ok(Scheme::Couchbases),
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            _ => Err(AdminError::argument(format!(
                "unsupported connection string scheme '{}'",
                s
            ))),
        }
    }
}

/// A single host entry of a connection string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSpec {
    pub host: String,
    pub port: Option<u16>,
}

impl HostSpec {
    fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(AdminError::argument("connection string has an empty host"));
        }

        // [v6::addr]:port
        if let Some(rest) = raw.strip_prefix('[') {
            let (host, tail) = rest.split_once(']').ok_or_else(|| {
                AdminError::argument(format!("unterminated IPv6 address in '{}'", raw))
            })?;
            let port = match tail {
                "" => None,
                tail => Some(parse_port(tail.strip_prefix(':').unwrap_or(tail), raw)?),
            };
            return Ok(Self {
                host: host.to_string(),
                port,
            });
        }

        match raw.rsplit_once(':') {
            Some((host, port)) if !host.contains(':') => Ok(Self {
                host: host.to_string(),
                port: Some(parse_port(port, raw)?),
            }),
            Some(_) => Err(AdminError::argument(format!(
                "IPv6 address '{}' must be enclosed in brackets",
                raw
            ))),
            None => Ok(Self {
                host: raw.to_string(),
                port: None,
            }),
        }
    }

    fn encode(&self) -> String {
        let host = if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        match self.port {
            Some(port) => format!("{}:{}", host, port),
            None => host,
        }
    }
}

impl fmt::Display for HostSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

fn parse_port(port: &str, context: &str) -> Result<u16> {
    port.parse::<u16>()
        .ok()
        .filter(|p| *p != 0)
        .ok_or_else(|| AdminError::argument(format!("invalid port '{}' in '{}'", port, context)))
}

/// Normalized target of an admin session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClusterEndpoint {
    host: String,
    port: u16,
    bucket: Option<String>,
    tls: bool,
}

impl ClusterEndpoint {
    /// Plain-HTTP endpoint with no bucket
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            bucket: None,
            tls: false,
        }
    }

    /// Set the target bucket
    pub fn with_bucket(mut self, bucket: Option<String>) -> Self {
        self.bucket = bucket.filter(|b| !b.is_empty());
        self
    }

    /// Use HTTPS for management requests
    pub fn with_tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn bucket(&self) -> Option<&str> {
        self.bucket.as_deref()
    }

    pub fn tls(&self) -> bool {
        self.tls
    }

    /// `http(s)://host:port` without a trailing slash
    pub fn base_url(&self) -> String {
        let scheme = if self.tls { "https" } else { "http" };
        let host = if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        format!("{}://{}:{}", scheme, host, self.port)
    }

    /// Connection string addressing this endpoint over the management port
    pub fn to_connection_string(&self) -> ConnectionString {
        ConnectionString {
            scheme: if self.tls { Scheme::Https } else { Scheme::Http },
            hosts: vec![HostSpec {
                host: self.host.clone(),
                port: Some(self.port),
            }],
            bucket: self.bucket.clone(),
            options: Vec::new(),
        }
    }
}

impl fmt::Display for ClusterEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base_url())?;
        if let Some(bucket) = &self.bucket {
            write!(f, "/{}", bucket)?;
        }
        Ok(())
    }
}

/// Parsed connection string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionString {
    pub scheme: Scheme,
    pub hosts: Vec<HostSpec>,
    pub bucket: Option<String>,
    /// Options in their original order
    pub options: Vec<(String, String)>,
}

impl ConnectionString {
    /// Parse a connection string. A missing scheme means `couchbase://`.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(AdminError::argument("connection string must not be empty"));
        }

        let (scheme, rest) = match input.split_once("://") {
            Some((scheme, rest)) => (scheme.parse::<Scheme>()?, rest),
            None => (Scheme::Couchbase, input),
        };

        let (location, query) = match rest.split_once('?') {
            Some((location, query)) => (location, Some(query)),
            None => (rest, None),
        };

        let (hosts_part, bucket_part) = match location.split_once('/') {
            Some((hosts, bucket)) => (hosts, Some(bucket)),
            None => (location, None),
        };

        let hosts = hosts_part
            .split([',', ';'])
            .filter(|h| !h.trim().is_empty())
            .map(HostSpec::parse)
            .collect::<Result<Vec<_>>>()?;
        if hosts.is_empty() {
            return Err(AdminError::argument(format!(
                "connection string '{}' has no hosts",
                input
            )));
        }

        let bucket = match bucket_part.map(|b| b.trim_end_matches('/')) {
            None | Some("") => None,
            Some(b) if b.contains('/') => {
                return Err(AdminError::argument(format!(
                    "bucket name '{}' must be a single path segment",
                    b
                )));
            }
            Some(b) => Some(decode(b)?),
        };

        let options = match query {
            None | Some("") => Vec::new(),
            Some(query) => query
                .split('&')
                .filter(|pair| !pair.is_empty())
                .map(|pair| {
                    let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                    Ok((decode(key)?, decode(value)?))
                })
                .collect::<Result<Vec<_>>>()?,
        };

        Ok(Self {
            scheme,
            hosts,
            bucket,
            options,
        })
    }

    /// Render back to string form
    pub fn encode(&self) -> String {
        let hosts: Vec<String> = self.hosts.iter().map(HostSpec::encode).collect();
        let mut out = format!("{}://{}", self.scheme.as_str(), hosts.join(","));

        if let Some(bucket) = &self.bucket {
            out.push('/');
            out.push_str(&urlencoding::encode(bucket));
        }

        if !self.options.is_empty() {
            let query: Vec<String> = self
                .options
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect();
            out.push('?');
            out.push_str(&query.join("&"));
        }

        out
    }

    /// Value of the first option named `key`
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Management endpoint for the first host
    pub fn endpoint(&self) -> Result<ClusterEndpoint> {
        let first = self
            .hosts
            .first()
            .ok_or_else(|| AdminError::argument("connection string has no hosts"))?;
        Ok(ClusterEndpoint::new(
            first.host.clone(),
            first.port.unwrap_or_else(|| self.scheme.default_port()),
        )
        .with_bucket(self.bucket.clone())
        .with_tls(self.scheme.is_tls()))
    }
}

impl FromStr for ConnectionString {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

fn decode(value: &str) -> Result<String> {
    urlencoding::decode(value)
        .map(|v| v.into_owned())
        .map_err(|e| AdminError::argument(format!("invalid percent-encoding in '{}': {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_http_with_port() {
        let cs = ConnectionString::parse("http://10.0.0.5:9000").unwrap();
        assert_eq!(cs.scheme, Scheme::Http);
        assert_eq!(cs.hosts.len(), 1);
        assert_eq!(cs.hosts[0].host, "10.0.0.5");
        assert_eq!(cs.hosts[0].port, Some(9000));
        assert_eq!(cs.bucket, None);

        let endpoint = cs.endpoint().unwrap();
        assert_eq!(endpoint, ClusterEndpoint::new("10.0.0.5", 9000));
    }

    #[test]
    fn test_parse_full() {
        let cs = ConnectionString::parse(
            "couchbases://node1.example.com,node2.example.com:18092/travel-sample?operation_timeout=2.5&certpath=%2Fetc%2Fca.pem",
        )
        .unwrap();
        assert_eq!(cs.scheme, Scheme::Couchbases);
        assert_eq!(cs.hosts.len(), 2);
        assert_eq!(cs.hosts[1].port, Some(18092));
        assert_eq!(cs.bucket.as_deref(), Some("travel-sample"));
        assert_eq!(cs.option("certpath"), Some("/etc/ca.pem"));
        assert_eq!(cs.option("operation_timeout"), Some("2.5"));

        let endpoint = cs.endpoint().unwrap();
        assert_eq!(endpoint.host(), "node1.example.com");
        assert_eq!(endpoint.port(), DEFAULT_MGMT_TLS_PORT);
        assert!(endpoint.tls());
        assert_eq!(endpoint.bucket(), Some("travel-sample"));
    }

    #[test]
    fn test_default_scheme_and_port() {
        let cs = ConnectionString::parse("localhost/default").unwrap();
        assert_eq!(cs.scheme, Scheme::Couchbase);
        let endpoint = cs.endpoint().unwrap();
        assert_eq!(endpoint.port(), DEFAULT_MGMT_PORT);
        assert_eq!(endpoint.bucket(), Some("default"));
        assert!(!endpoint.tls());
    }

    #[test]
    fn test_ipv6_hosts() {
        let cs = ConnectionString::parse("http://[::1]:8091").unwrap();
        assert_eq!(cs.hosts[0].host, "::1");
        assert_eq!(cs.encode(), "http://[::1]:8091");
        assert_eq!(cs.endpoint().unwrap().base_url(), "http://[::1]:8091");
        assert!(ConnectionString::parse("http://::1:8091").is_err());
    }

    #[test]
    fn test_round_trip() {
        for input in [
            "http://127.0.0.1:8091",
            "couchbase://localhost/default",
            "couchbases://a.example.com,b.example.com:11207/my%20bucket?x=1&y=a%26b",
            "https://[fe80::1]:18091/dummy",
        ] {
            let parsed = ConnectionString::parse(input).unwrap();
            let reparsed = ConnectionString::parse(&parsed.encode()).unwrap();
            assert_eq!(parsed, reparsed, "round trip of {input}");
            assert_eq!(parsed.endpoint().unwrap(), reparsed.endpoint().unwrap());
        }
    }

    #[test]
    fn test_setting_bucket_then_encoding() {
        let mut cs = ConnectionString::parse("couchbase://10.1.1.1").unwrap();
        cs.bucket = Some("dummy".to_string());
        assert_eq!(cs.encode(), "couchbase://10.1.1.1/dummy");
    }

    #[test]
    fn test_endpoint_and_connection_string_agree() {
        let explicit = ClusterEndpoint::new("127.0.0.1", 8091).with_bucket(Some("default".into()));
        let parsed = ConnectionString::parse(&explicit.to_connection_string().encode())
            .unwrap()
            .endpoint()
            .unwrap();
        assert_eq!(explicit, parsed);
    }

    #[test]
    fn test_invalid_inputs() {
        for bad in [
            "",
            "ftp://host",
            "http://",
            "http://host:notaport",
            "http://host:0",
            "http://host:70000",
            "http://[::1",
            "http://host/a/b",
        ] {
            let err = ConnectionString::parse(bad).unwrap_err();
            assert!(err.is_argument(), "{bad:?} should be rejected");
        }
    }
}
