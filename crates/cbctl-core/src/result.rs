//! HTTP results returned by management requests

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{AdminError, Result};

/// Longest body excerpt rendered into error messages
const BODY_EXCERPT_LEN: usize = 200;

/// Outcome of a single management request.
///
/// The fields are read-only: `success` is always derived from the status code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HttpResult {
    value: Value,
    http_status: u16,
    url: String,
}

impl HttpResult {
    /// Create a result from an already-parsed value
    pub fn new(url: impl Into<String>, http_status: u16, value: Value) -> Self {
        Self {
            value,
            http_status,
            url: url.into(),
        }
    }

    /// Create a result from a raw response body.
    ///
    /// JSON bodies are parsed; any other text becomes a JSON string and an
    /// empty body becomes `null`.
    pub fn from_body(url: impl Into<String>, http_status: u16, body: &str) -> Self {
        let trimmed = body.trim();
        let value = if trimmed.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
        };
        Self::new(url, http_status, value)
    }

    /// Parsed response body
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Consume the result, returning the parsed body
    pub fn into_value(self) -> Value {
        self.value
    }

    /// HTTP status code returned by the cluster
    pub fn http_status(&self) -> u16 {
        self.http_status
    }

    /// Path exactly as the caller requested it
    pub fn url(&self) -> &str {
        &self.url
    }

    /// True iff the status is in the 2xx range
    pub fn success(&self) -> bool {
        (200..300).contains(&self.http_status)
    }

    /// Decode the body into a typed structure
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        T::deserialize(&self.value).map_err(|source| AdminError::Decode {
            url: self.url.clone(),
            source: Box::new(source),
        })
    }

    /// Short, single-line rendering of the body for messages and logs
    pub fn body_text(&self) -> String {
        let text = match &self.value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        if text.chars().count() > BODY_EXCERPT_LEN {
            let excerpt: String = text.chars().take(BODY_EXCERPT_LEN).collect();
            format!("{excerpt}...")
        } else {
            text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_follows_status() {
        assert!(HttpResult::from_body("pools/", 200, "{}").success());
        assert!(HttpResult::from_body("pools/", 202, "").success());
        assert!(!HttpResult::from_body("pools/", 302, "").success());
        assert!(!HttpResult::from_body("pools/", 404, "").success());
        assert!(!HttpResult::from_body("pools/", 500, "").success());
    }

    #[test]
    fn test_body_parsing() {
        let result = HttpResult::from_body("pools/", 200, r#"{"isAdminCreds": true}"#);
        assert_eq!(result.value(), &json!({"isAdminCreds": true}));

        let result = HttpResult::from_body("/badpath", 404, "Requested resource not found.\r\n");
        assert_eq!(
            result.value(),
            &Value::String("Requested resource not found.".to_string())
        );

        let result = HttpResult::from_body("/pools/default/buckets/x", 200, "");
        assert!(result.value().is_null());
    }

    #[test]
    fn test_typed_decode_failure_names_url() {
        let result = HttpResult::from_body("/settings/rbac/users/local", 200, r#""oops""#);
        let err = result.json::<Vec<String>>().unwrap_err();
        assert!(matches!(err, AdminError::Decode { ref url, .. } if url == "/settings/rbac/users/local"));
    }

    #[test]
    fn test_body_text_is_truncated() {
        let long = "x".repeat(500);
        let result = HttpResult::new("/", 500, Value::String(long));
        assert!(result.body_text().len() < 300);
        assert!(result.body_text().ends_with("..."));
    }
}
