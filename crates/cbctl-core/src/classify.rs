//! Maps cluster responses and transport failures onto [`AdminError`]
//!
//! Classification is pure: it only inspects the status code, body and error
//! value it is handed.

use tracing::debug;

use crate::error::{AdminError, Result};
use crate::result::HttpResult;

/// Coarse outcome of a response status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    /// 2xx
    Success,
    /// 401 or 403
    Auth,
    /// Any other status
    Http,
}

/// Classify an HTTP status code
pub fn classify_status(status: u16) -> StatusKind {
    match status {
        200..=299 => StatusKind::Success,
        401 | 403 => StatusKind::Auth,
        _ => StatusKind::Http,
    }
}

/// Turn a non-success result into the matching error.
///
/// Callers should only pass failed results; a successful one is still
/// reported as [`AdminError::Http`] so the payload is never lost.
pub fn classify(result: HttpResult) -> AdminError {
    match classify_status(result.http_status()) {
        StatusKind::Auth => {
            let detail = result.body_text();
            let message = if detail.is_empty() {
                format!(
                    "{} {}: credentials rejected for '{}'",
                    result.http_status(),
                    status_reason(result.http_status()),
                    result.url()
                )
            } else {
                format!(
                    "{} {}: {}",
                    result.http_status(),
                    status_reason(result.http_status()),
                    detail
                )
            };
            AdminError::Auth { message }
        }
        StatusKind::Success | StatusKind::Http => AdminError::Http(Box::new(result)),
    }
}

/// Pass successful results through and classify everything else
pub fn check(result: HttpResult) -> Result<HttpResult> {
    if result.success() {
        Ok(result)
    } else {
        Err(classify(result))
    }
}

/// Map a `reqwest` failure (no HTTP status obtained) to a network error
pub fn from_transport_error(err: reqwest::Error) -> AdminError {
    let message = if err.is_timeout() {
        format!("request timed out: {}", err)
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else if err.is_builder() {
        format!("could not build HTTP client or request: {}", err)
    } else {
        err.to_string()
    };
    AdminError::Network {
        message,
        source: Some(err),
    }
}

/// Map a failure to read the body of a response that did carry a status
pub fn from_body_error(path: &str, status: u16, err: reqwest::Error) -> AdminError {
    debug!("Reading body of {} (HTTP {}) failed: {}", path, status, err);
    AdminError::Decode {
        url: path.to_string(),
        source: Box::new(err),
    }
}

fn status_reason(status: u16) -> &'static str {
    match status {
        401 => "Unauthorized",
        403 => "Forbidden",
        _ => "Error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_error_is_not_a_network_error() {
        let err = reqwest::Client::new()
            .get("not a url")
            .build()
            .unwrap_err();
        let err = from_body_error("/pools", 200, err);
        assert!(matches!(err, AdminError::Decode { ref url, .. } if url == "/pools"));
        assert!(!err.is_network());
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(200), StatusKind::Success);
        assert_eq!(classify_status(202), StatusKind::Success);
        assert_eq!(classify_status(401), StatusKind::Auth);
        assert_eq!(classify_status(403), StatusKind::Auth);
        assert_eq!(classify_status(400), StatusKind::Http);
        assert_eq!(classify_status(404), StatusKind::Http);
        assert_eq!(classify_status(500), StatusKind::Http);
        assert_eq!(classify_status(302), StatusKind::Http);
    }

    #[test]
    fn test_unauthorized_becomes_auth_error() {
        let err = classify(HttpResult::from_body("/pools", 401, ""));
        assert!(err.is_auth());
        assert!(err.to_string().contains("401"));
    }

    #[test]
    fn test_forbidden_keeps_detail() {
        let body = r#"{"message":"Forbidden. User needs one of the following permissions","permissions":["cluster.admin.security!write"]}"#;
        let err = classify(HttpResult::from_body("/settings/rbac/users/local/x", 403, body));
        assert!(err.is_auth());
        assert!(err.to_string().contains("permissions"));
    }

    #[test]
    fn test_other_failures_carry_result() {
        let err = classify(HttpResult::from_body(
            "/badpath",
            404,
            "Requested resource not found.",
        ));
        let result = err.http_result().expect("payload");
        assert_eq!(result.url(), "/badpath");
        assert_eq!(result.http_status(), 404);
    }

    #[test]
    fn test_check_is_deterministic() {
        let ok = HttpResult::from_body("pools/", 200, "{}");
        assert_eq!(check(ok.clone()).unwrap(), ok);

        let bad = HttpResult::from_body("/pools/default/buckets", 400, r#"{"errors":{"name":"Bucket with given name already exists"}}"#);
        for _ in 0..2 {
            let err = check(bad.clone()).unwrap_err();
            assert_eq!(err.http_status(), Some(400));
        }
    }
}
