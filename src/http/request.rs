//! Request handling.
//!
//! # Responsibilities
//! - Extract routing-relevant information (host, path, query)
//! - Keep the request path exactly as the client encoded it
//! - Read the request ID assigned by the request-id layer

use axum::body::Body;
use axum::http::{header, Request};

use crate::url::{Url, UrlError};

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// The request URL with both path representations.
///
/// The path is taken from the raw request target, so escapes like `%2f`
/// survive into `raw_path`.
pub fn request_url(req: &Request<Body>) -> Result<Url, UrlError> {
    let mut url = Url {
        host: request_host(req).to_string(),
        raw_query: req.uri().query().unwrap_or_default().to_string(),
        ..Default::default()
    };
    url.set_path(req.uri().path())?;
    Ok(url)
}

/// Host header, falling back to the authority of an absolute-form target.
pub fn request_host(req: &Request<Body>) -> &str {
    req.headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| req.uri().authority().map(|a| a.as_str()))
        .unwrap_or_default()
}

/// Request ID set by the request-id layer, or `"unknown"`.
pub fn request_id(req: &Request<Body>) -> String {
    req.headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_url_keeps_raw_path() {
        let req = Request::builder()
            .uri("/strip%2fme/ab%2fc?aaa=1")
            .header("Host", "foo.com")
            .body(Body::empty())
            .unwrap();
        let url = request_url(&req).unwrap();
        assert_eq!(url.host, "foo.com");
        assert_eq!(url.path, "/strip/me/ab/c");
        assert_eq!(url.raw_path, "/strip%2fme/ab%2fc");
        assert_eq!(url.raw_query, "aaa=1");
    }

    #[test]
    fn test_double_slash_is_a_path() {
        let req = Request::builder().uri("//foo/bar").body(Body::empty()).unwrap();
        let url = request_url(&req).unwrap();
        assert_eq!(url.host, "");
        assert_eq!(url.path, "//foo/bar");
    }

    #[test]
    fn test_host_from_absolute_target() {
        let req = Request::builder()
            .uri("http://example.com:8080/x")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_host(&req), "example.com:8080");
        assert_eq!(request_id(&req), "unknown");
    }
}
