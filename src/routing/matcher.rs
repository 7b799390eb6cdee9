//! Route matching logic.
//!
//! # Responsibilities
//! - Match host (exact match, case-insensitive, port ignored)
//! - Match encoded path prefix (case-sensitive, escapes as the client sent them)
//!
//! # Design Decisions
//! - Empty host condition = matches any host (wildcard)
//! - Matching works on plain `&str` so it is independent of the HTTP types

/// Trait for matching a request host and path against a condition.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, host: &str, path: &str) -> bool;
}

/// Matches the request host.
#[derive(Debug, Clone)]
pub struct HostMatcher {
    expected_host: String,
}

impl HostMatcher {
    /// Create a new host matcher.
    /// The host is normalized to lowercase for case-insensitive matching.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            expected_host: host.into().to_lowercase(),
        }
    }

    /// Whether this matcher accepts every host.
    pub fn is_wildcard(&self) -> bool {
        self.expected_host.is_empty()
    }
}

impl Matcher for HostMatcher {
    fn matches(&self, host: &str, _path: &str) -> bool {
        if self.is_wildcard() {
            return true;
        }
        strip_port(host).eq_ignore_ascii_case(&self.expected_host)
    }
}

/// Matches the request path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.prefix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefix.is_empty()
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, _host: &str, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }
}

/// Drop a trailing `:port`, leaving IPv6 literals intact.
fn strip_port(host: &str) -> &str {
    match host.rfind(':') {
        Some(idx) if !host[idx..].contains(']') => &host[..idx],
        _ => host,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_matcher() {
        let matcher = HostMatcher::new("example.com");
        assert!(matcher.matches("example.com", "/"));
        assert!(matcher.matches("EXAMPLE.COM", "/")); // Case insensitive
        assert!(matcher.matches("example.com:8080", "/"));
        assert!(!matcher.matches("other.com", "/"));

        let any = HostMatcher::new("");
        assert!(any.is_wildcard());
        assert!(any.matches("whatever.org", "/"));
    }

    #[test]
    fn test_strip_port() {
        assert_eq!(strip_port("[::1]:80"), "[::1]");
        assert_eq!(strip_port("[::1]"), "[::1]");
        assert_eq!(strip_port("host"), "host");
    }

    #[test]
    fn test_path_matcher() {
        let matcher = PathPrefixMatcher::new("/api");
        assert!(matcher.matches("example.com", "/api/v1"));
        assert!(!matcher.matches("example.com", "/images"));
        assert!(!matcher.matches("example.com", "/API"));
    }
}
