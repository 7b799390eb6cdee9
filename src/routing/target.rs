//! Route targets and redirect URL construction.
//!
//! # Responsibilities
//! - Carry one candidate destination of a route
//! - Build the concrete redirect URL for a request from the target template
//!
//! # Design Decisions
//! - Targets are immutable once loaded and shared via `Arc` across requests
//! - The redirect URL is returned per request instead of cached on the target
//! - `path` and `raw_path` are rewritten in lock-step so encodings like `%2f`
//!   inside a segment survive templating

use std::collections::HashMap;

use crate::url::Url;

/// Template token replaced by the request path.
pub const PLACEHOLDER: &str = "$path";

/// A single destination of a route.
#[derive(Debug, Clone, Default)]
pub struct Target {
    /// Name of the service the target URL points to.
    pub service: String,

    /// Tags of this target.
    pub tags: Vec<String>,

    /// Raw options as given in the route declaration.
    pub opts: HashMap<String, String>,

    /// Prefix removed from the front of the request path, as written
    /// (possibly percent-encoded).
    pub strip_path: String,

    /// Disables certificate validation for upstream TLS connections.
    pub tls_skip_verify: bool,

    /// Host header rewrite mode (`dst` uses the target host).
    pub host: String,

    /// Destination template, possibly containing `$path`.
    pub url: Url,

    /// Status code for redirects. `0` means the target is proxied, not redirected.
    pub redirect_code: u16,

    /// Configured weight. `0.0` means the weight is dynamic.
    pub fixed_weight: f64,

    /// Effective weight in percent.
    pub weight: f64,

    /// Name of the throughput/latency timer for this target.
    pub timer_name: String,

    /// Access rules keyed by rule kind (`allow`, `deny`).
    pub access_rules: HashMap<String, Vec<String>>,
}

impl Target {
    /// Build the redirect URL for `request` from this target's template.
    ///
    /// `$path` in the template is replaced by the request path (after
    /// `strip_path` is removed) and the request query is carried over unless
    /// the template has its own. Templates without `$path` yield a fixed URL.
    pub fn build_redirect_url(&self, request: &Url) -> Url {
        let mut redirect = Url {
            scheme: self.url.scheme.clone(),
            host: self.url.host.clone(),
            path: self.url.path.clone(),
            raw_path: self.url.raw_path.clone(),
            raw_query: self.url.raw_query.clone(),
        };

        // `http://bar.com$path` behaves as `http://bar.com/$path`
        if let Some(host) = redirect.host.strip_suffix(PLACEHOLDER) {
            redirect.host = host.to_string();
            redirect.path = PLACEHOLDER.to_string();
            redirect.raw_path.clear();
        }

        if redirect.raw_path.is_empty() && !request.raw_path.is_empty() {
            redirect.raw_path = redirect.path.clone();
        }

        // the request path brings its own leading slash
        let slash_placeholder = format!("/{PLACEHOLDER}");
        redirect.path = redirect.path.replacen(&slash_placeholder, PLACEHOLDER, 1);
        redirect.raw_path = redirect.raw_path.replacen(&slash_placeholder, PLACEHOLDER, 1);

        if redirect.path.contains(PLACEHOLDER) {
            redirect.path = redirect.path.replacen(PLACEHOLDER, &request.path, 1);
            if !self.strip_path.is_empty() {
                let decoded = Url::parse(&self.strip_path)
                    .map(|u| u.path)
                    .unwrap_or_default();
                if let Some(rest) = redirect.path.strip_prefix(decoded.as_str()) {
                    redirect.path = rest.to_string();
                }
            }
            if redirect.raw_query.is_empty() && !request.raw_query.is_empty() {
                redirect.raw_query = request.raw_query.clone();
            }
        }

        if redirect.raw_path.contains(PLACEHOLDER) {
            redirect.raw_path = redirect
                .raw_path
                .replacen(PLACEHOLDER, &request.escaped_path(), 1);
            if !self.strip_path.is_empty() {
                if let Some(rest) = redirect.raw_path.strip_prefix(self.strip_path.as_str()) {
                    redirect.raw_path = rest.to_string();
                }
            }
        }

        if redirect.path.is_empty() {
            redirect.path = "/".to_string();
        }

        // decoded and raw strip can diverge; never leave a raw path for another path
        if !redirect.raw_path.is_empty() && redirect.escaped_path() != redirect.raw_path {
            redirect.raw_path.clear();
        }

        tracing::trace!(
            service = %self.service,
            path = %redirect.path,
            raw_path = %redirect.raw_path,
            redirect = %redirect,
            "Built redirect URL"
        );

        redirect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(dst: &str, strip: &str) -> Target {
        Target {
            service: "svc".to_string(),
            url: Url::parse(dst).unwrap(),
            strip_path: strip.to_string(),
            redirect_code: 301,
            ..Default::default()
        }
    }

    fn request(path: &str) -> Url {
        Url::parse(&format!("http://foo.com{path}")).unwrap()
    }

    #[test]
    fn test_fixed_template_ignores_request() {
        let t = target("http://bar.com/a/b/c?foo=bar", "");
        let first = t.build_redirect_url(&request("/")).to_string();
        for req in ["/abc", "/a%2fb/c", "/?aaa=1", "/x%20y?b=2"] {
            assert_eq!(t.build_redirect_url(&request(req)).to_string(), first);
        }
        assert_eq!(first, "http://bar.com/a/b/c?foo=bar");
    }

    #[test]
    fn test_template_query_takes_precedence() {
        let t = target("http://bar.com/$path?foo=bar", "");
        let redirect = t.build_redirect_url(&request("/abc?aaa=1"));
        assert_eq!(redirect.raw_query, "foo=bar");
        assert_eq!(redirect.to_string(), "http://bar.com/abc?foo=bar");
    }

    #[test]
    fn test_path_pass_through() {
        let t = target("http://bar.com/$path", "");
        let req = request("/a%2fb/c%20d");
        let redirect = t.build_redirect_url(&req);
        assert_eq!(redirect.path, req.path);
        assert_eq!(redirect.raw_path, req.raw_path);
    }

    #[test]
    fn test_empty_path_becomes_slash() {
        let t = target("http://bar.com/$path", "/stripme");
        let redirect = t.build_redirect_url(&request("/stripme"));
        assert_eq!(redirect.path, "/");
        assert_eq!(redirect.to_string(), "http://bar.com/");

        let t = target("http://bar.com", "");
        assert_eq!(t.build_redirect_url(&request("/abc")).path, "/");
    }

    #[test]
    fn test_raw_path_decodes_to_path() {
        let t = target("http://bar.com/b%2fb/$path", "");
        let redirect = t.build_redirect_url(&request("/%22"));
        assert_eq!(redirect.path, "/b/b/\"");
        assert_eq!(redirect.raw_path, "/b%2fb/%22");
        assert_eq!(redirect.escaped_path(), redirect.raw_path);
    }

    #[test]
    fn test_host_placeholder_matches_slash_placeholder() {
        let embedded = target("http://bar.com$path", "");
        let separated = target("http://bar.com/$path", "");
        for req in ["/", "/abc", "/a%2fbc", "/x?y=1"] {
            assert_eq!(
                embedded.build_redirect_url(&request(req)).to_string(),
                separated.build_redirect_url(&request(req)).to_string(),
                "request {req}"
            );
        }
    }

    #[test]
    fn test_only_first_placeholder_is_replaced() {
        let t = target("http://bar.com/x$path/y$path", "");
        let redirect = t.build_redirect_url(&request("/abc"));
        assert_eq!(redirect.path, "/x/abc/y$path");
    }

    #[test]
    fn test_malformed_strip_path_disables_stripping() {
        let t = target("http://bar.com/$path", "/strip%zz");
        let redirect = t.build_redirect_url(&request("/stripme/abc"));
        assert_eq!(redirect.to_string(), "http://bar.com/stripme/abc");
    }

    #[test]
    fn test_raw_path_cleared_when_only_decoded_strip_matches() {
        let t = target("http://bar.com/$path", "/strip%2fme");
        let redirect = t.build_redirect_url(&request("/strip/me/ab%2fc"));
        assert_eq!(redirect.path, "/ab/c");
        assert_eq!(redirect.raw_path, "");
        assert_eq!(redirect.to_string(), "http://bar.com/ab/c");
    }

    #[test]
    fn test_inputs_are_not_mutated() {
        let t = target("http://bar.com/b%2fb/$path", "/strip");
        let before = t.url.clone();
        let req = request("/strip/a%2fb?q=1");
        let req_before = req.clone();
        let _ = t.build_redirect_url(&req);
        assert_eq!(t.url, before);
        assert_eq!(t.strip_path, "/strip");
        assert_eq!(req, req_before);
    }
}
