//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store routes built from route table commands
//! - Look up the matching route for a request host and path
//! - Pick a target of the matched route
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Routes with a host win over host-less routes, then the longest path prefix
//! - Explicit `None` rather than a silent default

use std::sync::Arc;

use crate::routing::matcher::{HostMatcher, Matcher, PathPrefixMatcher};
use crate::routing::parse::{self, Command, ParseError};
use crate::routing::target::Target;

/// All targets registered for one `[host]/path` source.
#[derive(Debug)]
pub struct Route {
    pub host: String,
    pub path: String,
    pub targets: Vec<Arc<Target>>,
    host_matcher: HostMatcher,
    path_matcher: PathPrefixMatcher,
}

impl Route {
    fn new(host: String, path: String) -> Self {
        Self {
            host_matcher: HostMatcher::new(host.clone()),
            path_matcher: PathPrefixMatcher::new(path.clone()),
            host,
            path,
            targets: Vec::new(),
        }
    }

    /// Whether the route accepts this host and encoded path.
    pub fn matches(&self, host: &str, path: &str) -> bool {
        self.host_matcher.matches(host, path) && self.path_matcher.matches(host, path)
    }

    /// Pick one target uniformly at random.
    pub fn pick_target(&self) -> Option<Arc<Target>> {
        match self.targets.len() {
            0 => None,
            1 => Some(self.targets[0].clone()),
            n => Some(self.targets[fastrand::usize(..n)].clone()),
        }
    }
}

/// The routing table.
#[derive(Debug, Default)]
pub struct Table {
    routes: Vec<Route>,
}

impl Table {
    /// Build a table by applying route table commands in order.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let mut table = Table::default();
        for command in parse::parse(input)? {
            table.apply(command);
        }
        tracing::debug!(routes = table.routes.len(), "Route table built");
        Ok(table)
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Add { host, path, target } => {
                let idx = match self.routes.iter().position(|r| r.host == host && r.path == path) {
                    Some(idx) => idx,
                    None => {
                        self.routes.push(Route::new(host, path));
                        self.routes.len() - 1
                    }
                };
                self.routes[idx].targets.push(Arc::new(target));
            }
            Command::Del { service, source, dst } => {
                for route in &mut self.routes {
                    if let Some((host, path)) = &source {
                        if route.host != *host || route.path != *path {
                            continue;
                        }
                    }
                    route.targets.retain(|t| {
                        t.service != service
                            || dst.as_ref().is_some_and(|d| t.url.to_string() != *d)
                    });
                }
                self.routes.retain(|r| !r.targets.is_empty());
            }
        }
    }

    /// Find the route for a request host and encoded path.
    pub fn lookup(&self, host: &str, path: &str) -> Option<&Route> {
        self.routes
            .iter()
            .filter(|r| r.matches(host, path))
            .max_by_key(|r| (!r.host_matcher.is_wildcard(), r.path_matcher.len()))
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
