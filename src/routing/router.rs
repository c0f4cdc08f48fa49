//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Look up the matching route for a request
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan in priority order (acceptable for typical mock tables)
//! - Ties keep declaration order

use axum::body::Body;
use axum::http::{Method, Request};

use crate::config::RouteConfig;
use crate::routing::matcher::{AndMatcher, Matcher, MethodMatcher, PathMatcher, PathPrefixMatcher};

/// A compiled route.
#[derive(Debug)]
pub struct Route {
    /// Route name for logging/metrics.
    pub name: String,
    /// Id of the response served by this route.
    pub response: String,
    priority: u32,
    matcher: AndMatcher,
}

/// Ordered route table.
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Compile routes from configuration, highest priority first.
    ///
    /// Unparseable methods are rejected by config validation; a route that
    /// still carries one never matches.
    pub fn from_config(configs: Vec<RouteConfig>) -> Self {
        let mut routes: Vec<Route> = configs.into_iter().map(compile).collect();
        routes.sort_by(|a, b| b.priority.cmp(&a.priority));
        Self { routes }
    }

    /// Find the first route matching the request.
    pub fn match_request(&self, req: &Request<Body>) -> Option<&Route> {
        self.routes.iter().find(|r| r.matcher.matches(req))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

fn compile(config: RouteConfig) -> Route {
    let mut matchers: Vec<Box<dyn Matcher>> = Vec::new();
    if let Some(method) = &config.method {
        match Method::from_bytes(method.to_uppercase().as_bytes()) {
            Ok(method) => matchers.push(Box::new(MethodMatcher::new(method))),
            Err(_) => {
                tracing::warn!(route = %config.name, method = %method, "Route disabled: invalid method");
                matchers.push(Box::new(NeverMatcher));
            }
        }
    }
    if let Some(path) = config.path {
        matchers.push(Box::new(PathMatcher::new(path)));
    }
    if let Some(prefix) = config.path_prefix {
        matchers.push(Box::new(PathPrefixMatcher::new(prefix)));
    }

    Route {
        name: config.name,
        response: config.response,
        priority: config.priority,
        matcher: AndMatcher::new(matchers),
    }
}

#[derive(Debug)]
struct NeverMatcher;

impl Matcher for NeverMatcher {
    fn matches(&self, _req: &Request<Body>) -> bool {
        false
    }
}
