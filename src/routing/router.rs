//! Route lookup.
//!
//! # Responsibilities
//! - Store the `(method, path) → handler` table
//! - Resolve a request to a handler, a 405 or a 404
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Exact, case-sensitive path match; `/hello/` is not `/hello`
//! - Explicit outcome enum rather than a silent default

use std::sync::Arc;

use axum::http::Method;

use crate::handlers::{Echo, Greeting, Handler, Health};

/// One registered route.
#[derive(Clone)]
pub struct Route {
    pub method: Method,
    pub path: &'static str,
    pub handler: Arc<dyn Handler>,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("handler", &self.handler.name())
            .finish()
    }
}

/// Result of resolving a request against the table.
#[derive(Debug, Clone)]
pub enum RouteMatch<'a> {
    Found(&'a Route),
    /// Path is known but not for this method; carries the allowed methods.
    MethodNotAllowed(Vec<Method>),
    NotFound,
}

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The API's route set: `/hello`, `/echo` and `/health`, all `GET`.
    pub fn standard(greeting: Greeting, echo: Echo, health: Health) -> Self {
        Self::new()
            .route(Method::GET, "/hello", Arc::new(greeting))
            .route(Method::GET, "/echo", Arc::new(echo))
            .route(Method::GET, "/health", Arc::new(health))
    }

    /// Register a route. A later registration for the same key replaces the earlier one.
    pub fn route(mut self, method: Method, path: &'static str, handler: Arc<dyn Handler>) -> Self {
        self.routes.retain(|r| !(r.method == method && r.path == path));
        self.routes.push(Route {
            method,
            path,
            handler,
        });
        self
    }

    pub fn resolve(&self, method: &Method, path: &str) -> RouteMatch<'_> {
        let mut allowed = Vec::new();

        for route in self.routes.iter().filter(|r| r.path == path) {
            if route.method == *method {
                return RouteMatch::Found(route);
            }
            allowed.push(route.method.clone());
        }

        if allowed.is_empty() {
            RouteMatch::NotFound
        } else {
            RouteMatch::MethodNotAllowed(allowed)
        }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use crate::health::{NoProcessMetrics, ProcessStart};

    fn table() -> RouteTable {
        let service = ServiceConfig::default();
        RouteTable::standard(
            Greeting,
            Echo,
            Health::new(&service, Arc::new(ProcessStart::now()), Arc::new(NoProcessMetrics)),
        )
    }

    #[test]
    fn test_resolves_known_routes() {
        let table = table();
        for (path, name) in [("/hello", "hello"), ("/echo", "echo"), ("/health", "health")] {
            match table.resolve(&Method::GET, path) {
                RouteMatch::Found(route) => assert_eq!(route.handler.name(), name),
                other => panic!("expected match for {path}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_wrong_method_is_405() {
        match table().resolve(&Method::POST, "/hello") {
            RouteMatch::MethodNotAllowed(allowed) => assert_eq!(allowed, vec![Method::GET]),
            other => panic!("expected 405, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_path_is_404() {
        let table = table();
        assert!(matches!(table.resolve(&Method::GET, "/nope"), RouteMatch::NotFound));
        assert!(matches!(table.resolve(&Method::GET, "/hello/"), RouteMatch::NotFound));
        assert!(matches!(table.resolve(&Method::GET, "/HELLO"), RouteMatch::NotFound));
    }

    #[test]
    fn test_reregistering_replaces() {
        let table = table().route(Method::GET, "/hello", Arc::new(Echo));
        assert_eq!(table.routes().len(), 3);
        match table.resolve(&Method::GET, "/hello") {
            RouteMatch::Found(route) => assert_eq!(route.handler.name(), "echo"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
