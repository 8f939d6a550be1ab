//! Request lifecycle shared by the HTTP server and the invocation-event adapter.
//!
//! # Data Flow
//! ```text
//! ApiRequest (method, path, query, headers)
//!     → RequestContext::begin          (correlation id + start instant)
//!     → log "Incoming request"
//!     → RouteTable::resolve            (handler | 405 | 404)
//!     → Handler::handle                (Err or panic → fixed 500 body)
//!     → ResponseEnvelope::render       (body stamps + monitoring headers)
//!     → metrics + log "Request completed"
//! ```
//!
//! `handle` never fails: every outcome is an envelope.

use std::net::SocketAddr;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use axum::http::{HeaderMap, Method};
use serde_json::json;

use crate::config::ApiConfig;
use crate::error::{panic_message, HandlerError};
use crate::handlers::{Echo, Greeting, HandlerRequest, HandlerResult, Health, QueryParams};
use crate::health::{ProcessStart, SysinfoProbe};
use crate::http::response::ResponseEnvelope;
use crate::observability::{metrics, RequestContext, StructuredLogger};
use crate::routing::{RouteMatch, RouteTable};

/// One inbound call, independent of the surface it arrived on.
#[derive(Debug, Clone, Copy)]
pub struct ApiRequest<'a> {
    pub method: &'a Method,
    pub path: &'a str,
    pub query: &'a QueryParams,
    pub headers: &'a HeaderMap,
    pub remote_addr: Option<SocketAddr>,
}

/// Route table plus the logging collaborator.
#[derive(Debug)]
pub struct ApiService {
    routes: RouteTable,
    logger: Arc<StructuredLogger>,
}

impl ApiService {
    pub fn new(routes: RouteTable, logger: Arc<StructuredLogger>) -> Self {
        Self { routes, logger }
    }

    /// Standard routes wired to the process start instant and a `sysinfo` probe.
    pub fn from_config(config: &ApiConfig, start: ProcessStart, logger: Arc<StructuredLogger>) -> Self {
        let routes = RouteTable::standard(
            Greeting,
            Echo,
            Health::new(&config.service, Arc::new(start), Arc::new(SysinfoProbe::new())),
        );
        Self::new(routes, logger)
    }

    pub fn logger(&self) -> &StructuredLogger {
        &self.logger
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn handle(&self, request: &ApiRequest<'_>) -> ResponseEnvelope {
        let mut ctx = RequestContext::begin(request.headers);
        let user_agent = request
            .headers
            .get(axum::http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok());

        self.logger.info(
            "Incoming request",
            Some(&ctx),
            Some(json!({
                "method": request.method.as_str(),
                "path": request.path,
                "query_params": request.query,
                "user_agent": user_agent,
                "remote_addr": request.remote_addr.map(|a| a.to_string()),
            })),
        );

        let (route_label, result, allowed) = self.dispatch(request, &ctx);

        let mut envelope = ResponseEnvelope::render(result, &mut ctx);
        if let Some(allowed) = allowed {
            envelope = envelope.with_header("Allow", allowed);
        }

        let elapsed_ms = ctx.elapsed_ms().unwrap_or(0.0);
        metrics::record_request(request.method, route_label, envelope.status_code, elapsed_ms);

        self.logger.info(
            "Request completed",
            Some(&ctx),
            Some(json!({
                "status_code": envelope.status_code,
                "response_size": envelope.body.len(),
            })),
        );

        envelope
    }

    fn dispatch(
        &self,
        request: &ApiRequest<'_>,
        ctx: &RequestContext,
    ) -> (&'static str, HandlerResult, Option<String>) {
        match self.routes.resolve(request.method, request.path) {
            RouteMatch::Found(route) => {
                let handler_request = HandlerRequest {
                    context: ctx,
                    query: request.query,
                    logger: &self.logger,
                };
                let name = route.handler.name();
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| route.handler.handle(&handler_request)))
                    .unwrap_or_else(|payload| Err(HandlerError::Panicked(panic_message(payload.as_ref()))));
                match outcome {
                    Ok(result) => (name, result, None),
                    Err(e) => {
                        self.logger.error(
                            "Internal server error",
                            Some(ctx),
                            Some(json!({
                                "endpoint": route.path,
                                "error": e.to_string(),
                                "error_type": "500_internal_error",
                            })),
                        );
                        (name, HandlerResult::internal_error(ctx), None)
                    }
                }
            }
            RouteMatch::MethodNotAllowed(allowed) => {
                self.logger.warn(
                    "405 error occurred",
                    Some(ctx),
                    Some(json!({
                        "path": request.path,
                        "method": request.method.as_str(),
                        "error_type": "405_method_not_allowed",
                    })),
                );
                let allow = allowed
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                ("method_not_allowed", HandlerResult::method_not_allowed(ctx), Some(allow))
            }
            RouteMatch::NotFound => {
                self.logger.warn(
                    "404 error occurred",
                    Some(ctx),
                    Some(json!({
                        "path": request.path,
                        "method": request.method.as_str(),
                        "error_type": "404_not_found",
                    })),
                );
                ("not_found", HandlerResult::not_found(ctx), None)
            }
        }
    }
}
