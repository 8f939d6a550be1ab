//! `GET /health`.
//!
//! Returns 200 with a health payload under normal operation. Any fault while
//! assembling the payload turns into a 503 `unhealthy` body here; nothing
//! escapes this handler as an `Err`.

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::{json, Map, Value};

use crate::config::ServiceConfig;
use crate::error::HandlerError;
use crate::handlers::{Handler, HandlerRequest, HandlerResult};
use crate::health::{ProcessMetrics, UptimeSource};
use crate::observability::context::utc_timestamp;
use crate::observability::RequestContext;

pub const UNHEALTHY_MESSAGE: &str = "Health check failed";
pub const METRICS_UNAVAILABLE: &str = "System metrics unavailable";

#[derive(Debug, Clone)]
pub struct Health {
    version: String,
    environment: String,
    uptime: Arc<dyn UptimeSource>,
    metrics: Arc<dyn ProcessMetrics>,
}

impl Health {
    pub fn new(
        service: &ServiceConfig,
        uptime: Arc<dyn UptimeSource>,
        metrics: Arc<dyn ProcessMetrics>,
    ) -> Self {
        Self {
            version: service.version.clone(),
            environment: service.environment.clone(),
            uptime,
            metrics,
        }
    }

    fn payload(&self, ctx: &RequestContext) -> Result<Map<String, Value>, HandlerError> {
        let uptime_seconds = self.uptime.uptime_seconds()?;

        let metrics = match self.metrics.sample() {
            Some(snapshot) => serde_json::to_value(snapshot)
                .map_err(|e| HandlerError::Health(format!("encoding metrics: {e}")))?,
            None => json!({ "note": METRICS_UNAVAILABLE }),
        };

        let body = json!({
            "status": "healthy",
            "timestamp": utc_timestamp(),
            "version": self.version,
            "environment": self.environment,
            "request_id": ctx.correlation_id(),
            "uptime_seconds": uptime_seconds,
            "checks": {
                "application": "ok",
                "memory": "ok",
                "dependencies": "ok",
            },
            "metrics": metrics,
        });

        match body {
            Value::Object(map) => Ok(map),
            _ => Err(HandlerError::Health("payload is not an object".to_string())),
        }
    }
}

impl Handler for Health {
    fn name(&self) -> &'static str {
        "health"
    }

    fn handle(&self, request: &HandlerRequest<'_>) -> Result<HandlerResult, HandlerError> {
        let ctx = request.context;

        match self.payload(ctx) {
            Ok(body) => {
                request.logger.info(
                    "Health check performed",
                    Some(ctx),
                    Some(json!({ "endpoint": "/health", "health_status": "healthy" })),
                );
                Ok(HandlerResult {
                    status: StatusCode::OK,
                    body,
                })
            }
            Err(e) => {
                request.logger.error(
                    "Error in health endpoint",
                    Some(ctx),
                    Some(json!({ "endpoint": "/health", "error": e.to_string() })),
                );
                Ok(HandlerResult::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    json!({
                        "status": "unhealthy",
                        "error": UNHEALTHY_MESSAGE,
                        "timestamp": utc_timestamp(),
                        "request_id": ctx.correlation_id(),
                    }),
                ))
            }
        }
    }
}
