//! Invocation-event adapter.
//!
//! # Responsibilities
//! - Parse the raw event into an [`InvocationEvent`]
//! - Run it through the same [`ApiService`] lifecycle as the HTTP server
//! - Add the CORS headers API Gateway clients expect
//! - Convert every fault, panics included, into a 500 envelope
//!
//! # Design Decisions
//! - Routing always uses `GET`: the gateway already filters verbs and the
//!   deployed routes are read-only, so the event method is only logged
//! - The 500 body embeds the invocation id, or `"unknown"` without a context

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use axum::http::Method;
use lambda_runtime::LambdaEvent;
use serde_json::{json, Value};

use crate::config::CorsConfig;
use crate::error::{panic_message, EventError};
use crate::handlers::INTERNAL_ERROR_MESSAGE;
use crate::http::response::ResponseEnvelope;
use crate::lambda::event::InvocationEvent;
use crate::observability::context::{round2, utc_timestamp};
use crate::service::{ApiRequest, ApiService};

/// Invocation id reported when no context was supplied.
pub const UNKNOWN_INVOCATION: &str = "unknown";

/// Per-invocation metadata supplied by the platform.
pub trait InvocationContext {
    fn invocation_id(&self) -> &str;
}

impl InvocationContext for lambda_runtime::Context {
    fn invocation_id(&self) -> &str {
        &self.request_id
    }
}

#[derive(Debug, Clone)]
pub struct EventAdapter {
    service: Arc<ApiService>,
    cors: CorsConfig,
}

impl EventAdapter {
    pub fn new(service: Arc<ApiService>, cors: CorsConfig) -> Self {
        Self { service, cors }
    }

    /// Entry point for `lambda_runtime::service_fn`. Never returns `Err`.
    pub async fn handle_lambda(
        &self,
        event: LambdaEvent<Value>,
    ) -> Result<ResponseEnvelope, lambda_runtime::Error> {
        let (payload, context) = event.into_parts();
        Ok(self.handle(payload, Some(&context as &dyn InvocationContext)))
    }

    /// Turn one event into a response envelope.
    pub fn handle(&self, event: Value, context: Option<&dyn InvocationContext>) -> ResponseEnvelope {
        let started = Instant::now();
        let invocation_id = context
            .map(|c| c.invocation_id().to_string())
            .unwrap_or_else(|| UNKNOWN_INVOCATION.to_string());

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.process(event, &invocation_id)))
            .unwrap_or_else(|payload| Err(EventError::Panicked(panic_message(payload.as_ref()))));

        let envelope = match outcome {
            Ok(envelope) => envelope,
            Err(e) => self.fault(&e, &invocation_id, started),
        };

        self.with_cors(envelope)
    }

    fn process(&self, event: Value, invocation_id: &str) -> Result<ResponseEnvelope, EventError> {
        let logger = self.service.logger();
        logger.info(
            "Received event",
            None,
            Some(json!({ "invocation_id": invocation_id, "event": &event })),
        );

        let event = InvocationEvent::from_value(event)?;

        logger.info(
            "Processing request",
            None,
            Some(json!({
                "invocation_id": invocation_id,
                "method": event.method,
                "path": event.path,
                "event_format": event.format.as_str(),
            })),
        );

        let envelope = self.service.handle(&ApiRequest {
            method: &Method::GET,
            path: &event.path,
            query: &event.query_parameters,
            headers: &event.headers,
            remote_addr: None,
        });

        logger.info(
            "Returning response",
            None,
            Some(json!({ "invocation_id": invocation_id, "status_code": envelope.status_code })),
        );

        Ok(envelope)
    }

    fn fault(&self, error: &EventError, invocation_id: &str, started: Instant) -> ResponseEnvelope {
        self.service.logger().error(
            "Error processing request",
            None,
            Some(json!({ "invocation_id": invocation_id, "error": error.to_string() })),
        );

        let body = json!({
            "error": INTERNAL_ERROR_MESSAGE,
            "status_code": 500,
            "message": error.to_string(),
            "timestamp": utc_timestamp(),
            "request_id": invocation_id,
        });
        let elapsed_ms = round2(started.elapsed().as_secs_f64() * 1000.0);

        ResponseEnvelope::json(500, body.to_string(), invocation_id, elapsed_ms)
    }

    fn with_cors(&self, envelope: ResponseEnvelope) -> ResponseEnvelope {
        envelope
            .with_header("Access-Control-Allow-Origin", self.cors.allow_origin.clone())
            .with_header("Access-Control-Allow-Methods", self.cors.allow_methods.clone())
            .with_header("Access-Control-Allow-Headers", self.cors.allow_headers.clone())
    }
}
