//! Request handlers.
//!
//! # Data Flow
//! ```text
//! routing (matched Route)
//!     → Handler::handle(HandlerRequest { context, query, logger })
//!     → HandlerResult { status, body }
//!     → service renders the ResponseEnvelope
//! ```
//!
//! # Design Decisions
//! - Handlers are pure mappings from parsed input to a result; they never
//!   touch the transport
//! - Each handler logs its own outcome against the request context
//! - A handler `Err` becomes the fixed 500 body at the service boundary

pub mod echo;
pub mod greeting;
pub mod health;

use std::collections::HashMap;

use axum::http::StatusCode;
use serde_json::{json, Map, Value};

use crate::error::HandlerError;
use crate::observability::context::utc_timestamp;
use crate::observability::{RequestContext, StructuredLogger};

pub use echo::Echo;
pub use greeting::Greeting;
pub use health::Health;

/// Decoded query-string parameters.
pub type QueryParams = HashMap<String, String>;

pub const NOT_FOUND_MESSAGE: &str = "Endpoint not found";
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method not allowed";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Everything a handler may read for one request.
#[derive(Debug, Clone, Copy)]
pub struct HandlerRequest<'a> {
    pub context: &'a RequestContext,
    pub query: &'a QueryParams,
    pub logger: &'a StructuredLogger,
}

/// Status code plus JSON object body produced by a handler.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerResult {
    pub status: StatusCode,
    pub body: Map<String, Value>,
}

impl HandlerResult {
    /// Wrap a JSON value; non-object values land under `data`.
    pub fn new(status: StatusCode, body: Value) -> Self {
        let body = match body {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        Self { status, body }
    }

    /// The fixed error shape: `{error, status_code, timestamp, request_id}`.
    pub fn error(status: StatusCode, message: &str, context: &RequestContext) -> Self {
        Self::new(
            status,
            json!({
                "error": message,
                "status_code": status.as_u16(),
                "timestamp": utc_timestamp(),
                "request_id": context.correlation_id(),
            }),
        )
    }

    pub fn not_found(context: &RequestContext) -> Self {
        Self::error(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE, context)
    }

    pub fn method_not_allowed(context: &RequestContext) -> Self {
        Self::error(StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED_MESSAGE, context)
    }

    pub fn internal_error(context: &RequestContext) -> Self {
        Self::error(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE, context)
    }
}

/// A single business operation.
pub trait Handler: Send + Sync {
    /// Stable name used for logs and metric labels.
    fn name(&self) -> &'static str;

    fn handle(&self, request: &HandlerRequest<'_>) -> Result<HandlerResult, HandlerError>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_shape() {
        let ctx = RequestContext::with_id("r-1");
        let result = HandlerResult::not_found(&ctx);
        assert_eq!(result.status, StatusCode::NOT_FOUND);
        assert_eq!(result.body["error"], "Endpoint not found");
        assert_eq!(result.body["status_code"], 404);
        assert_eq!(result.body["request_id"], "r-1");
        assert!(result.body["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_non_object_body_is_wrapped() {
        let result = HandlerResult::new(StatusCode::OK, json!([1, 2]));
        assert_eq!(result.body["data"], json!([1, 2]));
    }
}
