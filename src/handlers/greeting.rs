//! `GET /hello`.

use axum::http::StatusCode;
use serde_json::json;

use crate::error::HandlerError;
use crate::handlers::{Handler, HandlerRequest, HandlerResult};
use crate::observability::context::utc_timestamp;

pub const GREETING: &str = "Hello World";

/// Version reported by `/hello`. Fixed; `service.version` is reported by `/health` only.
pub const GREETING_VERSION: &str = "1.0.0";

/// Static greeting.
#[derive(Debug, Clone, Copy, Default)]
pub struct Greeting;

impl Handler for Greeting {
    fn name(&self) -> &'static str {
        "hello"
    }

    fn handle(&self, request: &HandlerRequest<'_>) -> Result<HandlerResult, HandlerError> {
        let ctx = request.context;

        request.logger.info(
            "Hello endpoint processed successfully",
            Some(ctx),
            Some(json!({ "endpoint": "/hello", "response_message": GREETING })),
        );

        Ok(HandlerResult::new(
            StatusCode::OK,
            json!({
                "message": GREETING,
                "timestamp": utc_timestamp(),
                "version": GREETING_VERSION,
                "request_id": ctx.correlation_id(),
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{fixture, query};

    #[test]
    fn test_greeting() {
        let (logger, capture, ctx) = fixture("hello-1");
        let query = query(&[]);
        let request = HandlerRequest { context: &ctx, query: &query, logger: &logger };

        let result = Greeting.handle(&request).unwrap();

        assert_eq!(result.status, StatusCode::OK);
        assert_eq!(result.body["message"], "Hello World");
        assert_eq!(result.body["version"], "1.0.0");
        assert_eq!(result.body["request_id"], "hello-1");
        assert_eq!(capture.with_message("Hello endpoint processed successfully").len(), 1);
    }
}
