//! Response rendering.
//!
//! # Responsibilities
//! - Turn a `HandlerResult` plus its `RequestContext` into a `ResponseEnvelope`
//! - Stamp `request_id`/`timestamp` into the body and the monitoring headers
//! - Convert envelopes into axum responses for the HTTP surface
//!
//! The same envelope serializes as `{statusCode, headers, body}` for the
//! invocation-event surface.

use std::collections::BTreeMap;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::handlers::{HandlerResult, INTERNAL_ERROR_MESSAGE};
use crate::observability::context::utc_timestamp;
use crate::observability::RequestContext;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";
pub const RESPONSE_TIME_HEADER: &str = "X-Response-Time";
pub const APPLICATION_JSON: &str = "application/json";

/// Final representation of a response on either surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl ResponseEnvelope {
    /// Render a handler result, finalizing the context's timing.
    pub fn render(result: HandlerResult, context: &mut RequestContext) -> Self {
        let mut body = result.body;
        body.insert("request_id".to_string(), json!(context.correlation_id()));
        if !body.contains_key("timestamp") {
            body.insert("timestamp".to_string(), json!(utc_timestamp()));
        }

        let body = serde_json::to_string(&body).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to encode response body");
            json!({
                "error": INTERNAL_ERROR_MESSAGE,
                "status_code": 500,
                "timestamp": utc_timestamp(),
                "request_id": context.correlation_id(),
            })
            .to_string()
        });

        let elapsed_ms = context.end();
        Self::json(result.status.as_u16(), body, context.correlation_id(), elapsed_ms)
    }

    /// Envelope with the standard JSON and monitoring headers.
    pub fn json(status_code: u16, body: String, request_id: &str, elapsed_ms: f64) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string());
        headers.insert(REQUEST_ID_HEADER.to_string(), request_id.to_string());
        headers.insert(RESPONSE_TIME_HEADER.to_string(), format_elapsed(elapsed_ms));

        Self {
            status_code,
            headers,
            body,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Body decoded as JSON, if it is JSON.
    pub fn json_body(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Milliseconds as a plain non-negative number string.
pub fn format_elapsed(elapsed_ms: f64) -> String {
    if elapsed_ms.is_finite() && elapsed_ms > 0.0 {
        elapsed_ms.to_string()
    } else {
        "0".to_string()
    }
}

impl IntoResponse for ResponseEnvelope {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, self.body).into_response();

        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_bytes(value.as_bytes())) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!(header = %name, "Dropping invalid response header"),
            }
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_stamps_request_id_and_headers() {
        let mut ctx = RequestContext::with_id("render-1");
        let result = HandlerResult::new(StatusCode::OK, json!({ "message": "hi" }));

        let envelope = ResponseEnvelope::render(result, &mut ctx);

        assert_eq!(envelope.status_code, 200);
        assert_eq!(envelope.header("x-request-id"), Some("render-1"));
        assert_eq!(envelope.header("content-type"), Some("application/json"));
        let elapsed: f64 = envelope.header("X-Response-Time").unwrap().parse().unwrap();
        assert!(elapsed >= 0.0);
        assert_eq!(Some(elapsed), ctx.elapsed_ms());

        let body = envelope.json_body().unwrap();
        assert_eq!(body["request_id"], "render-1");
        assert_eq!(body["message"], "hi");
        assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_lambda_shape() {
        let envelope = ResponseEnvelope::json(404, "{}".into(), "id", 1.5);
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["statusCode"], 404);
        assert_eq!(value["headers"]["X-Response-Time"], "1.5");
        assert_eq!(value["body"], "{}");
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(12.34), "12.34");
        assert_eq!(format_elapsed(0.0), "0");
        assert_eq!(format_elapsed(-3.0), "0");
    }

    #[test]
    fn test_into_response_sets_headers() {
        let envelope = ResponseEnvelope::json(400, "{}".into(), "abc", 2.0);
        let response = envelope.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()["x-request-id"], "abc");
        assert_eq!(response.headers()["content-type"], "application/json");
        assert_eq!(response.headers()["x-response-time"], "2");
    }

    #[test]
    fn test_into_response_keeps_utf8_request_id() {
        let response = ResponseEnvelope::json(200, "{}".into(), "café-1", 1.0).into_response();
        assert_eq!(response.headers()["x-request-id"].as_bytes(), "café-1".as_bytes());
    }
}
