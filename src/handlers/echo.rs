//! `GET /echo?msg=...`.
//!
//! The value comes back exactly as decoded from the query string: no
//! trimming and no length limit (transport limits are not our concern).

use axum::http::StatusCode;
use serde_json::json;

use crate::error::HandlerError;
use crate::handlers::{Handler, HandlerRequest, HandlerResult};
use crate::observability::context::utc_timestamp;

pub const MSG_PARAM: &str = "msg";
pub const MISSING_MSG: &str = "Parameter 'msg' is required";

/// Longest echo preview written to logs, in characters.
const LOG_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, Default)]
pub struct Echo;

impl Handler for Echo {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn handle(&self, request: &HandlerRequest<'_>) -> Result<HandlerResult, HandlerError> {
        let ctx = request.context;

        let msg = match request.query.get(MSG_PARAM).filter(|m| !m.is_empty()) {
            Some(msg) => msg,
            None => {
                request.logger.warn(
                    "Echo endpoint accessed without required parameter",
                    Some(ctx),
                    Some(json!({
                        "endpoint": "/echo",
                        "missing_parameter": MSG_PARAM,
                        "query_params": request.query,
                    })),
                );
                return Ok(HandlerResult::error(StatusCode::BAD_REQUEST, MISSING_MSG, ctx));
            }
        };

        request.logger.info(
            "Echo endpoint processed successfully",
            Some(ctx),
            Some(json!({
                "endpoint": "/echo",
                "message_length": msg.chars().count(),
                "echoed_message": preview(msg),
            })),
        );

        Ok(HandlerResult::new(
            StatusCode::OK,
            json!({
                "message": msg,
                "echo": true,
                "timestamp": utc_timestamp(),
                "request_id": ctx.correlation_id(),
            }),
        ))
    }
}

/// Truncate on a character boundary, marking the cut with `...`.
fn preview(msg: &str) -> String {
    match msg.char_indices().nth(LOG_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &msg[..cut]),
        None => msg.to_string(),
    }
}
