//! Per-request correlation and timing context.
//!
//! # Responsibilities
//! - Reuse a caller-supplied `X-Request-ID` or generate a fresh one
//! - Record when handling began and compute elapsed milliseconds at the end
//! - Produce ISO-8601 UTC timestamps for response bodies and log records
//!
//! # Design Decisions
//! - Context is an explicit value threaded through each call, never task-local
//! - Generated ids combine wall-clock millis with 48 random bits so rapid
//!   sequential calls never collide
//! - Clock problems degrade to `0` elapsed instead of failing the request

use std::time::{Instant, SystemTime, UNIX_EPOCH};

use axum::http::HeaderMap;
use chrono::{SecondsFormat, Utc};
use uuid::Uuid;

/// Correlation header, matched case-insensitively.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Elapsed-time response header.
pub const X_RESPONSE_TIME: &str = "x-response-time";

/// Correlation id and timing for exactly one request or event.
#[derive(Debug, Clone)]
pub struct RequestContext {
    correlation_id: String,
    started: Instant,
    elapsed_ms: Option<f64>,
}

impl RequestContext {
    /// Start handling a request.
    pub fn begin(headers: &HeaderMap) -> Self {
        // Raw bytes, not `to_str`: non-ASCII ids are reused too.
        let supplied = headers
            .get(X_REQUEST_ID)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .filter(|v| !v.is_empty());

        let correlation_id = supplied.unwrap_or_else(generate_request_id);

        Self::with_id(correlation_id)
    }

    /// Start handling with a known correlation id.
    pub fn with_id(correlation_id: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            started: Instant::now(),
            elapsed_ms: None,
        }
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    /// Milliseconds since `begin`, without finalizing.
    pub fn elapsed_so_far(&self) -> f64 {
        elapsed_ms_since(self.started)
    }

    /// Finalize timing. Later calls return the first recorded value.
    pub fn end(&mut self) -> f64 {
        let started = self.started;
        *self
            .elapsed_ms
            .get_or_insert_with(|| elapsed_ms_since(started))
    }

    /// Elapsed time recorded by [`end`](Self::end), if finalized.
    pub fn elapsed_ms(&self) -> Option<f64> {
        self.elapsed_ms
    }
}

fn elapsed_ms_since(started: Instant) -> f64 {
    Instant::now()
        .checked_duration_since(started)
        .map(|d| round2(d.as_secs_f64() * 1000.0))
        .unwrap_or(0.0)
}

/// Round to two decimal places, clamping at zero.
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        return 0.0;
    }
    (value * 100.0).round() / 100.0
}

/// Generate a fresh correlation id: `req-<unix millis>-<12 hex>`.
pub fn generate_request_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let random = Uuid::new_v4().simple().to_string();
    format!("req-{}-{}", millis, &random[..12])
}

/// Current UTC time in RFC 3339 form with a `Z` suffix.
pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use std::collections::HashSet;

    #[test]
    fn test_reuses_supplied_id_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Request-ID", HeaderValue::from_static("custom-1"));
        let ctx = RequestContext::begin(&headers);
        assert_eq!(ctx.correlation_id(), "custom-1");
    }

    #[test]
    fn test_reuses_non_ascii_id() {
        let mut headers = HeaderMap::new();
        headers.insert(X_REQUEST_ID, HeaderValue::from_bytes("café-1".as_bytes()).unwrap());
        let ctx = RequestContext::begin(&headers);
        assert_eq!(ctx.correlation_id(), "café-1");
    }

    #[test]
    fn test_empty_supplied_id_is_replaced() {
        let mut headers = HeaderMap::new();
        headers.insert(X_REQUEST_ID, HeaderValue::from_static(""));
        let ctx = RequestContext::begin(&headers);
        assert!(ctx.correlation_id().starts_with("req-"));
    }

    #[test]
    fn test_generated_ids_unique_in_rapid_succession() {
        let ids: HashSet<String> = (0..5000).map(|_| generate_request_id()).collect();
        assert_eq!(ids.len(), 5000);
    }

    #[test]
    fn test_end_is_non_negative_and_stable() {
        let mut ctx = RequestContext::begin(&HeaderMap::new());
        let first = ctx.end();
        assert!(first >= 0.0);
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert_eq!(ctx.end(), first);
        assert_eq!(ctx.elapsed_ms(), Some(first));
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.23456), 1.23);
        assert_eq!(round2(-4.0), 0.0);
        assert_eq!(round2(f64::NAN), 0.0);
    }

    #[test]
    fn test_timestamp_is_utc_z() {
        let ts = utc_timestamp();
        assert!(ts.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
