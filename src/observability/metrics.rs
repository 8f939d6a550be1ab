//! Request metrics and Prometheus exposition.
//!
//! # Metrics
//! - `api_requests_total` (counter): requests by method, route, status
//! - `api_request_duration_seconds` (histogram): latency distribution
//!
//! # Design Decisions
//! - Route labels use handler names, never raw paths, and non-standard
//!   methods share one label, so label cardinality stays bounded
//! - Without an installed recorder every call is a no-op

use std::net::SocketAddr;

use axum::http::Method;
use metrics_exporter_prometheus::PrometheusBuilder;

pub const REQUESTS_TOTAL: &str = "api_requests_total";
pub const REQUEST_DURATION: &str = "api_request_duration_seconds";

/// Install the Prometheus recorder with an HTTP scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Label for a request method. Extension methods collapse to `other`.
pub fn method_label(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::POST => "POST",
        Method::PUT => "PUT",
        Method::DELETE => "DELETE",
        Method::HEAD => "HEAD",
        Method::OPTIONS => "OPTIONS",
        Method::PATCH => "PATCH",
        Method::CONNECT => "CONNECT",
        Method::TRACE => "TRACE",
        _ => "other",
    }
}

/// Record one completed request.
pub fn record_request(method: &Method, route: &'static str, status: u16, elapsed_ms: f64) {
    metrics::counter!(
        REQUESTS_TOTAL,
        "method" => method_label(method),
        "route" => route,
        "status" => status.to_string()
    )
    .increment(1);

    metrics::histogram!(REQUEST_DURATION, "route" => route).record(elapsed_ms / 1000.0);
}
