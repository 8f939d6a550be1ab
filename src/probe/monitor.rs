//! Monitoring checks against a running endpoint.

use std::collections::HashSet;
use std::time::Duration;

use serde_json::{json, Value};

use crate::http::response::{REQUEST_ID_HEADER, RESPONSE_TIME_HEADER};
use crate::probe::CheckResult;

/// Upper bound for a plausible `X-Response-Time`, in milliseconds.
pub const MAX_PLAUSIBLE_RESPONSE_MS: f64 = 30_000.0;

const HEALTH_FIELDS: [&str; 6] = ["status", "timestamp", "version", "environment", "request_id", "checks"];

/// What the probe saw for one request.
#[derive(Debug, Clone, Default)]
pub struct Observed {
    pub status: u16,
    pub request_id: Option<String>,
    pub response_time: Option<String>,
    pub body: Option<Value>,
}

impl Observed {
    pub async fn from_response(response: reqwest::Response) -> Self {
        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let status = response.status().as_u16();
        let request_id = header(REQUEST_ID_HEADER);
        let response_time = header(RESPONSE_TIME_HEADER);
        let body = response.json::<Value>().await.ok();

        Self {
            status,
            request_id,
            response_time,
            body,
        }
    }

    fn body_str(&self, field: &str) -> Option<&str> {
        self.body.as_ref().and_then(|b| b.get(field)).and_then(Value::as_str)
    }
}

/// Health payload: 200, required fields present, `healthy`, every check `ok`.
pub fn inspect_health(observed: &Observed) -> CheckResult {
    const NAME: &str = "Health Endpoint";

    if observed.status != 200 {
        return CheckResult::fail(NAME, format!("Expected 200, got {}", observed.status));
    }
    let Some(body) = observed.body.as_ref() else {
        return CheckResult::fail(NAME, "Response is not valid JSON");
    };

    let missing: Vec<&str> = HEALTH_FIELDS.iter().copied().filter(|f| body.get(f).is_none()).collect();
    if !missing.is_empty() {
        return CheckResult::fail(NAME, format!("Missing required fields: {missing:?}"))
            .with_details(json!({ "missing_fields": missing }));
    }

    if body["status"] != "healthy" {
        return CheckResult::fail(NAME, format!("Expected 'healthy', got {}", body["status"]));
    }

    let failed: Vec<&String> = body["checks"]
        .as_object()
        .map(|checks| checks.iter().filter(|(_, v)| *v != "ok").map(|(k, _)| k).collect())
        .unwrap_or_default();
    if !failed.is_empty() {
        return CheckResult::fail(NAME, format!("Failed health checks: {failed:?}"));
    }

    CheckResult::pass(NAME, "Health endpoint working correctly")
        .with_details(json!({ "uptime_seconds": body.get("uptime_seconds") }))
}

/// Monitoring metadata: expected status, id echoed in header and body,
/// parseable and plausible response time.
pub fn inspect_monitoring(name: &str, observed: &Observed, expected_status: u16, custom_id: &str) -> CheckResult {
    if observed.status != expected_status {
        return CheckResult::fail(name, format!("Expected {expected_status}, got {}", observed.status));
    }

    if observed.request_id.as_deref() != Some(custom_id) {
        return CheckResult::fail(name, "Request ID not propagated to header").with_details(json!({
            "expected": custom_id,
            "actual": observed.request_id,
        }));
    }

    let Some(raw) = observed.response_time.as_deref() else {
        return CheckResult::fail(name, format!("Missing {RESPONSE_TIME_HEADER} header"));
    };
    let elapsed: f64 = match raw.parse() {
        Ok(v) => v,
        Err(_) => return CheckResult::fail(name, format!("Invalid response time format: {raw}")),
    };
    if !(0.0..=MAX_PLAUSIBLE_RESPONSE_MS).contains(&elapsed) {
        return CheckResult::fail(name, format!("Unreasonable response time: {elapsed}ms"));
    }

    if observed.body_str("request_id") != Some(custom_id) {
        return CheckResult::fail(name, "Request ID not in response body").with_details(json!({
            "expected": custom_id,
            "actual": observed.body_str("request_id"),
        }));
    }

    CheckResult::pass(name, "Monitoring headers present and correct")
        .with_details(json!({ "response_time_ms": elapsed }))
}

/// Structured error body: `error` text and matching `status_code` field.
pub fn inspect_error_body(name: &str, observed: &Observed, expected_error: &str) -> CheckResult {
    if observed.body_str("error") != Some(expected_error) {
        return CheckResult::fail(name, format!("Expected error '{expected_error}'")).with_details(json!({
            "actual": observed.body_str("error"),
        }));
    }
    let status_field = observed.body.as_ref().and_then(|b| b.get("status_code")).and_then(Value::as_u64);
    if status_field != Some(u64::from(observed.status)) {
        return CheckResult::fail(name, "status_code field does not match response status");
    }
    CheckResult::pass(name, "Structured error response")
}

/// Every generated id present and distinct.
pub fn inspect_unique_ids(ids: &[Option<String>]) -> CheckResult {
    const NAME: &str = "Request ID Uniqueness";

    let present: Vec<&str> = ids.iter().flatten().map(String::as_str).collect();
    if present.len() != ids.len() {
        return CheckResult::fail(NAME, format!("{} responses lacked an id", ids.len() - present.len()));
    }
    let distinct: HashSet<&str> = present.iter().copied().collect();
    if distinct.len() != present.len() {
        return CheckResult::fail(NAME, format!("{} duplicate ids", present.len() - distinct.len()));
    }
    CheckResult::pass(NAME, format!("{} distinct ids", distinct.len()))
}

/// Runs the monitoring checks against `base_url`.
pub struct Monitor {
    client: reqwest::Client,
    base_url: String,
}

impl Monitor {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get(&self, path: &str, custom_id: Option<&str>) -> Result<Observed, reqwest::Error> {
        let mut request = self.client.get(format!("{}{}", self.base_url, path));
        if let Some(id) = custom_id {
            request = request.header(REQUEST_ID_HEADER, id);
        }
        Ok(Observed::from_response(request.send().await?).await)
    }

    pub async fn check_health(&self) -> CheckResult {
        match self.get("/health", None).await {
            Ok(observed) => inspect_health(&observed),
            Err(e) => CheckResult::fail("Health Endpoint", format!("Request failed: {e}")),
        }
    }

    /// Success paths must echo a caller-supplied id.
    pub async fn check_monitoring_headers(&self) -> Vec<CheckResult> {
        let mut results = Vec::new();
        for path in ["/hello", "/echo?msg=monitoring_test", "/health"] {
            let name = format!("Monitoring Headers {path}");
            let custom_id = custom_id(path);
            let result = match self.get(path, Some(&custom_id)).await {
                Ok(observed) => inspect_monitoring(&name, &observed, 200, &custom_id),
                Err(e) => CheckResult::fail(name, format!("Request failed: {e}")),
            };
            results.push(result);
        }
        results
    }

    /// Error paths carry the same metadata plus a structured body.
    pub async fn check_error_paths(&self) -> Vec<CheckResult> {
        let mut results = Vec::new();
        for (path, status, error) in [
            ("/echo", 400, crate::handlers::echo::MISSING_MSG),
            ("/nonexistent", 404, crate::handlers::NOT_FOUND_MESSAGE),
        ] {
            let name = format!("Error Monitoring {path}");
            let custom_id = custom_id(path);
            match self.get(path, Some(&custom_id)).await {
                Ok(observed) => {
                    results.push(inspect_monitoring(&name, &observed, status, &custom_id));
                    results.push(inspect_error_body(&format!("Error Body {path}"), &observed, error));
                }
                Err(e) => results.push(CheckResult::fail(name, format!("Request failed: {e}"))),
            }
        }
        results
    }

    /// `count` requests without an id must come back with distinct ones.
    pub async fn check_unique_ids(&self, count: usize) -> CheckResult {
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            match self.get("/hello", None).await {
                Ok(observed) => ids.push(observed.request_id),
                Err(e) => return CheckResult::fail("Request ID Uniqueness", format!("Request failed: {e}")),
            }
        }
        inspect_unique_ids(&ids)
    }

    pub async fn run_all(&self) -> Vec<CheckResult> {
        let mut results = vec![self.check_health().await];
        results.extend(self.check_monitoring_headers().await);
        results.extend(self.check_error_paths().await);
        results.push(self.check_unique_ids(10).await);
        results
    }
}

fn custom_id(path: &str) -> String {
    let slug: String = path
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    format!("probe-{}{}", chrono::Utc::now().timestamp(), slug)
}
