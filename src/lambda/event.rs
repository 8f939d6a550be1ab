//! Invocation-event parsing.
//!
//! API Gateway delivers two shapes:
//! - REST API (v1): flat `httpMethod`, `path`
//! - HTTP API (v2): nested `requestContext.http.method`, `rawPath`
//!
//! Both resolve once, here, into one canonical [`InvocationEvent`]. When a
//! payload carries fields of both shapes the flat ones win.

use std::collections::HashMap;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use serde_json::Value;

use crate::error::EventError;
use crate::handlers::QueryParams;

pub const DEFAULT_METHOD: &str = "GET";
pub const DEFAULT_PATH: &str = "/";

/// Which event shape supplied the routing fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFormat {
    RestApi,
    HttpApi,
    /// Neither shape present; defaults applied.
    Unknown,
}

impl EventFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventFormat::RestApi => "rest_api",
            EventFormat::HttpApi => "http_api",
            EventFormat::Unknown => "unknown",
        }
    }
}

/// Canonical inbound event.
#[derive(Debug, Clone)]
pub struct InvocationEvent {
    pub method: String,
    pub path: String,
    pub query_parameters: QueryParams,
    pub headers: HeaderMap,
    pub format: EventFormat,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    http_method: Option<String>,
    path: Option<String>,
    raw_path: Option<String>,
    request_context: Option<RawRequestContext>,
    query_string_parameters: Option<HashMap<String, String>>,
    headers: Option<HashMap<String, String>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawRequestContext {
    http: Option<RawHttp>,
}

#[derive(Debug, Default, Deserialize)]
struct RawHttp {
    method: Option<String>,
    path: Option<String>,
}

impl InvocationEvent {
    /// Parse a raw event payload.
    pub fn from_value(value: Value) -> Result<Self, EventError> {
        let raw: RawEvent = serde_json::from_value(value)?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawEvent) -> Self {
        let nested = raw.request_context.and_then(|rc| rc.http).unwrap_or_default();

        let format = if raw.http_method.is_some() || raw.path.is_some() {
            EventFormat::RestApi
        } else if nested.method.is_some() || raw.raw_path.is_some() || nested.path.is_some() {
            EventFormat::HttpApi
        } else {
            EventFormat::Unknown
        };

        let method = raw
            .http_method
            .or(nested.method)
            .map(|m| m.to_ascii_uppercase())
            .unwrap_or_else(|| DEFAULT_METHOD.to_string());

        let path = raw
            .path
            .or(raw.raw_path)
            .or(nested.path)
            .unwrap_or_else(|| DEFAULT_PATH.to_string());

        Self {
            method,
            path,
            query_parameters: raw.query_string_parameters.unwrap_or_default(),
            headers: to_header_map(raw.headers.unwrap_or_default()),
            format,
        }
    }
}

/// Header names in events are arbitrary case. Values keep their UTF-8 bytes;
/// only names or values with control characters are skipped.
fn to_header_map(raw: HashMap<String, String>) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(raw.len());
    for (name, value) in raw {
        match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_bytes(value.as_bytes())) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::debug!(header = %name, "Skipping invalid event header"),
        }
    }
    headers
}
