//! Minimal HTTP API with request-lifecycle instrumentation.
//!
//! Three read-only endpoints (`/hello`, `/echo`, `/health`) served through one
//! lifecycle: correlation id, timing, structured logs, monitoring headers.
//! Two surfaces share it, a local axum server and a Lambda event adapter.

// Core pipeline
pub mod handlers;
pub mod routing;
pub mod service;

// Surfaces
pub mod http;
pub mod lambda;

// Cross-cutting concerns
pub mod config;
pub mod error;
pub mod health;
pub mod lifecycle;
pub mod observability;

// Operational tooling
pub mod probe;

pub use config::ApiConfig;
pub use http::{HttpServer, ResponseEnvelope};
pub use lambda::EventAdapter;
pub use lifecycle::Shutdown;
pub use observability::{RequestContext, StructuredLogger};
pub use service::{ApiRequest, ApiService};
