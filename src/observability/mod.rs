//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every request or invocation event:
//!     → context.rs (correlation id + start instant)
//!     → logging.rs (one JSON record per lifecycle step)
//!     → metrics.rs (counters, latency histogram)
//!     → context.rs (elapsed ms → X-Response-Time)
//!
//! Consumers:
//!     → stdout (log aggregation / CloudWatch)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - The correlation id ties together logs, headers and body fields
//! - Metrics are cheap and off unless an exporter is installed

pub mod context;
pub mod logging;
pub mod metrics;

pub use context::{RequestContext, X_REQUEST_ID, X_RESPONSE_TIME};
pub use logging::{LogCapture, StructuredLogger};
