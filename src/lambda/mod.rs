//! Invocation-event surface (AWS Lambda behind API Gateway).
//!
//! # Data Flow
//! ```text
//! lambda_runtime (LambdaEvent<Value>)
//!     → adapter.rs (fault boundary, CORS)
//!     → event.rs (REST v1 | HTTP API v2 → InvocationEvent)
//!     → service::ApiService::handle (shared lifecycle)
//!     → ResponseEnvelope {statusCode, headers, body}
//! ```

pub mod adapter;
pub mod event;

pub use adapter::{EventAdapter, InvocationContext, UNKNOWN_INVOCATION};
pub use event::{EventFormat, InvocationEvent};
