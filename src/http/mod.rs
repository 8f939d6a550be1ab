//! HTTP surface for local development.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum fallback, tower-http layers)
//!     → ApiService::handle (context, routing, handler, logging)
//!     → response.rs (ResponseEnvelope → axum Response)
//!     → Send to client
//! ```

pub mod response;
pub mod server;

pub use response::ResponseEnvelope;
pub use server::HttpServer;
