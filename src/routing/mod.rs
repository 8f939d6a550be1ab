//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (method, path)
//!     → router.rs (table lookup)
//!     → Found(handler) | MethodNotAllowed(allowed) | NotFound
//!
//! Table construction (at startup):
//!     Greeting + Echo + Health handlers
//!     → RouteTable::standard
//!     → shared immutably by both entry points
//! ```

pub mod router;

pub use router::{Route, RouteMatch, RouteTable};
