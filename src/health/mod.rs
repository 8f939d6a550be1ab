//! Health reporting collaborators.
//!
//! # Data Flow
//! ```text
//! Process start (main / lambda init):
//!     → uptime.rs captures the start instant once
//!
//! GET /health:
//!     → uptime.rs (seconds since start, non-decreasing)
//!     → probe.rs (memory / CPU / open files, optional)
//!     → handlers::health assembles the payload
//! ```
//!
//! # Design Decisions
//! - Both collaborators sit behind traits so failures can be injected
//! - A missing probe sample degrades to a note, never to "unhealthy"

pub mod probe;
pub mod uptime;

pub use probe::{NoProcessMetrics, ProcessMetrics, ProcessSnapshot, SysinfoProbe};
pub use uptime::{ProcessStart, UptimeSource};
