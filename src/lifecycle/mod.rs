//! Process lifecycle for the local server.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGINT/SIGTERM → wait_for_signal() returns
//!
//! Shutdown (shutdown.rs):
//!     trigger() → every subscriber's recv() resolves → server drains and exits
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
