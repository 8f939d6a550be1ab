//! Process start time and uptime.
//!
//! The start instant is captured once at process initialization and only
//! read afterwards, so concurrent health checks need no locking.

use std::time::{Instant, SystemTime};

use crate::error::HandlerError;
use crate::observability::context::round2;

/// Source of process uptime for the health check.
pub trait UptimeSource: Send + Sync + std::fmt::Debug {
    /// Seconds since the process started. Non-decreasing across calls.
    fn uptime_seconds(&self) -> Result<f64, HandlerError>;
}

/// Uptime measured from a monotonic start instant.
#[derive(Debug, Clone, Copy)]
pub struct ProcessStart {
    started: Instant,
    started_at: SystemTime,
}

impl ProcessStart {
    pub fn now() -> Self {
        Self {
            started: Instant::now(),
            started_at: SystemTime::now(),
        }
    }

    /// Wall-clock time the process started.
    pub fn started_at(&self) -> SystemTime {
        self.started_at
    }
}

impl UptimeSource for ProcessStart {
    fn uptime_seconds(&self) -> Result<f64, HandlerError> {
        Instant::now()
            .checked_duration_since(self.started)
            .map(|d| round2(d.as_secs_f64()))
            .ok_or_else(|| HandlerError::Health("monotonic clock moved backwards".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_uptime_non_decreasing() {
        let start = ProcessStart::now();
        let first = start.uptime_seconds().unwrap();
        std::thread::sleep(Duration::from_millis(20));
        let second = start.uptime_seconds().unwrap();
        assert!(second >= first);
        assert!(first >= 0.0);
    }
}
