//! Process metrics probe.
//!
//! # Responsibilities
//! - Sample resident memory, CPU usage and open descriptors of this process
//! - Report "unavailable" instead of failing when sampling is impossible
//!
//! # Design Decisions
//! - Sampling is best-effort; the health status never depends on it
//! - `sysinfo::System` is kept behind a mutex so CPU deltas accumulate
//!   between calls; a poisoned lock just yields no sample

use std::sync::Mutex;

use serde::Serialize;
use sysinfo::{ProcessExt, System, SystemExt};

/// One sample of process resource usage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessSnapshot {
    pub memory_usage_mb: f64,
    pub cpu_percent: f64,
    pub open_files: Option<usize>,
}

/// Source of process metrics.
pub trait ProcessMetrics: Send + Sync + std::fmt::Debug {
    /// `None` when metrics cannot be collected on this platform or right now.
    fn sample(&self) -> Option<ProcessSnapshot>;
}

/// Probe backed by `sysinfo`.
pub struct SysinfoProbe {
    system: Mutex<System>,
}

impl std::fmt::Debug for SysinfoProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SysinfoProbe").finish_non_exhaustive()
    }
}

impl SysinfoProbe {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessMetrics for SysinfoProbe {
    fn sample(&self) -> Option<ProcessSnapshot> {
        let pid = sysinfo::get_current_pid().ok()?;
        let mut system = self.system.lock().ok()?;

        if !system.refresh_process(pid) {
            return None;
        }
        let process = system.process(pid)?;

        let memory_mb = process.memory() as f64 / 1024.0 / 1024.0;
        Some(ProcessSnapshot {
            memory_usage_mb: (memory_mb * 100.0).round() / 100.0,
            cpu_percent: f64::from(process.cpu_usage()),
            open_files: count_open_files(),
        })
    }
}

fn count_open_files() -> Option<usize> {
    std::fs::read_dir("/proc/self/fd").ok().map(|entries| entries.count())
}

/// Probe that never has data; for platforms without introspection.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProcessMetrics;

impl ProcessMetrics for NoProcessMetrics {
    fn sample(&self) -> Option<ProcessSnapshot> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sysinfo_probe_samples_self() {
        // Some sandboxes hide /proc; only assert shape when a sample exists.
        if let Some(snapshot) = SysinfoProbe::new().sample() {
            assert!(snapshot.memory_usage_mb >= 0.0);
            assert!(snapshot.cpu_percent >= 0.0);
        }
    }

    #[test]
    fn test_no_metrics_probe() {
        assert!(NoProcessMetrics.sample().is_none());
    }
}
