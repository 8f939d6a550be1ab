//! Load generation and latency analysis.

use std::collections::BTreeMap;
use std::time::Instant;

use futures_util::stream::{self, StreamExt};
use serde::Serialize;

/// One request's outcome. `status` is `None` when the transport failed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub status: Option<u16>,
    pub elapsed_ms: f64,
}

impl Sample {
    pub fn succeeded(&self) -> bool {
        self.status.is_some()
    }
}

/// Aggregate over a run. Latencies cover successful samples only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencySummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub success_rate: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub mean_ms: f64,
    pub median_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub status_counts: BTreeMap<u16, usize>,
}

impl LatencySummary {
    /// `None` when no sample succeeded.
    pub fn from_samples(samples: &[Sample]) -> Option<Self> {
        let mut latencies: Vec<f64> = samples.iter().filter(|s| s.succeeded()).map(|s| s.elapsed_ms).collect();
        if latencies.is_empty() {
            return None;
        }
        latencies.sort_by(f64::total_cmp);

        let mut status_counts = BTreeMap::new();
        for status in samples.iter().filter_map(|s| s.status) {
            *status_counts.entry(status).or_insert(0) += 1;
        }

        let successful = latencies.len();
        Some(Self {
            total: samples.len(),
            successful,
            failed: samples.len() - successful,
            success_rate: successful as f64 / samples.len() as f64 * 100.0,
            min_ms: latencies[0],
            max_ms: latencies[successful - 1],
            mean_ms: latencies.iter().sum::<f64>() / successful as f64,
            median_ms: median(&latencies),
            p95_ms: percentile(&latencies, 95.0),
            p99_ms: percentile(&latencies, 99.0),
            status_counts,
        })
    }
}

/// Nearest-rank percentile over sorted data: `sorted[floor(len * p / 100)]`,
/// clamped to the last element.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let index = ((sorted.len() as f64 * p / 100.0) as usize).min(sorted.len() - 1);
    sorted[index]
}

fn median(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Pass/fail limits for a run.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub min_success_rate: f64,
    pub max_mean_ms: f64,
    pub max_p95_ms: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_success_rate: 95.0,
            max_mean_ms: 2000.0,
            max_p95_ms: 5000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub success_rate: bool,
    pub mean: bool,
    pub p95: bool,
}

impl Verdict {
    pub fn passed(&self) -> bool {
        self.success_rate && self.mean && self.p95
    }
}

impl Thresholds {
    /// A run with no successful sample fails every limit.
    pub fn evaluate(&self, summary: Option<&LatencySummary>) -> Verdict {
        match summary {
            Some(s) => Verdict {
                success_rate: s.success_rate >= self.min_success_rate,
                mean: s.mean_ms <= self.max_mean_ms,
                p95: s.p95_ms <= self.max_p95_ms,
            },
            None => Verdict {
                success_rate: false,
                mean: false,
                p95: false,
            },
        }
    }
}

/// Issue `requests` GETs to `url`, at most `concurrency` in flight.
pub async fn run_load(client: &reqwest::Client, url: &str, requests: usize, concurrency: usize) -> Vec<Sample> {
    stream::iter(0..requests)
        .map(|_| async move {
            let started = Instant::now();
            let status = match client.get(url).send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    // Drain so timing covers the full body.
                    let _ = response.bytes().await;
                    Some(status)
                }
                Err(e) => {
                    tracing::debug!(error = %e, url, "Probe request failed");
                    None
                }
            };
            Sample {
                status,
                elapsed_ms: started.elapsed().as_secs_f64() * 1000.0,
            }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(ms: f64) -> Sample {
        Sample { status: Some(200), elapsed_ms: ms }
    }

    #[test]
    fn test_percentile_nearest_rank() {
        let data: Vec<f64> = (1..=20).map(f64::from).collect();
        assert_eq!(percentile(&data, 95.0), 20.0);
        assert_eq!(percentile(&data, 50.0), 11.0);
        assert_eq!(percentile(&data, 99.0), 20.0);
        assert_eq!(percentile(&[7.0], 95.0), 7.0);
        assert_eq!(percentile(&[], 95.0), 0.0);
    }

    #[test]
    fn test_summary() {
        let samples = vec![
            ok(10.0),
            ok(30.0),
            ok(20.0),
            Sample { status: Some(400), elapsed_ms: 40.0 },
            Sample { status: None, elapsed_ms: 1000.0 },
        ];
        let summary = LatencySummary::from_samples(&samples).unwrap();

        assert_eq!(summary.total, 5);
        assert_eq!(summary.successful, 4);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.success_rate, 80.0);
        assert_eq!(summary.min_ms, 10.0);
        assert_eq!(summary.max_ms, 40.0);
        assert_eq!(summary.mean_ms, 25.0);
        assert_eq!(summary.median_ms, 25.0);
        assert_eq!(summary.status_counts[&200], 3);
        assert_eq!(summary.status_counts[&400], 1);
    }

    #[test]
    fn test_all_failed() {
        let samples = vec![Sample { status: None, elapsed_ms: 5.0 }];
        assert!(LatencySummary::from_samples(&samples).is_none());
        assert!(!Thresholds::default().evaluate(None).passed());
    }

    #[test]
    fn test_thresholds() {
        let thresholds = Thresholds::default();
        let fast: Vec<Sample> = (0..100).map(|_| ok(50.0)).collect();
        let summary = LatencySummary::from_samples(&fast).unwrap();
        assert!(thresholds.evaluate(Some(&summary)).passed());

        let mut slow: Vec<Sample> = (0..90).map(|_| ok(50.0)).collect();
        slow.extend((0..10).map(|_| ok(6000.0)));
        let verdict = thresholds.evaluate(LatencySummary::from_samples(&slow).as_ref());
        assert!(verdict.success_rate);
        assert!(verdict.mean);
        assert!(!verdict.p95);

        let mut flaky: Vec<Sample> = (0..90).map(|_| ok(50.0)).collect();
        flaky.extend((0..10).map(|_| Sample { status: None, elapsed_ms: 0.0 }));
        let verdict = thresholds.evaluate(LatencySummary::from_samples(&flaky).as_ref());
        assert!(!verdict.success_rate);
    }
}
