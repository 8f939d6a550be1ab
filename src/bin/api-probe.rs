use std::time::Duration;

use clap::{Parser, Subcommand};

use echo_api::probe::{self, run_load, LatencySummary, Monitor, Thresholds};

#[derive(Parser)]
#[command(name = "api-probe")]
#[command(about = "Validate a deployed echo API endpoint", long_about = None)]
struct Cli {
    /// Base URL of the deployed API
    #[arg(short, long, default_value = "http://localhost:5000")]
    url: String,

    /// Per-request timeout in seconds
    #[arg(short, long, default_value_t = 30)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check health payload, monitoring headers, error bodies and id uniqueness
    Monitor,
    /// Measure latency under concurrent load
    Perf {
        /// Requests per endpoint
        #[arg(short, long, default_value_t = 100)]
        requests: usize,

        /// Requests in flight at once
        #[arg(short, long, default_value_t = 10)]
        concurrency: usize,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let base_url = cli.url.trim_end_matches('/').to_string();
    let timeout = Duration::from_secs(cli.timeout);

    let passed = match cli.command {
        Commands::Monitor => monitor(&base_url, timeout).await?,
        Commands::Perf { requests, concurrency } => perf(&base_url, timeout, requests, concurrency).await?,
    };

    if !passed {
        std::process::exit(1);
    }
    Ok(())
}

async fn monitor(base_url: &str, timeout: Duration) -> Result<bool, Box<dyn std::error::Error>> {
    println!("Validating monitoring for {base_url}");
    let results = Monitor::new(base_url, timeout)?.run_all().await;

    for result in &results {
        let mark = if result.passed { "PASS" } else { "FAIL" };
        println!("[{mark}] {}: {}", result.name, result.message);
        if !result.passed && !result.details.is_null() {
            println!("       {}", result.details);
        }
    }

    let (passed, total) = probe::tally(&results);
    println!("\n{passed}/{total} checks passed");
    Ok(passed == total)
}

async fn perf(
    base_url: &str,
    timeout: Duration,
    requests: usize,
    concurrency: usize,
) -> Result<bool, Box<dyn std::error::Error>> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    let thresholds = Thresholds::default();
    let mut all_passed = true;

    for path in ["/hello", "/echo?msg=performance_test", "/health"] {
        println!("Testing {path} with {requests} requests, concurrency {concurrency}");
        let samples = run_load(&client, &format!("{base_url}{path}"), requests, concurrency).await;
        let summary = LatencySummary::from_samples(&samples);
        let verdict = thresholds.evaluate(summary.as_ref());
        all_passed &= verdict.passed();

        match summary {
            Some(s) => {
                println!("  Success rate: {:.1}% ({})", s.success_rate, mark(verdict.success_rate));
                println!("  Mean: {:.1}ms ({})", s.mean_ms, mark(verdict.mean));
                println!("  P95: {:.1}ms ({})", s.p95_ms, mark(verdict.p95));
                println!(
                    "  Min/Median/Max/P99: {:.1}/{:.1}/{:.1}/{:.1}ms",
                    s.min_ms, s.median_ms, s.max_ms, s.p99_ms
                );
                println!("  Status codes: {}", serde_json::to_string(&s.status_counts)?);
            }
            None => println!("  All requests failed"),
        }
    }

    println!("\nOverall: {}", mark(all_passed));
    Ok(all_passed)
}

fn mark(ok: bool) -> &'static str {
    if ok {
        "PASS"
    } else {
        "FAIL"
    }
}
