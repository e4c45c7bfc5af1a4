//! Runtime metrics for the scoring service.

use crate::policy::RiskLevel;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Processing-time samples kept for percentile estimates
const MAX_SAMPLES: usize = 10_000;

/// Metrics collector for the scoring endpoint
pub struct ServiceMetrics {
    /// Successfully scored requests
    pub requests_scored: AtomicU64,
    /// Requests classified as fraud
    pub frauds_flagged: AtomicU64,
    /// Scorings produced by the heuristic
    pub degraded_scorings: AtomicU64,
    /// Scoring failures surfaced as 500
    pub failures: AtomicU64,
    by_risk_level: [AtomicU64; 4],
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Fraud score distribution buckets
    score_buckets: [AtomicU64; 10],
    start_time: Instant,
}

impl ServiceMetrics {
    pub fn new() -> Self {
        Self {
            requests_scored: AtomicU64::new(0),
            frauds_flagged: AtomicU64::new(0),
            degraded_scorings: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            by_risk_level: Default::default(),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            score_buckets: Default::default(),
            start_time: Instant::now(),
        }
    }

    /// Record a scored request
    pub fn record_scoring(
        &self,
        processing_time: Duration,
        fraud_score: f64,
        risk_level: RiskLevel,
        is_fraud: bool,
        degraded: bool,
    ) {
        self.requests_scored.fetch_add(1, Ordering::Relaxed);
        if is_fraud {
            self.frauds_flagged.fetch_add(1, Ordering::Relaxed);
        }
        if degraded {
            self.degraded_scorings.fetch_add(1, Ordering::Relaxed);
        }
        self.by_risk_level[risk_level.index()].fetch_add(1, Ordering::Relaxed);

        let bucket = (fraud_score.clamp(0.0, 1.0) * 10.0).min(9.0) as usize;
        self.score_buckets[bucket].fetch_add(1, Ordering::Relaxed);

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            if times.len() > MAX_SAMPLES {
                times.drain(0..MAX_SAMPLES / 2);
            }
        }
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Processing time statistics over the retained samples
    pub fn processing_stats(&self) -> ProcessingStats {
        let mut sorted = match self.processing_times.read() {
            Ok(times) => times.clone(),
            Err(_) => return ProcessingStats::default(),
        };
        if sorted.is_empty() {
            return ProcessingStats::default();
        }
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();
        let at = |q: f64| sorted[((count as f64 * q) as usize).min(count - 1)];

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: at(0.5),
            p95_us: at(0.95),
            p99_us: at(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Requests per second since startup
    pub fn throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.requests_scored.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn score_distribution(&self) -> [u64; 10] {
        std::array::from_fn(|i| self.score_buckets[i].load(Ordering::Relaxed))
    }

    pub fn by_risk_level(&self) -> BTreeMap<RiskLevel, u64> {
        RiskLevel::ALL
            .iter()
            .map(|level| (*level, self.by_risk_level[level.index()].load(Ordering::Relaxed)))
            .collect()
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_scored: self.requests_scored.load(Ordering::Relaxed),
            frauds_flagged: self.frauds_flagged.load(Ordering::Relaxed),
            degraded_scorings: self.degraded_scorings.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            by_risk_level: self.by_risk_level(),
            latency: self.processing_stats(),
            score_distribution: self.score_distribution(),
            throughput_per_sec: self.throughput(),
            uptime_secs: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log a one-shot summary
    pub fn log_summary(&self) {
        let snapshot = self.snapshot();
        let fraud_rate = if snapshot.requests_scored > 0 {
            snapshot.frauds_flagged as f64 / snapshot.requests_scored as f64 * 100.0
        } else {
            0.0
        };

        info!(
            requests = snapshot.requests_scored,
            frauds = snapshot.frauds_flagged,
            fraud_rate_pct = format!("{fraud_rate:.1}"),
            degraded = snapshot.degraded_scorings,
            failures = snapshot.failures,
            throughput = format!("{:.1}/s", snapshot.throughput_per_sec),
            "Scoring summary"
        );
        info!(
            mean_us = snapshot.latency.mean_us,
            p50_us = snapshot.latency.p50_us,
            p95_us = snapshot.latency.p95_us,
            p99_us = snapshot.latency.p99_us,
            "Processing time"
        );
        for (level, count) in &snapshot.by_risk_level {
            info!(risk_level = level.as_str(), count = count, "Scorings by risk level");
        }
    }
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Body of `GET /metrics`
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests_scored: u64,
    pub frauds_flagged: u64,
    pub degraded_scorings: u64,
    pub failures: u64,
    pub by_risk_level: BTreeMap<RiskLevel, u64>,
    pub latency: ProcessingStats,
    /// Counts per 0.1-wide fraud score bucket
    pub score_distribution: [u64; 10],
    pub throughput_per_sec: f64,
    pub uptime_secs: u64,
}

/// Periodic summary logger
pub struct MetricsReporter {
    metrics: Arc<ServiceMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ServiceMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Run the reporting loop; returns immediately when the interval is 0
    pub async fn start(self) {
        if self.interval_secs == 0 {
            return;
        }
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.log_summary();
        }
    }
}
