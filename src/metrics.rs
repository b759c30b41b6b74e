//! Request metrics and statistics tracking for the scoring API.

use crate::types::prediction::Decision;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Latency samples kept for percentile estimates
const LATENCY_WINDOW: usize = 10_000;

/// Metrics collector for the scoring endpoint
pub struct ScoringMetrics {
    /// Successful predictions
    pub predictions: AtomicU64,
    /// Predictions that ended in approval
    pub approved: AtomicU64,
    /// Predictions that ended in rejection
    pub rejected: AtomicU64,
    /// Requests rejected by schema validation
    pub validation_failures: AtomicU64,
    /// Requests that failed inside the scoring service
    pub scoring_failures: AtomicU64,
    /// Scoring latencies (in microseconds)
    latencies: RwLock<Vec<u64>>,
    /// Default probability distribution buckets
    score_buckets: RwLock<[u64; 10]>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl ScoringMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            predictions: AtomicU64::new(0),
            approved: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            validation_failures: AtomicU64::new(0),
            scoring_failures: AtomicU64::new(0),
            latencies: RwLock::new(Vec::with_capacity(1000)),
            score_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a successful prediction
    pub fn record_prediction(&self, latency: Duration, probability: f64, decision: Decision) {
        self.predictions.fetch_add(1, Ordering::Relaxed);
        match decision {
            Decision::Approved => self.approved.fetch_add(1, Ordering::Relaxed),
            Decision::Rejected => self.rejected.fetch_add(1, Ordering::Relaxed),
        };

        if let Ok(mut times) = self.latencies.write() {
            times.push(latency.as_micros() as u64);
            if times.len() > LATENCY_WINDOW {
                times.drain(0..LATENCY_WINDOW / 2);
            }
        }

        let bucket = (probability.clamp(0.0, 1.0) * 10.0).min(9.0) as usize;
        if let Ok(mut buckets) = self.score_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Record a request rejected by validation
    pub fn record_validation_failure(&self) {
        self.validation_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a request that failed during scoring
    pub fn record_scoring_failure(&self) {
        self.scoring_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get latency statistics
    pub fn get_latency_stats(&self) -> LatencyStats {
        let mut sorted: Vec<u64> = match self.latencies.read() {
            Ok(times) => times.clone(),
            Err(_) => return LatencyStats::default(),
        };
        if sorted.is_empty() {
            return LatencyStats::default();
        }
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();
        let at = |q: f64| sorted[((count as f64 * q) as usize).min(count - 1)];

        LatencyStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: at(0.50),
            p95_us: at(0.95),
            p99_us: at(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Get current throughput (predictions per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.predictions.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Get probability distribution
    pub fn get_score_distribution(&self) -> [u64; 10] {
        self.score_buckets.read().map(|b| *b).unwrap_or_default()
    }

    /// Point-in-time view of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            predictions: self.predictions.load(Ordering::Relaxed),
            approved: self.approved.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
            scoring_failures: self.scoring_failures.load(Ordering::Relaxed),
            throughput_per_sec: self.get_throughput(),
            latency: self.get_latency_stats(),
            score_distribution: self.get_score_distribution(),
        }
    }

    /// Log summary statistics
    pub fn log_summary(&self) {
        let s = self.snapshot();
        let rejection_rate = if s.predictions > 0 {
            (s.rejected as f64 / s.predictions as f64) * 100.0
        } else {
            0.0
        };

        info!(
            predictions = s.predictions,
            approved = s.approved,
            rejected = s.rejected,
            rejection_rate = format!("{:.1}%", rejection_rate),
            validation_failures = s.validation_failures,
            scoring_failures = s.scoring_failures,
            throughput = format!("{:.2} req/s", s.throughput_per_sec),
            "Scoring summary"
        );
        info!(
            mean_us = s.latency.mean_us,
            p50_us = s.latency.p50_us,
            p95_us = s.latency.p95_us,
            p99_us = s.latency.p99_us,
            max_us = s.latency.max_us,
            "Scoring latency"
        );

        let total: u64 = s.score_distribution.iter().sum();
        if total > 0 {
            for (i, &count) in s.score_distribution.iter().enumerate() {
                let pct = (count as f64 / total as f64) * 100.0;
                let bar: String = "█".repeat(((pct / 2.0) as usize).min(20));
                info!(
                    "  p(default) {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                    i as f64 / 10.0,
                    (i + 1) as f64 / 10.0,
                    count,
                    pct,
                    bar
                );
            }
        }
    }
}

impl Default for ScoringMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Latency statistics
#[derive(Debug, Default, Clone, Serialize)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Serializable metrics view served by `GET /metrics`
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub predictions: u64,
    pub approved: u64,
    pub rejected: u64,
    pub validation_failures: u64,
    pub scoring_failures: u64,
    pub throughput_per_sec: f64,
    pub latency: LatencyStats,
    pub score_distribution: [u64; 10],
}

/// Periodic metrics reporter that logs summaries
pub struct MetricsReporter {
    metrics: Arc<ScoringMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ScoringMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.log_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = ScoringMetrics::new();

        metrics.record_prediction(Duration::from_micros(100), 0.05, Decision::Approved);
        metrics.record_prediction(Duration::from_micros(300), 0.92, Decision::Rejected);
        metrics.record_prediction(Duration::from_micros(200), 1.0, Decision::Rejected);
        metrics.record_validation_failure();
        metrics.record_scoring_failure();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.predictions, 3);
        assert_eq!(snapshot.approved, 1);
        assert_eq!(snapshot.rejected, 2);
        assert_eq!(snapshot.validation_failures, 1);
        assert_eq!(snapshot.scoring_failures, 1);
        assert_eq!(snapshot.score_distribution[0], 1);
        assert_eq!(snapshot.score_distribution[9], 2);
    }

    #[test]
    fn test_latency_stats() {
        let metrics = ScoringMetrics::new();
        for us in [100, 200, 300, 400] {
            metrics.record_prediction(Duration::from_micros(us), 0.1, Decision::Approved);
        }

        let stats = metrics.get_latency_stats();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean_us, 250);
        assert_eq!(stats.p50_us, 300);
        assert_eq!(stats.max_us, 400);
    }

    #[test]
    fn test_empty_latency_stats() {
        let stats = ScoringMetrics::new().get_latency_stats();
        assert_eq!(stats.count, 0);
        assert_eq!(stats.p99_us, 0);
    }
}
