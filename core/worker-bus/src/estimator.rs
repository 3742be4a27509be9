//! Leibniz series π estimation with throttled progress reporting
//!
//! The series is `4 × Σ 1/term(i)` over the alternating-sign odd numbers
//! `1, -3, 5, -7, 9, …`. Progress callbacks are throttled because each
//! notification crosses the message channel and serialization is expensive.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Signed series term at `index`: `(-1)^index × (2·index + 1)`
///
/// Never zero, so dividing by a term is always safe.
#[inline]
pub fn term(index: u32) -> i64 {
    let odd = 2 * i64::from(index) + 1;
    if index % 2 == 0 {
        odd
    } else {
        -odd
    }
}

/// Alternating-sign odd-number sequence from term `start` upward
///
/// `sequence(0)` yields `1, -3, 5, -7, 9, …`. Resuming mid-sequence is just
/// generating from a higher index; no sign state is threaded through.
pub fn sequence(start: u32) -> impl Iterator<Item = i64> {
    (start..).map(term)
}

/// Tuning knobs for the estimator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatorConfig {
    /// Delay before a computation starts, in milliseconds
    pub startup_delay_ms: u64,

    /// Minimum percentage distance between progress reports
    pub progress_threshold_pct: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            startup_delay_ms: 100,
            progress_threshold_pct: 3.0,
        }
    }
}

/// Computes π estimates and reports incremental progress
pub struct SeriesEstimator {
    config: EstimatorConfig,
}

impl SeriesEstimator {
    /// Create an estimator with default tuning
    pub fn new() -> Self {
        Self::with_config(EstimatorConfig::default())
    }

    /// Create an estimator with explicit tuning
    pub fn with_config(config: EstimatorConfig) -> Self {
        Self { config }
    }

    /// Estimate π over the first `iterations` series terms
    ///
    /// Defers briefly before starting, then runs to completion in a single
    /// pass, invoking `progress` with the current term index under the
    /// throttle rule: report when the percentage distance from the last
    /// reported index exceeds the threshold, and always at the final index.
    pub async fn estimate<F>(&self, iterations: u32, progress: F) -> f64
    where
        F: FnMut(u32),
    {
        tokio::time::sleep(Duration::from_millis(self.config.startup_delay_ms)).await;
        debug!(iterations, "summing series");
        4.0 * self.sum_range(0, iterations, progress)
    }

    /// Partial sum over `iterations` terms starting at sequence offset `start`
    ///
    /// Synchronous, and without the ×4 factor: slices are meant to be summed
    /// across workers and scaled once by the combiner. Same throttle rule as
    /// [`estimate`](Self::estimate), with indices relative to the slice.
    pub fn estimate_slice<F>(&self, start: u32, iterations: u32, progress: F) -> f64
    where
        F: FnMut(u32),
    {
        debug!(start, iterations, "summing series slice");
        self.sum_range(start, iterations, progress)
    }

    fn sum_range<F>(&self, start: u32, iterations: u32, mut progress: F) -> f64
    where
        F: FnMut(u32),
    {
        let mut last_report = 0u32;
        let mut sum = 0.0f64;
        for (offset, term) in sequence(start).take(iterations as usize).enumerate() {
            let index = offset as u32;
            let delta_pct =
                f64::from(index.abs_diff(last_report)) / f64::from(iterations) * 100.0;
            if delta_pct > self.config.progress_threshold_pct || index + 1 >= iterations {
                last_report = index;
                progress(index);
            }
            sum += 1.0 / term as f64;
        }
        sum
    }
}

impl Default for SeriesEstimator {
    fn default() -> Self {
        Self::new()
    }
}
