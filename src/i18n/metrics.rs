//! Translation metrics.
//!
//! Counts calls to the completion service, the calls that fell back to the
//! source text, and the inputs that never needed a call.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Counters owned by a single `Translator`.
#[derive(Debug, Default)]
pub struct TranslationMetrics {
    /// Number of calls made to the completion service
    api_calls: AtomicUsize,

    /// Number of calls that failed and fell back to the source text
    api_failures: AtomicUsize,

    /// Number of empty inputs returned without a call
    skipped_empty: AtomicUsize,
}

impl TranslationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a call to the completion service.
    pub fn record_api_call(&self) {
        self.api_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed call.
    pub fn record_api_failure(&self) {
        self.api_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an empty input that short-circuited.
    pub fn record_skipped_empty(&self) {
        self.skipped_empty.fetch_add(1, Ordering::Relaxed);
    }

    pub fn api_calls(&self) -> usize {
        self.api_calls.load(Ordering::Relaxed)
    }

    pub fn api_failures(&self) -> usize {
        self.api_failures.load(Ordering::Relaxed)
    }

    pub fn skipped_empty(&self) -> usize {
        self.skipped_empty.load(Ordering::Relaxed)
    }

    /// Snapshot the counters.
    pub fn report(&self) -> MetricsReport {
        let calls = self.api_calls();
        let failures = self.api_failures();
        let api_success_rate = if calls > 0 {
            (calls.saturating_sub(failures) as f64 / calls as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            api_calls: calls,
            api_failures: failures,
            skipped_empty: self.skipped_empty(),
            api_success_rate,
        }
    }
}

/// Point-in-time copy of `TranslationMetrics`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsReport {
    /// Number of API calls made
    pub api_calls: usize,

    /// Number of API calls that fell back to the source text
    pub api_failures: usize,

    /// Number of empty inputs skipped
    pub skipped_empty: usize,

    /// API success rate as a percentage (0-100)
    pub api_success_rate: f64,
}

impl MetricsReport {
    /// Counter deltas between two snapshots of the same metrics.
    pub fn since(&self, earlier: &MetricsReport) -> MetricsReport {
        let calls = self.api_calls.saturating_sub(earlier.api_calls);
        let failures = self.api_failures.saturating_sub(earlier.api_failures);
        let api_success_rate = if calls > 0 {
            (calls.saturating_sub(failures) as f64 / calls as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            api_calls: calls,
            api_failures: failures,
            skipped_empty: self.skipped_empty.saturating_sub(earlier.skipped_empty),
            api_success_rate,
        }
    }
}
