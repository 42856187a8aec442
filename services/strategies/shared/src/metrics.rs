//! Agent metrics collection

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::AgentMetrics;

/// Thread-safe metrics collector shared by the pipeline tasks
#[derive(Debug)]
pub struct MetricsCollector {
    start_time: Instant,
    ticks: AtomicU64,
    feed_failures: AtomicU64,
    recommendations_produced: AtomicU64,
    recommendations_dropped: AtomicU64,
    approved: AtomicU64,
    rejected: AtomicU64,
    instructions_emitted: AtomicU64,
    errors: AtomicU64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            ticks: AtomicU64::new(0),
            feed_failures: AtomicU64::new(0),
            recommendations_produced: AtomicU64::new(0),
            recommendations_dropped: AtomicU64::new(0),
            approved: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            instructions_emitted: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    pub fn increment_ticks(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_feed_failures(&self) {
        self.feed_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_recommendations(&self) {
        self.recommendations_produced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_dropped(&self) {
        self.recommendations_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_approved(&self) {
        self.approved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_instructions(&self) {
        self.instructions_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_errors(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_metrics(&self) -> AgentMetrics {
        AgentMetrics {
            ticks: self.ticks.load(Ordering::Relaxed),
            feed_failures: self.feed_failures.load(Ordering::Relaxed),
            recommendations_produced: self.recommendations_produced.load(Ordering::Relaxed),
            recommendations_dropped: self.recommendations_dropped.load(Ordering::Relaxed),
            approved: self.approved.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            instructions_emitted: self.instructions_emitted.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }

    pub fn uptime(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
