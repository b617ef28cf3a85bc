use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Counters for the remote operations of one session
#[derive(Debug, Default)]
pub struct SessionMetrics {
    pub started: AtomicU64,
    pub succeeded: AtomicU64,
    pub failed: AtomicU64,
    pub abandoned: AtomicU64,
    pub ticks: AtomicU64,
    pub polls: AtomicU64,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_started(&self) {
        self.started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_succeeded(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_abandoned(&self) {
        self.abandoned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tick(&self, polls: usize) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        self.polls.fetch_add(polls as u64, Ordering::Relaxed);
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            started: self.started.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            abandoned: self.abandoned.load(Ordering::Relaxed),
            ticks: self.ticks.load(Ordering::Relaxed),
            polls: self.polls.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.stats();
        info!(
            "Operation metrics: started={}, succeeded={}, failed={}, abandoned={}, ticks={}, polls={}",
            stats.started,
            stats.succeeded,
            stats.failed,
            stats.abandoned,
            stats.ticks,
            stats.polls
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    pub started: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub abandoned: u64,
    pub ticks: u64,
    pub polls: u64,
}

impl SessionStats {
    /// Operations started but not yet reported.
    pub fn outstanding(&self) -> u64 {
        self.started
            .saturating_sub(self.succeeded + self.failed + self.abandoned)
    }
}

/// Logs how long a remote operation took, from request to terminal report
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn finish(self, success: bool) {
        let duration = self.start.elapsed();
        info!(
            operation = %self.operation,
            success,
            duration_ms = duration.as_millis() as u64,
            "Operation completed"
        );
    }
}
