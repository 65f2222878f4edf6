//! Per-subscriber queue and sink counters

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Counters for one subscriber's queue and sink
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Batches waiting in the queue
    queue_len: AtomicUsize,
    /// Batches accepted into the queue
    enqueued_count: AtomicU64,
    /// Batches the sink wrote successfully
    write_count: AtomicU64,
    /// Results contained in successfully written batches
    results_written: AtomicU64,
    /// Sink write failures
    failure_count: AtomicU64,
    /// Batches rejected because the queue was full
    dropped_count: AtomicU64,
}

impl SinkMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    pub fn set_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    pub fn enqueued_count(&self) -> u64 {
        self.enqueued_count.load(Ordering::Relaxed)
    }

    pub fn inc_enqueued_count(&self) {
        self.enqueued_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::Relaxed)
    }

    pub fn results_written(&self) -> u64 {
        self.results_written.load(Ordering::Relaxed)
    }

    /// Count one successful batch write of `results` items
    pub fn record_write(&self, results: usize) {
        self.write_count.fetch_add(1, Ordering::Relaxed);
        self.results_written
            .fetch_add(results as u64, Ordering::Relaxed);
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    pub fn inc_dropped_count(&self) {
        self.dropped_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queue_len: self.queue_len(),
            enqueued_count: self.enqueued_count(),
            write_count: self.write_count(),
            results_written: self.results_written(),
            failure_count: self.failure_count(),
            dropped_count: self.dropped_count(),
        }
    }
}

/// Snapshot of [`SinkMetrics`] (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub queue_len: usize,
    pub enqueued_count: u64,
    pub write_count: u64,
    pub results_written: u64,
    pub failure_count: u64,
    pub dropped_count: u64,
}

impl MetricsSnapshot {
    /// Sum two snapshots (queue lengths add up too)
    pub fn merge(self, other: Self) -> Self {
        Self {
            queue_len: self.queue_len + other.queue_len,
            enqueued_count: self.enqueued_count + other.enqueued_count,
            write_count: self.write_count + other.write_count,
            results_written: self.results_written + other.results_written,
            failure_count: self.failure_count + other.failure_count,
            dropped_count: self.dropped_count + other.dropped_count,
        }
    }
}
