//! MemorySink - keeps delivered batches in memory for tests and demos

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use contracts::{Batch, BatchSink, ContractError};
use tokio::sync::Notify;
use tracing::debug;

/// Shared view of everything a [`MemorySink`] has written.
///
/// Cloning shares the same record.
pub struct MemoryRecord<R> {
    inner: Arc<RecordInner<R>>,
}

struct RecordInner<R> {
    batches: Mutex<Vec<Batch<R>>>,
    closed: Mutex<bool>,
    notify: Notify,
}

impl<R> Clone for MemoryRecord<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R> Default for MemoryRecord<R> {
    fn default() -> Self {
        Self {
            inner: Arc::new(RecordInner {
                batches: Mutex::new(Vec::new()),
                closed: Mutex::new(false),
                notify: Notify::new(),
            }),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<R> MemoryRecord<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of batches written so far
    pub fn len(&self) -> usize {
        lock(&self.inner.batches).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the owning sink has been closed
    pub fn is_closed(&self) -> bool {
        *lock(&self.inner.closed)
    }

    /// Wait until at least `count` batches are recorded.
    ///
    /// Returns `false` if `timeout` elapses first.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        let wait = async {
            loop {
                let notified = self.inner.notify.notified();
                if self.len() >= count {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, wait).await.is_ok()
    }

    fn push(&self, batch: Batch<R>) {
        lock(&self.inner.batches).push(batch);
        self.inner.notify.notify_waiters();
    }

    fn mark_closed(&self) {
        *lock(&self.inner.closed) = true;
        self.inner.notify.notify_waiters();
    }
}

impl<R: Clone> MemoryRecord<R> {
    /// Copy of every recorded batch, in write order
    pub fn batches(&self) -> Vec<Batch<R>> {
        lock(&self.inner.batches).clone()
    }

    /// Every recorded result, flattened in write order
    pub fn results(&self) -> Vec<R> {
        lock(&self.inner.batches)
            .iter()
            .flat_map(|b| b.results.iter().cloned())
            .collect()
    }
}

/// Sink that appends every batch to a shared [`MemoryRecord`]
pub struct MemorySink<R> {
    name: String,
    record: MemoryRecord<R>,
}

impl<R> MemorySink<R> {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_record(name, MemoryRecord::new())
    }

    /// Write into an existing record
    pub fn with_record(name: impl Into<String>, record: MemoryRecord<R>) -> Self {
        Self {
            name: name.into(),
            record,
        }
    }

    pub fn record(&self) -> MemoryRecord<R> {
        self.record.clone()
    }
}

impl<R: Clone + Send + Sync> BatchSink<R> for MemorySink<R> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&mut self, batch: &Batch<R>) -> Result<(), ContractError> {
        self.record.push(batch.clone());
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        self.record.mark_closed();
        debug!(sink = %self.name, batches = self.record.len(), "MemorySink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(frame_seq: u64, results: Vec<u8>) -> Batch<u8> {
        Batch {
            subscriber_id: "mem".into(),
            frame_seq,
            timestamp: 1.0,
            results,
        }
    }

    #[tokio::test]
    async fn test_memory_sink_records_batches() {
        let mut sink = MemorySink::new("mem");
        let record = sink.record();

        sink.write(&batch(1, vec![1, 2])).await.unwrap();
        sink.write(&batch(2, vec![3])).await.unwrap();

        assert_eq!(record.len(), 2);
        assert_eq!(record.results(), vec![1, 2, 3]);
        assert!(!record.is_closed());

        sink.close().await.unwrap();
        assert!(record.is_closed());
    }

    #[tokio::test]
    async fn test_wait_for_times_out() {
        let record: MemoryRecord<u8> = MemoryRecord::new();
        assert!(!record.wait_for(1, Duration::from_millis(10)).await);
        assert!(record.wait_for(0, Duration::from_millis(10)).await);
    }

    #[tokio::test]
    async fn test_wait_for_wakes_on_write() {
        let mut sink = MemorySink::new("mem");
        let record = sink.record();

        let waiter = tokio::spawn({
            let record = record.clone();
            async move { record.wait_for(2, Duration::from_secs(5)).await }
        });

        sink.write(&batch(1, vec![1])).await.unwrap();
        tokio::task::yield_now().await;
        sink.write(&batch(2, vec![2])).await.unwrap();

        assert!(waiter.await.unwrap());
    }
}
