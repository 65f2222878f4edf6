//! SubscriberHandle - one subscriber's bounded queue and sink worker task

use std::sync::Arc;

use contracts::{Batch, BatchSink, ContractError, SubscriberId};
use observability::record_queue_depth;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use crate::metrics::SinkMetrics;

/// Handle to a running subscriber worker
pub struct SubscriberHandle<R> {
    subscriber_id: SubscriberId,
    /// Name of the sink behind the queue
    sink_name: String,
    tx: mpsc::Sender<Batch<R>>,
    metrics: Arc<SinkMetrics>,
    worker_handle: JoinHandle<()>,
}

impl<R: Send + Sync + 'static> SubscriberHandle<R> {
    /// Spawn the worker task on the current runtime.
    ///
    /// A `queue_capacity` of zero is raised to one.
    pub fn spawn<S>(subscriber_id: SubscriberId, sink: S, queue_capacity: usize) -> Self
    where
        S: BatchSink<R> + Send + 'static,
    {
        let sink_name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity.max(1));
        let metrics = Arc::new(SinkMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_id = subscriber_id.clone();

        let worker_handle = tokio::spawn(async move {
            subscriber_worker(sink, rx, worker_metrics, worker_id).await;
        });

        Self {
            subscriber_id,
            sink_name,
            tx,
            metrics,
            worker_handle,
        }
    }

    pub fn subscriber_id(&self) -> &SubscriberId {
        &self.subscriber_id
    }

    pub fn sink_name(&self) -> &str {
        &self.sink_name
    }

    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Enqueue a batch without waiting.
    ///
    /// # Errors
    /// `QueueFull` when the queue is at capacity (the batch is dropped),
    /// `ChannelClosed` when the worker has stopped.
    pub fn try_send(&self, batch: Batch<R>) -> Result<(), ContractError> {
        match self.tx.try_send(batch) {
            Ok(()) => {
                self.metrics.inc_enqueued_count();
                let depth = self.tx.max_capacity() - self.tx.capacity();
                self.metrics.set_queue_len(depth);
                record_queue_depth(&self.subscriber_id, depth);
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(b)) => {
                self.metrics.inc_dropped_count();
                warn!(
                    subscriber = %self.subscriber_id,
                    frame_seq = b.frame_seq,
                    "Queue full, batch dropped"
                );
                Err(ContractError::QueueFull {
                    subscriber_id: b.subscriber_id.to_string(),
                    frame_seq: b.frame_seq,
                })
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!(subscriber = %self.subscriber_id, "Subscriber worker closed unexpectedly");
                Err(ContractError::ChannelClosed {
                    subscriber_id: self.subscriber_id.to_string(),
                })
            }
        }
    }

    /// Close the queue, let the worker drain it, then flush and close the sink.
    #[instrument(name = "subscriber_handle_shutdown", skip(self), fields(subscriber = %self.subscriber_id))]
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker_handle.await {
            error!(subscriber = %self.subscriber_id, error = ?e, "Worker task panicked");
        }
        debug!(subscriber = %self.subscriber_id, "SubscriberHandle shutdown complete");
    }
}

#[instrument(
    name = "subscriber_worker_loop",
    skip(sink, rx, metrics),
    fields(subscriber = %subscriber_id)
)]
async fn subscriber_worker<R, S>(
    mut sink: S,
    mut rx: mpsc::Receiver<Batch<R>>,
    metrics: Arc<SinkMetrics>,
    subscriber_id: SubscriberId,
) where
    R: Send + Sync + 'static,
    S: BatchSink<R> + Send,
{
    debug!(sink = sink.name(), "Subscriber worker started");

    while let Some(batch) = rx.recv().await {
        metrics.set_queue_len(rx.len());

        match sink.write(&batch).await {
            Ok(()) => metrics.record_write(batch.len()),
            Err(e) => {
                metrics.inc_failure_count();
                error!(
                    frame_seq = batch.frame_seq,
                    error = %e,
                    "Sink write failed"
                );
            }
        }
    }

    if let Err(e) = sink.flush().await {
        error!(error = %e, "Flush failed on shutdown");
    }
    if let Err(e) = sink.close().await {
        error!(error = %e, "Close failed on shutdown");
    }

    debug!(
        written = metrics.write_count(),
        failed = metrics.failure_count(),
        "Subscriber worker stopped"
    );
}
