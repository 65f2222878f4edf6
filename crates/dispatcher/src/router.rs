//! BatchRouter - delivery channel that routes each batch to its subscriber's queue

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use contracts::{
    Batch, BatchSink, ContractError, DeliveryChannel, SinkType, SubscriberConfig, SubscriberId,
};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::error::DispatcherError;
use crate::handle::SubscriberHandle;
use crate::metrics::{MetricsSnapshot, SinkMetrics};
use crate::sinks::{FileSink, LogSink, MemoryRecord, MemorySink};

type Spawner<R> = Box<dyn FnOnce() -> SubscriberHandle<R> + Send>;

/// Builder for a [`BatchRouter`]
///
/// Sinks are collected first and their workers spawned in [`build`](Self::build).
pub struct BatchRouterBuilder<R> {
    spawners: Vec<(SubscriberId, Spawner<R>)>,
    memory: HashMap<SubscriberId, MemoryRecord<R>>,
}

impl<R: Send + Sync + 'static> BatchRouterBuilder<R> {
    pub fn new() -> Self {
        Self {
            spawners: Vec::new(),
            memory: HashMap::new(),
        }
    }

    /// Route `subscriber_id` to `sink` through a queue of `queue_capacity` batches.
    ///
    /// # Errors
    /// `DuplicateSubscriber` if the id is already routed.
    pub fn sink<S>(
        mut self,
        subscriber_id: impl Into<SubscriberId>,
        sink: S,
        queue_capacity: usize,
    ) -> Result<Self, DispatcherError>
    where
        S: BatchSink<R> + Send + 'static,
    {
        let subscriber_id = subscriber_id.into();
        if self.spawners.iter().any(|(id, _)| *id == subscriber_id) {
            return Err(DispatcherError::DuplicateSubscriber { subscriber_id });
        }

        let id = subscriber_id.clone();
        self.spawners.push((
            subscriber_id,
            Box::new(move || SubscriberHandle::spawn(id, sink, queue_capacity)),
        ));
        Ok(self)
    }

    /// Route `subscriber_id` to a fresh [`MemorySink`]; the record is kept on the router.
    pub fn memory(
        self,
        subscriber_id: impl Into<SubscriberId>,
        queue_capacity: usize,
    ) -> Result<Self, DispatcherError>
    where
        R: Clone,
    {
        let subscriber_id = subscriber_id.into();
        let sink = MemorySink::new(subscriber_id.to_string());
        let record = sink.record();

        let mut builder = self.sink(subscriber_id.clone(), sink, queue_capacity)?;
        builder.memory.insert(subscriber_id, record);
        Ok(builder)
    }

    /// Add one subscriber from its blueprint entry
    #[instrument(
        name = "router_add_subscriber",
        skip(self, config),
        fields(subscriber = %config.id, sink_type = ?config.sink_type)
    )]
    pub fn subscriber_config(self, config: &SubscriberConfig) -> Result<Self, DispatcherError>
    where
        R: Serialize + Clone,
    {
        match config.sink_type {
            SinkType::Log => self.sink(
                config.id.clone(),
                LogSink::new(config.id.to_string()),
                config.queue_capacity,
            ),
            SinkType::File => {
                let sink = FileSink::from_params(config.id.to_string(), &config.params)
                    .map_err(|e| DispatcherError::sink_creation(&config.id, e.to_string()))?;
                self.sink(config.id.clone(), sink, config.queue_capacity)
            }
            SinkType::Memory => self.memory(config.id.clone(), config.queue_capacity),
        }
    }

    /// Spawn every worker and return the router
    #[instrument(name = "router_builder_build", skip(self), fields(subscribers = self.spawners.len()))]
    pub async fn build(self) -> BatchRouter<R> {
        let routes: HashMap<_, _> = self
            .spawners
            .into_iter()
            .map(|(id, spawn)| (id, spawn()))
            .collect();

        let metrics = routes
            .iter()
            .map(|(id, handle)| (id.clone(), Arc::clone(handle.metrics())))
            .collect();

        info!(subscribers = routes.len(), "Batch router started");

        BatchRouter {
            routes: RwLock::new(routes),
            metrics,
            memory: self.memory,
            closed: AtomicBool::new(false),
        }
    }
}

impl<R: Send + Sync + 'static> Default for BatchRouterBuilder<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Routes delivered batches to per-subscriber queues.
///
/// `deliver` never waits: a full queue drops the batch and reports
/// `QueueFull`. Sink writes happen on the subscriber's worker task.
pub struct BatchRouter<R> {
    routes: RwLock<HashMap<SubscriberId, SubscriberHandle<R>>>,
    /// Outlives the handles so counters stay readable after shutdown
    metrics: HashMap<SubscriberId, Arc<SinkMetrics>>,
    memory: HashMap<SubscriberId, MemoryRecord<R>>,
    closed: AtomicBool,
}

impl<R: Send + Sync + 'static> BatchRouter<R> {
    pub fn builder() -> BatchRouterBuilder<R> {
        BatchRouterBuilder::new()
    }

    fn read_routes(&self) -> RwLockReadGuard<'_, HashMap<SubscriberId, SubscriberHandle<R>>> {
        self.routes.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_routes(&self) -> RwLockWriteGuard<'_, HashMap<SubscriberId, SubscriberHandle<R>>> {
        self.routes.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Routed subscriber ids, sorted
    pub fn subscriber_ids(&self) -> Vec<SubscriberId> {
        let mut ids: Vec<_> = self.metrics.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Record of a memory-backed subscriber
    pub fn memory_record(&self, subscriber_id: &str) -> Option<MemoryRecord<R>> {
        self.memory.get(subscriber_id).cloned()
    }

    /// Per-subscriber metrics, sorted by subscriber id
    pub fn metrics(&self) -> Vec<(SubscriberId, MetricsSnapshot)> {
        let mut out: Vec<_> = self
            .metrics
            .iter()
            .map(|(id, m)| (id.clone(), m.snapshot()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Metrics summed over every subscriber
    pub fn total_metrics(&self) -> MetricsSnapshot {
        self.metrics
            .values()
            .map(|m| m.snapshot())
            .fold(MetricsSnapshot::default(), MetricsSnapshot::merge)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Close every queue, drain the workers and flush/close their sinks.
    ///
    /// Later deliveries fail with `ChannelClosed`. Calling it twice is a no-op.
    #[instrument(name = "router_shutdown", skip(self))]
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        let handles = std::mem::take(&mut *self.write_routes());
        debug!(subscribers = handles.len(), "Shutting down subscriber workers");

        for handle in handles.into_values() {
            handle.shutdown().await;
        }

        info!("Batch router shutdown complete");
    }
}

impl<R: Send + Sync + 'static> DeliveryChannel<R> for BatchRouter<R> {
    fn deliver(&self, batch: Batch<R>) -> Result<(), ContractError> {
        let routes = self.read_routes();
        match routes.get(&batch.subscriber_id) {
            Some(handle) => handle.try_send(batch),
            None if self.is_closed() => Err(ContractError::ChannelClosed {
                subscriber_id: batch.subscriber_id.to_string(),
            }),
            None => Err(ContractError::unknown_subscriber(batch.subscriber_id.to_string())),
        }
    }
}

/// Build and start a router from blueprint subscriber entries
#[instrument(name = "router_create", skip(subscribers), fields(count = subscribers.len()))]
pub async fn create_router<R>(
    subscribers: &[SubscriberConfig],
) -> Result<BatchRouter<R>, DispatcherError>
where
    R: Serialize + Clone + Send + Sync + 'static,
{
    let builder = subscribers
        .iter()
        .try_fold(BatchRouter::builder(), |builder, config| {
            builder.subscriber_config(config)
        })?;
    Ok(builder.build().await)
}
