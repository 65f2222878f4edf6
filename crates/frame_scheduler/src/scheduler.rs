//! Coalescing frame scheduler.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use contracts::{Batch, ContractError, DeliveryChannel, FrameClock, SubscriberId, Transformer};
use observability::{
    record_batch_delivered, record_defect, record_frame_dispatched, record_frame_requested,
    record_registration, record_transformer_failure, DispatchStatsAggregator, DispatchSummary,
};
use tracing::{debug, error, instrument, trace, warn};

use crate::arbiter::{ArbiterState, RegistrationAction};
use crate::clock::IntervalClock;
use crate::error::SchedulerError;
use crate::pending::{PendingEntry, PendingSet};
use crate::{lock, panic_message};

/// Batches transformer work per subscriber and flushes it once per frame.
///
/// Any number of [`register`](Self::register) calls between two frames cost
/// exactly one frame-clock request. When the frame fires, every pending
/// transformer is evaluated with the frame timestamp and each subscriber
/// receives one [`Batch`].
///
/// Cloning is cheap; clones share the same pending set and clock request.
pub struct FrameScheduler<R> {
    inner: Arc<Inner<R>>,
}

struct Inner<R> {
    clock: Arc<dyn FrameClock>,
    delivery: Arc<dyn DeliveryChannel<R>>,
    /// Intake and the start of dispatch both run under this lock
    state: Mutex<SchedulerState<R>>,
    counters: Counters,
    aggregator: Mutex<DispatchStatsAggregator>,
}

struct SchedulerState<R> {
    arbiter: ArbiterState,
    pending: PendingSet<R>,
    frame_seq: u64,
}

#[derive(Default)]
struct Counters {
    registrations: AtomicU64,
    frame_requests: AtomicU64,
    frames_dispatched: AtomicU64,
    batches_delivered: AtomicU64,
    results_delivered: AtomicU64,
    transformer_failures: AtomicU64,
    delivery_failures: AtomicU64,
    defects: AtomicU64,
}

/// Diagnostic counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub registrations: u64,
    pub frame_requests: u64,
    pub frames_dispatched: u64,
    pub batches_delivered: u64,
    pub results_delivered: u64,
    pub transformer_failures: u64,
    pub delivery_failures: u64,
    /// Frames that fired with no outstanding request
    pub defects: u64,
}

/// Outcome of one fired frame.
#[derive(Debug)]
pub struct DispatchReport {
    pub frame_seq: u64,
    pub timestamp: f64,
    /// Subscribers drained from the pending set
    pub subscribers: usize,
    pub batches_delivered: usize,
    pub results_delivered: usize,
    /// Per-subscriber failures; other subscribers were unaffected
    pub failures: Vec<SchedulerError>,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl<R: Send + 'static> FrameScheduler<R> {
    /// Create a scheduler over `clock` and `delivery`.
    pub fn new<C, D>(clock: C, delivery: D) -> Self
    where
        C: FrameClock + 'static,
        D: DeliveryChannel<R> + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                clock: Arc::new(clock),
                delivery: Arc::new(delivery),
                state: Mutex::new(SchedulerState {
                    arbiter: ArbiterState::default(),
                    pending: PendingSet::default(),
                    frame_seq: 0,
                }),
                counters: Counters::default(),
                aggregator: Mutex::new(DispatchStatsAggregator::new()),
            }),
        }
    }

    /// Scheduler on the 60 Hz fallback clock of the current tokio runtime.
    ///
    /// # Errors
    /// `ClockUnavailable` outside a runtime.
    pub fn with_fallback_clock<D>(delivery: D) -> Result<Self, ContractError>
    where
        D: DeliveryChannel<R> + 'static,
    {
        Ok(Self::new(IntervalClock::fallback()?, delivery))
    }

    /// Queue `transformers` for `subscriber_id` on the next frame.
    ///
    /// Transformers for the same subscriber accumulate in call order until the
    /// frame fires. Only the first registration after a dispatch issues a
    /// frame request. An empty list is ignored.
    pub fn register<I>(&self, subscriber_id: impl Into<SubscriberId>, transformers: I)
    where
        I: IntoIterator<Item = Transformer<R>>,
    {
        let subscriber_id = subscriber_id.into();
        let transformers: Vec<Transformer<R>> = transformers.into_iter().collect();
        if transformers.is_empty() {
            trace!(subscriber = %subscriber_id, "empty registration ignored");
            return;
        }

        let count = transformers.len();
        record_registration(&subscriber_id, count);
        self.inner
            .counters
            .registrations
            .fetch_add(1, Ordering::Relaxed);

        let action = {
            let mut state = lock(&self.inner.state);
            state.pending.append(subscriber_id.clone(), transformers);
            state.arbiter.on_registration()
        };

        trace!(subscriber = %subscriber_id, transformers = count, ?action, "registered");

        if action == RegistrationAction::IssueRequest {
            Inner::request_frame(&self.inner);
        }
    }

    /// Snapshot of the diagnostic counters.
    pub fn stats(&self) -> SchedulerStats {
        let c = &self.inner.counters;
        SchedulerStats {
            registrations: c.registrations.load(Ordering::Relaxed),
            frame_requests: c.frame_requests.load(Ordering::Relaxed),
            frames_dispatched: c.frames_dispatched.load(Ordering::Relaxed),
            batches_delivered: c.batches_delivered.load(Ordering::Relaxed),
            results_delivered: c.results_delivered.load(Ordering::Relaxed),
            transformer_failures: c.transformer_failures.load(Ordering::Relaxed),
            delivery_failures: c.delivery_failures.load(Ordering::Relaxed),
            defects: c.defects.load(Ordering::Relaxed),
        }
    }

    /// Running statistics over every dispatched frame.
    pub fn dispatch_summary(&self) -> DispatchSummary {
        lock(&self.inner.aggregator).summary()
    }
}

impl<R: Send + 'static> Inner<R> {
    fn request_frame(this: &Arc<Self>) {
        this.counters.frame_requests.fetch_add(1, Ordering::Relaxed);
        record_frame_requested();

        let inner = Arc::clone(this);
        this.clock
            .request_frame(Box::new(move |timestamp| inner.on_frame_fired(timestamp)));
    }

    /// Frame clock callback.
    fn on_frame_fired(&self, timestamp: f64) {
        match self.dispatch(timestamp) {
            Ok(report) if report.is_clean() => {
                debug!(
                    frame_seq = report.frame_seq,
                    timestamp,
                    subscribers = report.subscribers,
                    results = report.results_delivered,
                    "frame dispatched"
                );
            }
            Ok(report) => {
                for failure in &report.failures {
                    warn!(frame_seq = report.frame_seq, timestamp, error = %failure, "batch not delivered");
                }
            }
            Err(err) => {
                self.counters.defects.fetch_add(1, Ordering::Relaxed);
                record_defect(err.kind());
                error!(timestamp, error = %err, "frame scheduler state desynchronized from clock");
            }
        }
    }

    /// Reset the arbiter, drain the pending set, then evaluate and deliver.
    ///
    /// Fails only when no request was outstanding; nothing is drained then.
    #[instrument(level = "trace", skip(self))]
    fn dispatch(&self, timestamp: f64) -> Result<DispatchReport, SchedulerError> {
        let (frame_seq, entries) = {
            let mut state = lock(&self.state);
            state.arbiter.on_frame(timestamp)?;
            state.frame_seq += 1;
            (state.frame_seq, state.pending.drain())
        };

        let subscribers = entries.len();
        self.counters
            .frames_dispatched
            .fetch_add(1, Ordering::Relaxed);
        let interval = lock(&self.aggregator).begin_frame(timestamp, subscribers);
        record_frame_dispatched(subscribers, interval);

        let mut report = DispatchReport {
            frame_seq,
            timestamp,
            subscribers,
            batches_delivered: 0,
            results_delivered: 0,
            failures: Vec::new(),
        };

        for entry in entries {
            match self.flush_entry(entry, frame_seq, timestamp) {
                Ok(delivered) => {
                    report.batches_delivered += 1;
                    report.results_delivered += delivered;
                }
                Err(err) => report.failures.push(err),
            }
        }

        Ok(report)
    }

    /// Evaluate one subscriber's transformers and hand the batch over.
    fn flush_entry(
        &self,
        entry: PendingEntry<R>,
        frame_seq: u64,
        timestamp: f64,
    ) -> Result<usize, SchedulerError> {
        let subscriber_id = entry.subscriber_id.clone();

        let results = match panic::catch_unwind(AssertUnwindSafe(|| entry.evaluate(timestamp))) {
            Ok(results) => results,
            Err(payload) => {
                self.counters
                    .transformer_failures
                    .fetch_add(1, Ordering::Relaxed);
                record_transformer_failure(&subscriber_id);
                lock(&self.aggregator).record_transformer_failure();
                return Err(SchedulerError::TransformerPanicked {
                    subscriber_id,
                    message: panic_message(&*payload),
                });
            }
        };

        let size = results.len();
        let batch = Batch {
            subscriber_id: subscriber_id.clone(),
            frame_seq,
            timestamp,
            results,
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.delivery.deliver(batch)))
            .unwrap_or_else(|payload| {
                Err(ContractError::Other(format!(
                    "delivery channel panicked: {}",
                    panic_message(&*payload)
                )))
            });

        let delivered = outcome.is_ok();
        record_batch_delivered(&subscriber_id, size, delivered);
        lock(&self.aggregator).record_batch(size, delivered);

        match outcome {
            Ok(()) => {
                self.counters
                    .batches_delivered
                    .fetch_add(1, Ordering::Relaxed);
                self.counters
                    .results_delivered
                    .fetch_add(size as u64, Ordering::Relaxed);
                Ok(size)
            }
            Err(source) => {
                self.counters
                    .delivery_failures
                    .fetch_add(1, Ordering::Relaxed);
                Err(SchedulerError::Delivery {
                    subscriber_id,
                    source,
                })
            }
        }
    }
}

impl<R> Clone for FrameScheduler<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R> fmt::Debug for FrameScheduler<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.inner.state);
        f.debug_struct("FrameScheduler")
            .field("arbiter", &state.arbiter)
            .field("frame_seq", &state.frame_seq)
            .field("pending_subscribers", &state.pending.subscriber_count())
            .finish_non_exhaustive()
    }
}
