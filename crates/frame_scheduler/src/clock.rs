//! Frame clock implementations.
//!
//! - [`IntervalClock`]: fixed-interval timer on a tokio runtime, used when no
//!   native display-refresh source is available.
//! - [`ManualClock`]: frames fire only when [`ManualClock::fire`] is called.
//!   Deterministic; used by tests and single-step runs.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use contracts::{ContractError, FrameCallback, FrameClock, FALLBACK_FRAME_INTERVAL_MS};
use tokio::runtime::Handle;
use tokio::time::Instant;
use tracing::{trace, warn};

use crate::{lock, panic_message};

/// Smallest step used to keep timestamps strictly increasing (ms).
const MIN_STEP_MS: f64 = 1e-6;

/// Fixed-interval frame clock.
///
/// Frames land on a grid of `interval` boundaries measured from the clock's
/// origin. Each request sleeps until the next boundary, then fires with the
/// milliseconds elapsed since the origin.
#[derive(Clone)]
pub struct IntervalClock {
    inner: Arc<IntervalInner>,
}

struct IntervalInner {
    handle: Handle,
    origin: Instant,
    interval: Duration,
    last_stamp: Mutex<f64>,
    requests: AtomicU64,
}

impl IntervalClock {
    /// Create a clock that spawns its timers on `handle`.
    pub fn new(handle: Handle, interval: Duration) -> Self {
        Self {
            inner: Arc::new(IntervalInner {
                handle,
                origin: Instant::now(),
                interval: interval.max(Duration::from_nanos(1)),
                last_stamp: Mutex::new(0.0),
                requests: AtomicU64::new(0),
            }),
        }
    }

    /// Create a clock on the current tokio runtime.
    ///
    /// # Errors
    /// `ClockUnavailable` when called outside a runtime.
    pub fn try_current(interval: Duration) -> Result<Self, ContractError> {
        let handle = Handle::try_current()
            .map_err(|e| ContractError::clock_unavailable(format!("no tokio runtime: {e}")))?;
        Ok(Self::new(handle, interval))
    }

    /// Create a clock on the current runtime from an interval in milliseconds.
    ///
    /// # Errors
    /// `ConfigValidation` for an interval that is non-finite, non-positive
    /// or too large for a `Duration`; `ClockUnavailable` outside a runtime.
    pub fn from_interval_ms(interval_ms: f64) -> Result<Self, ContractError> {
        if !interval_ms.is_finite() || interval_ms <= 0.0 {
            return Err(ContractError::config_validation(
                "clock.interval_ms",
                format!("interval must be a positive number of milliseconds, got {interval_ms}"),
            ));
        }
        let interval = Duration::try_from_secs_f64(interval_ms / 1000.0).map_err(|e| {
            ContractError::config_validation(
                "clock.interval_ms",
                format!("interval {interval_ms} ms is out of range: {e}"),
            )
        })?;
        Self::try_current(interval)
    }

    /// 60 Hz fallback clock on the current runtime.
    pub fn fallback() -> Result<Self, ContractError> {
        Self::from_interval_ms(FALLBACK_FRAME_INTERVAL_MS)
    }

    /// Configured frame interval.
    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// Number of frame requests received so far.
    pub fn total_requests(&self) -> u64 {
        self.inner.requests.load(Ordering::Relaxed)
    }
}

impl IntervalInner {
    /// First grid boundary strictly after `now`.
    fn next_deadline(&self, now: Instant) -> Instant {
        let elapsed = now.saturating_duration_since(self.origin).as_nanos();
        let step = self.interval.as_nanos();
        let ticks = elapsed / step + 1;
        let offset = u64::try_from(ticks.saturating_mul(step)).unwrap_or(u64::MAX);
        self.origin + Duration::from_nanos(offset)
    }

    fn stamp(&self) -> f64 {
        let elapsed_ms = self.origin.elapsed().as_secs_f64() * 1000.0;
        let mut last = lock(&self.last_stamp);
        let stamp = if elapsed_ms > *last {
            elapsed_ms
        } else {
            *last + MIN_STEP_MS
        };
        *last = stamp;
        stamp
    }
}

impl FrameClock for IntervalClock {
    fn request_frame(&self, callback: FrameCallback) {
        self.inner.requests.fetch_add(1, Ordering::Relaxed);

        let inner = Arc::clone(&self.inner);
        let deadline = inner.next_deadline(Instant::now());
        self.inner.handle.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let timestamp = inner.stamp();
            trace!(timestamp, "interval clock fired");
            callback(timestamp);
        });
    }
}

impl fmt::Debug for IntervalClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntervalClock")
            .field("interval", &self.inner.interval)
            .field("requests", &self.total_requests())
            .finish()
    }
}

/// Frame clock driven by explicit [`fire`](ManualClock::fire) calls.
///
/// Cloning shares the queue, so a test can keep one handle while the
/// scheduler owns another.
#[derive(Clone, Default)]
pub struct ManualClock {
    inner: Arc<Mutex<ManualState>>,
}

#[derive(Default)]
struct ManualState {
    queued: Vec<FrameCallback>,
    last_timestamp: Option<f64>,
    total_requests: u64,
    frames_fired: u64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire one frame at `timestamp`.
    ///
    /// Invokes every callback queued before this call and returns how many
    /// ran. Callbacks requested while firing wait for the next `fire`.
    /// A callback that panics is logged and the rest still run.
    ///
    /// # Errors
    /// `NonMonotonicTimestamp` if `timestamp` does not exceed the previous
    /// fired timestamp (or is not finite). Nothing is invoked in that case.
    pub fn fire(&self, timestamp: f64) -> Result<usize, ContractError> {
        let callbacks = {
            let mut state = lock(&self.inner);
            let previous = state.last_timestamp.unwrap_or(f64::NEG_INFINITY);
            let advances = timestamp.is_finite()
                && timestamp.partial_cmp(&previous) == Some(std::cmp::Ordering::Greater);
            if !advances {
                return Err(ContractError::NonMonotonicTimestamp {
                    timestamp,
                    previous,
                });
            }
            state.last_timestamp = Some(timestamp);
            state.frames_fired += 1;
            std::mem::take(&mut state.queued)
        };

        let fired = callbacks.len();
        for callback in callbacks {
            // A panicking callback must not drop the ones queued after it.
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback(timestamp))) {
                warn!(
                    timestamp,
                    message = %panic_message(&*payload),
                    "manual clock callback panicked"
                );
            }
        }
        Ok(fired)
    }

    /// Requests waiting for the next `fire`.
    pub fn outstanding(&self) -> usize {
        lock(&self.inner).queued.len()
    }

    /// Requests received over the clock's lifetime.
    pub fn total_requests(&self) -> u64 {
        lock(&self.inner).total_requests
    }

    /// Number of `fire` calls that succeeded.
    pub fn frames_fired(&self) -> u64 {
        lock(&self.inner).frames_fired
    }

    /// Timestamp of the most recent frame.
    pub fn last_timestamp(&self) -> Option<f64> {
        lock(&self.inner).last_timestamp
    }
}

impl FrameClock for ManualClock {
    fn request_frame(&self, callback: FrameCallback) {
        let mut state = lock(&self.inner);
        state.total_requests += 1;
        state.queued.push(callback);
    }
}

impl fmt::Debug for ManualClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.inner);
        f.debug_struct("ManualClock")
            .field("outstanding", &state.queued.len())
            .field("total_requests", &state.total_requests)
            .field("last_timestamp", &state.last_timestamp)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::oneshot;

    #[test]
    fn test_manual_clock_fires_queued_callbacks_once() {
        let clock = ManualClock::new();
        let calls = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let calls = Arc::clone(&calls);
            clock.request_frame(Box::new(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
            }));
        }
        assert_eq!(clock.outstanding(), 3);

        assert_eq!(clock.fire(16.0).unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(clock.outstanding(), 0);

        assert_eq!(clock.fire(32.0).unwrap(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(clock.total_requests(), 3);
        assert_eq!(clock.frames_fired(), 2);
    }

    #[test]
    fn test_manual_clock_rejects_non_increasing_timestamps() {
        let clock = ManualClock::new();
        clock.fire(10.0).unwrap();

        assert!(matches!(
            clock.fire(10.0),
            Err(ContractError::NonMonotonicTimestamp { .. })
        ));
        assert!(clock.fire(5.0).is_err());
        assert!(clock.fire(f64::NAN).is_err());
        assert_eq!(clock.last_timestamp(), Some(10.0));
    }

    #[test]
    fn test_manual_clock_defers_requests_made_while_firing() {
        let clock = ManualClock::new();
        let fired_at = Arc::new(Mutex::new(Vec::new()));

        let inner_clock = clock.clone();
        let log = Arc::clone(&fired_at);
        clock.request_frame(Box::new(move |t| {
            log.lock().unwrap().push(t);
            let log = Arc::clone(&log);
            inner_clock.request_frame(Box::new(move |t| log.lock().unwrap().push(t)));
        }));

        assert_eq!(clock.fire(1.0).unwrap(), 1);
        assert_eq!(clock.outstanding(), 1);
        assert_eq!(clock.fire(2.0).unwrap(), 1);
        assert_eq!(*fired_at.lock().unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_manual_clock_runs_every_callback_when_one_panics() {
        let clock = ManualClock::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let before = Arc::clone(&calls);
        clock.request_frame(Box::new(move |_| {
            before.fetch_add(1, Ordering::SeqCst);
        }));
        clock.request_frame(Box::new(|_| panic!("callback failed")));
        let after = Arc::clone(&calls);
        clock.request_frame(Box::new(move |_| {
            after.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(clock.fire(5.0).unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(clock.outstanding(), 0);
        assert_eq!(clock.last_timestamp(), Some(5.0));
    }

    #[test]
    fn test_interval_clock_requires_runtime() {
        let err = IntervalClock::try_current(Duration::from_millis(16)).unwrap_err();
        assert!(matches!(err, ContractError::ClockUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_interval_clock_rejects_bad_interval() {
        assert!(IntervalClock::from_interval_ms(0.0).is_err());
        assert!(IntervalClock::from_interval_ms(f64::INFINITY).is_err());
        assert!(matches!(
            IntervalClock::from_interval_ms(1e30),
            Err(ContractError::ConfigValidation { .. })
        ));
        assert!(IntervalClock::fallback().is_ok());
    }

    #[tokio::test]
    async fn test_interval_clock_fires_asynchronously_with_increasing_stamps() {
        let clock = IntervalClock::from_interval_ms(5.0).unwrap();

        let (tx1, rx1) = oneshot::channel();
        clock.request_frame(Box::new(move |t| {
            let _ = tx1.send(t);
        }));
        let first = rx1.await.unwrap();

        let (tx2, rx2) = oneshot::channel();
        clock.request_frame(Box::new(move |t| {
            let _ = tx2.send(t);
        }));
        let second = rx2.await.unwrap();

        assert!(first > 0.0);
        assert!(second > first, "{second} should exceed {first}");
        assert_eq!(clock.total_requests(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_clock_aligns_to_grid() {
        let clock = IntervalClock::try_current(Duration::from_millis(10)).unwrap();
        tokio::time::advance(Duration::from_millis(3)).await;

        let (tx, rx) = oneshot::channel();
        clock.request_frame(Box::new(move |t| {
            let _ = tx.send(t);
        }));
        let stamp = rx.await.unwrap();

        assert!((stamp - 10.0).abs() < 1.0, "fired at {stamp}");
    }
}
