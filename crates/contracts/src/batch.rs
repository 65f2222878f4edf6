//! Batch - Frame Dispatcher output
//!
//! One batch per subscriber per fired frame.

use serde::{Deserialize, Serialize};

use crate::SubscriberId;

/// Caller-supplied work evaluated once against a frame timestamp.
///
/// Timestamps are milliseconds on the frame clock's timeline.
pub type Transformer<R> = Box<dyn FnOnce(f64) -> R + Send + 'static>;

/// Box a closure as a [`Transformer`].
///
/// ```
/// let half = contracts::transformer(|t: f64| t / 2.0);
/// assert_eq!(half(100.0), 50.0);
/// ```
pub fn transformer<R, F>(f: F) -> Transformer<R>
where
    F: FnOnce(f64) -> R + Send + 'static,
{
    Box::new(f)
}

/// Results produced for one subscriber by one fired frame.
///
/// `results` has exactly one entry per transformer that was pending for the
/// subscriber, in registration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch<R> {
    /// Destination subscriber
    pub subscriber_id: SubscriberId,

    /// Sequence number of the fired frame (monotonically increasing per scheduler)
    pub frame_seq: u64,

    /// Frame timestamp every transformer was evaluated with (ms)
    pub timestamp: f64,

    /// Evaluated results, in registration order
    pub results: Vec<R>,
}

impl<R> Batch<R> {
    /// Number of results in the batch
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether the batch carries no results
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
