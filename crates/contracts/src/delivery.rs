//! DeliveryChannel trait - hands finished batches to subscribers

use std::sync::Arc;

use crate::{Batch, ContractError};

/// Destination for evaluated batches.
///
/// `deliver` must not block the caller; what happens after hand-off
/// (queueing, sink writes, re-rendering) is the channel's business.
/// An error means the batch was not accepted. The scheduler logs it and
/// never retries.
pub trait DeliveryChannel<R>: Send + Sync {
    /// Hand one subscriber's batch to the channel.
    fn deliver(&self, batch: Batch<R>) -> Result<(), ContractError>;
}

impl<R, D: DeliveryChannel<R> + ?Sized> DeliveryChannel<R> for Arc<D> {
    fn deliver(&self, batch: Batch<R>) -> Result<(), ContractError> {
        (**self).deliver(batch)
    }
}
