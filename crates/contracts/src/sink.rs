//! BatchSink trait - Dispatcher output interface
//!
//! Defines the abstract interface for sinks that consume delivered batches.

use crate::{Batch, ContractError};

/// Batch output trait
///
/// Every sink behind a subscriber queue implements this trait.
#[trait_variant::make(BatchSink: Send)]
pub trait LocalBatchSink<R> {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write one delivered batch
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, batch: &Batch<R>) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
