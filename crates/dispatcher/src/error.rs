//! Dispatcher error types

use contracts::SubscriberId;
use thiserror::Error;

/// Errors raised while building or tearing down the batch router
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Sink could not be created from its configuration
    #[error("failed to create sink for subscriber '{subscriber_id}': {message}")]
    SinkCreation {
        subscriber_id: SubscriberId,
        message: String,
    },

    /// Two sinks were registered under the same subscriber id
    #[error("subscriber '{subscriber_id}' is already routed")]
    DuplicateSubscriber { subscriber_id: SubscriberId },

    /// Contract-level error (sink write, queue state)
    #[error("sink error: {0}")]
    Contract(#[from] contracts::ContractError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatcherError {
    /// Create a sink creation error
    pub fn sink_creation(subscriber_id: &SubscriberId, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            subscriber_id: subscriber_id.clone(),
            message: message.into(),
        }
    }
}
