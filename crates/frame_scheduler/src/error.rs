//! Scheduler error types

use contracts::{ContractError, SubscriberId};
use thiserror::Error;

/// Scheduler-specific errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A frame fired while no request was outstanding (internal defect)
    #[error("frame fired at t={timestamp} with no outstanding frame request")]
    FrameWithoutRequest { timestamp: f64 },

    /// A transformer panicked while the subscriber's batch was evaluated
    #[error("transformer for subscriber '{subscriber_id}' panicked: {message}")]
    TransformerPanicked {
        subscriber_id: SubscriberId,
        message: String,
    },

    /// The delivery channel rejected a batch
    #[error("delivery to subscriber '{subscriber_id}' failed: {source}")]
    Delivery {
        subscriber_id: SubscriberId,
        #[source]
        source: ContractError,
    },
}

impl SchedulerError {
    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FrameWithoutRequest { .. } => "frame_without_request",
            Self::TransformerPanicked { .. } => "transformer_panicked",
            Self::Delivery { .. } => "delivery",
        }
    }
}
