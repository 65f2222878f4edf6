//! Layered error definitions
//!
//! Categorized by source: config / clock / delivery / sink

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Clock Errors =====
    /// No frame clock could be constructed in the current context
    #[error("frame clock unavailable: {message}")]
    ClockUnavailable { message: String },

    /// A frame timestamp did not advance past the previous one
    #[error("non-monotonic frame timestamp: {timestamp} <= previous {previous}")]
    NonMonotonicTimestamp { timestamp: f64, previous: f64 },

    // ===== Delivery Errors =====
    /// No delivery route registered for the subscriber
    #[error("no delivery route for subscriber '{subscriber_id}'")]
    UnknownSubscriber { subscriber_id: String },

    /// Subscriber queue full, batch dropped
    #[error("queue full for subscriber '{subscriber_id}', batch {frame_seq} dropped")]
    QueueFull {
        subscriber_id: String,
        frame_seq: u64,
    },

    /// Subscriber worker stopped accepting batches
    #[error("delivery channel closed for subscriber '{subscriber_id}'")]
    ChannelClosed { subscriber_id: String },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create clock unavailable error
    pub fn clock_unavailable(message: impl Into<String>) -> Self {
        Self::ClockUnavailable {
            message: message.into(),
        }
    }

    /// Create unknown subscriber error
    pub fn unknown_subscriber(subscriber_id: impl Into<String>) -> Self {
        Self::UnknownSubscriber {
            subscriber_id: subscriber_id.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }
}
