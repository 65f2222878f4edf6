//! # Dispatcher
//!
//! 批次投递模块。
//!
//! 负责：
//! - 实现 `DeliveryChannel`，按订阅者路由 `Batch`
//! - 每个订阅者独立的有界队列与 worker，慢 sink 不阻塞帧分发
//! - Sinks: Log / File (JSON lines) / Memory

pub mod error;
pub mod handle;
pub mod metrics;
pub mod router;
pub mod sinks;

pub use contracts::{Batch, BatchSink, DeliveryChannel};
pub use error::DispatcherError;
pub use handle::SubscriberHandle;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use router::{create_router, BatchRouter, BatchRouterBuilder};
pub use sinks::{FileSink, FileSinkConfig, LogSink, MemoryRecord, MemorySink};
