//! # Frame Scheduler
//!
//! 帧合并调度器：把两次帧之间的所有注册合并为一次帧请求。
//!
//! 负责：
//! - 注册接收 (按订阅者追加 transformer)
//! - 请求仲裁 (每帧最多一个未完成请求)
//! - 帧分发 (重置状态、取出待处理集合、求值、按订阅者投递)
//! - 帧时钟实现 (`IntervalClock` / `ManualClock`)
//! - 不合并的直通转发 (`forward_frame`)
//!
//! ## 使用示例
//!
//! ```ignore
//! use frame_scheduler::{FrameScheduler, ManualClock};
//! use contracts::transformer;
//!
//! let clock = ManualClock::new();
//! let scheduler = FrameScheduler::new(clock.clone(), router);
//!
//! scheduler.register("hud", [transformer(|t| t * 0.5)]);
//! scheduler.register("hud", [transformer(|t| t * 2.0)]);
//!
//! // 一次请求，一个批次
//! clock.fire(16.7)?;
//! ```

mod arbiter;
mod clock;
mod error;
mod passthrough;
mod pending;
mod scheduler;

use std::any::Any;
use std::sync::{Mutex, MutexGuard, PoisonError};

// Re-exports
pub use clock::{IntervalClock, ManualClock};
pub use error::SchedulerError;
pub use passthrough::forward_frame;
pub use scheduler::{DispatchReport, FrameScheduler, SchedulerStats};

// Re-export contracts types
pub use contracts::{
    transformer, Batch, DeliveryChannel, FrameCallback, FrameClock, SubscriberId, Transformer,
};

/// Lock that survives poisoning; user code never runs under these locks.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
