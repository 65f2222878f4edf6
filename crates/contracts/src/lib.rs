//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Frame timestamps are milliseconds (f64) on the frame clock's timeline
//! - Timestamps are strictly increasing from one fired frame to the next
//! - `frame_seq` counts fired frames per scheduler, used for ordering/diagnostics

mod batch;
mod blueprint;
mod clock;
mod delivery;
mod error;
mod sink;
mod subscriber_id;

pub use batch::{transformer, Batch, Transformer};
pub use blueprint::*;
pub use clock::{FrameCallback, FrameClock, FALLBACK_FRAME_INTERVAL_MS};
pub use delivery::DeliveryChannel;
pub use error::*;
pub use sink::*;
pub use subscriber_id::SubscriberId;
