//! FrameClock trait - display frame notification source
//!
//! The scheduler only ever sees this interface; concrete clocks live in
//! `frame_scheduler::clock`.

use std::sync::Arc;

/// Refresh interval used when no native frame source is available (60 Hz).
pub const FALLBACK_FRAME_INTERVAL_MS: f64 = 1000.0 / 60.0;

/// One-shot frame callback, invoked with the frame timestamp in milliseconds.
pub type FrameCallback = Box<dyn FnOnce(f64) + Send + 'static>;

/// One-shot "next display frame" notification source.
///
/// # Contract
///
/// - `callback` is invoked exactly once per `request_frame` call.
/// - The invocation is asynchronous: never from inside `request_frame`.
/// - Timestamps are strictly increasing across frames for the lifetime of
///   the clock.
pub trait FrameClock: Send + Sync {
    /// Request a single notification for the next frame.
    fn request_frame(&self, callback: FrameCallback);
}

impl<C: FrameClock + ?Sized> FrameClock for Arc<C> {
    fn request_frame(&self, callback: FrameCallback) {
        (**self).request_frame(callback)
    }
}

impl<C: FrameClock + ?Sized> FrameClock for Box<C> {
    fn request_frame(&self, callback: FrameCallback) {
        (**self).request_frame(callback)
    }
}
