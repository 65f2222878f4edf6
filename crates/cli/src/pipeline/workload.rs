//! Synthetic animation workload.
//!
//! Every frame each subscriber receives a burst of ease-in/out animation
//! samplers. The scheduler evaluates them all against the same frame
//! timestamp, so a burst costs one frame request no matter its size.

use contracts::{transformer, SubscriberId, Transformer};
use frame_scheduler::FrameScheduler;
use serde::Serialize;

/// One evaluated animation sample
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub animation: u64,
    /// Linear progress in `[0, 1]`
    pub progress: f64,
    /// Eased value between the animation's endpoints
    pub value: f64,
}

/// Cubic ease-in/out over `[0, 1]`
pub fn ease_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Animation {
    pub id: u64,
    pub start_ms: f64,
    pub duration_ms: f64,
    pub from: f64,
    pub to: f64,
}

impl Animation {
    pub fn sample(&self, timestamp: f64) -> Sample {
        let progress = if self.duration_ms > 0.0 {
            ((timestamp - self.start_ms) / self.duration_ms).clamp(0.0, 1.0)
        } else {
            1.0
        };
        Sample {
            animation: self.id,
            progress,
            value: self.from + (self.to - self.from) * ease_in_out(progress),
        }
    }

    pub fn into_transformer(self) -> Transformer<Sample> {
        transformer(move |timestamp| self.sample(timestamp))
    }
}

/// Generates bursts of animations for a fixed set of subscribers
#[derive(Debug)]
pub struct Workload {
    subscribers: Vec<SubscriberId>,
    bursts_per_frame: usize,
    animation_ms: f64,
    next_id: u64,
}

impl Workload {
    pub fn new(subscribers: Vec<SubscriberId>, bursts_per_frame: usize, animation_ms: f64) -> Self {
        Self {
            subscribers,
            bursts_per_frame,
            animation_ms,
            next_id: 0,
        }
    }

    /// Register one burst per subscriber; returns the transformers registered.
    pub fn register_burst(&mut self, scheduler: &FrameScheduler<Sample>, now_ms: f64) -> usize {
        let mut registered = 0;
        for subscriber in &self.subscribers {
            for _ in 0..self.bursts_per_frame {
                let animation = Animation {
                    id: self.next_id,
                    start_ms: now_ms,
                    duration_ms: self.animation_ms,
                    from: 0.0,
                    to: (self.next_id % 10 + 1) as f64,
                };
                self.next_id += 1;
                scheduler.register(subscriber.clone(), [animation.into_transformer()]);
                registered += 1;
            }
        }
        registered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ease_in_out_endpoints() {
        assert_eq!(ease_in_out(0.0), 0.0);
        assert_eq!(ease_in_out(1.0), 1.0);
        assert!((ease_in_out(0.5) - 0.5).abs() < 1e-12);
        assert_eq!(ease_in_out(-1.0), 0.0);
        assert_eq!(ease_in_out(2.0), 1.0);
    }

    #[test]
    fn test_ease_in_out_is_monotonic() {
        let samples: Vec<f64> = (0..=100).map(|i| ease_in_out(i as f64 / 100.0)).collect();
        assert!(samples.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn test_animation_sample() {
        let animation = Animation {
            id: 7,
            start_ms: 100.0,
            duration_ms: 200.0,
            from: 10.0,
            to: 20.0,
        };
        assert_eq!(animation.sample(50.0).value, 10.0);
        assert_eq!(animation.sample(200.0).progress, 0.5);
        assert!((animation.sample(200.0).value - 15.0).abs() < 1e-12);
        assert_eq!(animation.sample(400.0).value, 20.0);
    }

    #[test]
    fn test_zero_duration_jumps_to_end() {
        let animation = Animation {
            id: 0,
            start_ms: 0.0,
            duration_ms: 0.0,
            from: 1.0,
            to: 3.0,
        };
        assert_eq!(animation.sample(0.0).value, 3.0);
    }
}
