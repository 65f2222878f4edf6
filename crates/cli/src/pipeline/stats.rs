//! Pipeline statistics.

use std::time::Duration;

use dispatcher::MetricsSnapshot;
use frame_scheduler::SchedulerStats;
use observability::DispatchSummary;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Total duration of the run
    pub duration: Duration,

    /// Number of routed subscribers
    pub subscribers: usize,

    /// Scheduler counters
    pub scheduler: SchedulerStats,

    /// Per-frame running statistics
    pub dispatch: DispatchSummary,

    /// Queue and sink counters summed over all subscribers
    pub sinks: MetricsSnapshot,
}

impl PipelineStats {
    /// Dispatched frames per second
    pub fn fps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.scheduler.frames_dispatched as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Registrations absorbed per frame request
    pub fn coalescing_ratio(&self) -> f64 {
        if self.scheduler.frame_requests > 0 {
            self.scheduler.registrations as f64 / self.scheduler.frame_requests as f64
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        let s = &self.scheduler;

        println!("\n=== Frame Coalescer Statistics ===\n");

        println!("Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Subscribers: {}", self.subscribers);
        println!("   ├─ Frames dispatched: {}", s.frames_dispatched);
        println!("   ├─ FPS: {:.2}", self.fps());
        println!("   └─ Registrations per request: {:.2}", self.coalescing_ratio());

        println!("\nScheduler");
        println!("   ├─ Registrations: {}", s.registrations);
        println!("   ├─ Frame requests: {}", s.frame_requests);
        println!("   ├─ Batches delivered: {}", s.batches_delivered);
        println!("   ├─ Results delivered: {}", s.results_delivered);
        println!("   ├─ Transformer failures: {}", s.transformer_failures);
        println!("   ├─ Delivery failures: {}", s.delivery_failures);
        println!("   └─ Defects: {}", s.defects);

        println!("\nDispatch");
        println!("   {}", self.dispatch);

        println!("\nSinks");
        println!("   ├─ Batches written: {}", self.sinks.write_count);
        println!("   ├─ Results written: {}", self.sinks.results_written);
        println!("   ├─ Write failures: {}", self.sinks.failure_count);
        println!("   └─ Dropped (queue full): {}", self.sinks.dropped_count);

        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coalescing_ratio() {
        let stats = PipelineStats {
            scheduler: SchedulerStats {
                registrations: 30,
                frame_requests: 10,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(stats.coalescing_ratio(), 3.0);
        assert_eq!(PipelineStats::default().coalescing_ratio(), 0.0);
    }

    #[test]
    fn test_fps() {
        let stats = PipelineStats {
            duration: Duration::from_secs(2),
            scheduler: SchedulerStats {
                frames_dispatched: 120,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(stats.fps(), 60.0);
    }
}
