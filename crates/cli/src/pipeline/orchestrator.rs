//! Pipeline orchestrator - wires router, clock, scheduler and workload.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{ClockKind, CoalescerBlueprint};
use dispatcher::{create_router, BatchRouter};
use frame_scheduler::{FrameScheduler, IntervalClock, ManualClock};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::workload::{Sample, Workload};
use super::PipelineStats;
use crate::error::CliError;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Validated coalescer blueprint
    pub blueprint: CoalescerBlueprint,

    /// Maximum number of frames to dispatch (None = unlimited)
    pub max_frames: Option<u64>,

    /// Run timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Registrations per subscriber between two frames
    pub bursts_per_frame: usize,

    /// Length of each synthetic animation
    pub animation_ms: f64,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Frame source selected by the blueprint
enum Clocking {
    Interval(IntervalClock),
    Manual { clock: ManualClock, step_ms: f64 },
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline to completion
    pub async fn run(self) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        info!("Setting up batch router...");
        let router: Arc<BatchRouter<Sample>> = Arc::new(
            create_router(&blueprint.subscribers)
                .await
                .context("Failed to create batch router")?,
        );
        info!(subscribers = router.subscriber_ids().len(), "Batch router started");

        let clocking = match blueprint.clock.kind {
            ClockKind::Interval => Clocking::Interval(
                IntervalClock::from_interval_ms(blueprint.clock.interval_ms)
                    .map_err(|e| CliError::clock(e.to_string()))?,
            ),
            ClockKind::Manual => Clocking::Manual {
                clock: ManualClock::new(),
                step_ms: blueprint.clock.interval_ms,
            },
        };

        let scheduler = match &clocking {
            Clocking::Interval(clock) => FrameScheduler::new(clock.clone(), Arc::clone(&router)),
            Clocking::Manual { clock, .. } => {
                FrameScheduler::new(clock.clone(), Arc::clone(&router))
            }
        };

        let workload = Workload::new(
            blueprint.subscriber_ids(),
            self.config.bursts_per_frame,
            self.config.animation_ms,
        );

        info!(
            clock = ?blueprint.clock.kind,
            interval_ms = blueprint.clock.interval_ms,
            bursts_per_frame = self.config.bursts_per_frame,
            max_frames = ?self.config.max_frames,
            "Pipeline running"
        );

        let drive = Self::drive(
            &clocking,
            &scheduler,
            workload,
            self.config.max_frames,
            start_time,
        );

        let completed = match self.config.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, drive).await {
                Ok(result) => Some(result),
                Err(_) => {
                    warn!(timeout_secs = timeout.as_secs(), "Pipeline timed out");
                    None
                }
            },
            None => Some(drive.await),
        };
        if let Some(result) = completed {
            result?;
        }

        if let Clocking::Interval(clock) = &clocking {
            // Let the last outstanding frame land before the queues close.
            tokio::time::sleep(clock.interval() * 2).await;
        }

        info!("Shutting down pipeline...");
        router.shutdown().await;

        let stats = PipelineStats {
            duration: start_time.elapsed(),
            subscribers: router.subscriber_ids().len(),
            scheduler: scheduler.stats(),
            dispatch: scheduler.dispatch_summary(),
            sinks: router.total_metrics(),
        };

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            fps = format!("{:.2}", stats.fps()),
            "Pipeline shutdown complete"
        );

        Ok(stats)
    }

    /// Feed the workload until `max_frames` frames have been dispatched.
    async fn drive(
        clocking: &Clocking,
        scheduler: &FrameScheduler<Sample>,
        mut workload: Workload,
        max_frames: Option<u64>,
        start_time: Instant,
    ) -> Result<()> {
        let reached = |scheduler: &FrameScheduler<Sample>| {
            max_frames.is_some_and(|max| scheduler.stats().frames_dispatched >= max)
        };

        match clocking {
            Clocking::Interval(clock) => {
                let mut ticker = tokio::time::interval(clock.interval());
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

                while !reached(scheduler) {
                    ticker.tick().await;
                    let now_ms = start_time.elapsed().as_secs_f64() * 1000.0;
                    let registered = workload.register_burst(scheduler, now_ms);
                    debug!(registered, now_ms, "Burst registered");
                }
            }
            Clocking::Manual { clock, step_ms } => {
                let mut timestamp = 0.0;
                while !reached(scheduler) {
                    timestamp += step_ms;
                    workload.register_burst(scheduler, timestamp);
                    clock
                        .fire(timestamp)
                        .map_err(|e| CliError::pipeline_execution(e.to_string()))?;
                    // Give subscriber workers a chance to drain.
                    tokio::task::yield_now().await;
                }
            }
        }

        info!(
            frames = scheduler.stats().frames_dispatched,
            "Workload finished"
        );
        Ok(())
    }
}
