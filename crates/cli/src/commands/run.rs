//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(&args.config).into());
    }

    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(interval_ms) = args.interval_ms {
        info!(interval_ms, "Overriding clock interval from CLI");
        blueprint.clock.interval_ms = interval_ms;
        config_loader::ConfigLoader::validate(&blueprint)
            .map_err(|e| CliError::invalid_override("--interval-ms", e.to_string()))?;
    }
    if args.bursts_per_frame == 0 {
        return Err(CliError::invalid_override("--bursts-per-frame", "must be at least 1").into());
    }

    info!(
        clock = ?blueprint.clock.kind,
        interval_ms = blueprint.clock.interval_ms,
        subscribers = blueprint.subscribers.len(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let pipeline_config = PipelineConfig {
        blueprint,
        max_frames: (args.max_frames > 0).then_some(args.max_frames),
        timeout: (args.timeout > 0).then(|| Duration::from_secs(args.timeout)),
        bursts_per_frame: args.bursts_per_frame,
        animation_ms: args.animation_ms,
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
    };

    let pipeline = Pipeline::new(pipeline_config);
    let shutdown_signal = setup_shutdown_signal();

    info!("Starting pipeline...");

    tokio::select! {
        result = pipeline.run() => {
            let stats = result.context("Pipeline execution failed")?;
            info!(
                frames = stats.scheduler.frames_dispatched,
                frame_requests = stats.scheduler.frame_requests,
                registrations = stats.scheduler.registrations,
                duration_secs = stats.duration.as_secs_f64(),
                fps = format!("{:.2}", stats.fps()),
                "Pipeline completed successfully"
            );
            stats.print_summary();
        }
        _ = shutdown_signal => {
            warn!("Received shutdown signal, stopping pipeline...");
        }
    }

    info!("Frame Coalescer finished");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &contracts::CoalescerBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Clock:");
    println!("  Kind: {:?}", blueprint.clock.kind);
    println!("  Interval: {:.3} ms", blueprint.clock.interval_ms);

    println!("\nSubscribers ({}):", blueprint.subscribers.len());
    for subscriber in &blueprint.subscribers {
        println!(
            "  - {} ({:?}, queue {})",
            subscriber.id, subscriber.sink_type, subscriber.queue_capacity
        );
    }

    println!();
}
