//! `info` command implementation.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use contracts::CoalescerBlueprint;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::error::CliError;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    clock: ClockInfo,
    subscribers: Vec<SubscriberInfo>,
}

#[derive(Serialize)]
struct ClockInfo {
    kind: String,
    interval_ms: f64,
    frames_per_second: f64,
}

#[derive(Serialize)]
struct SubscriberInfo {
    id: String,
    sink_type: String,
    queue_capacity: usize,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    params: BTreeMap<String, String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        return Err(CliError::config_not_found(&args.config).into());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let info = build_config_info(&blueprint, args);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(blueprint: &CoalescerBlueprint, args: &InfoArgs) -> ConfigInfo {
    let subscribers = blueprint
        .subscribers
        .iter()
        .map(|s| SubscriberInfo {
            id: s.id.to_string(),
            sink_type: format!("{:?}", s.sink_type),
            queue_capacity: s.queue_capacity,
            params: if args.params {
                s.params.clone().into_iter().collect()
            } else {
                BTreeMap::new()
            },
        })
        .collect();

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        clock: ClockInfo {
            kind: format!("{:?}", blueprint.clock.kind),
            interval_ms: blueprint.clock.interval_ms,
            frames_per_second: 1000.0 / blueprint.clock.interval_ms,
        },
        subscribers,
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("=== Frame Coalescer Configuration ===\n");

    println!("Clock");
    println!("   ├─ Version: {}", info.version);
    println!("   ├─ Kind: {}", info.clock.kind);
    println!(
        "   └─ Interval: {:.3} ms ({:.1} fps)",
        info.clock.interval_ms, info.clock.frames_per_second
    );

    println!("\nSubscribers ({})", info.subscribers.len());
    for (i, subscriber) in info.subscribers.iter().enumerate() {
        let is_last = i == info.subscribers.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        println!(
            "   {} {} ({}, queue {})",
            prefix, subscriber.id, subscriber.sink_type, subscriber.queue_capacity
        );
        for (key, value) in &subscriber.params {
            println!("   {}  · {} = {}", child_prefix, key, value);
        }
    }

    println!();
}
