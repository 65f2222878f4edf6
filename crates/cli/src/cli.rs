//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Frame Coalescer - batches per-frame work into one clock request per frame
#[derive(Parser, Debug)]
#[command(
    name = "frame-coalescer",
    author,
    version,
    about = "Frame-tick coalescing scheduler driver",
    long_about = "Loads a coalescer blueprint, routes each subscriber to its sink and \n\
                  drives a synthetic animation workload through the scheduler, \n\
                  one frame-clock request per frame."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "FRAME_COALESCER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "FRAME_COALESCER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the scheduler against a synthetic workload
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "coalescer.toml",
        env = "FRAME_COALESCER_CONFIG"
    )]
    pub config: PathBuf,

    /// Override the clock interval from configuration (milliseconds)
    #[arg(long, env = "FRAME_COALESCER_INTERVAL_MS")]
    pub interval_ms: Option<f64>,

    /// Registrations per subscriber between two frames
    #[arg(long, default_value = "3", env = "FRAME_COALESCER_BURSTS_PER_FRAME")]
    pub bursts_per_frame: usize,

    /// Length of each synthetic animation (milliseconds)
    #[arg(long, default_value = "250", env = "FRAME_COALESCER_ANIMATION_MS")]
    pub animation_ms: f64,

    /// Maximum number of frames to dispatch (0 = unlimited)
    #[arg(long, default_value = "0", env = "FRAME_COALESCER_MAX_FRAMES")]
    pub max_frames: u64,

    /// Run timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "FRAME_COALESCER_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "FRAME_COALESCER_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "coalescer.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "coalescer.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show sink parameters for every subscriber
    #[arg(long)]
    pub params: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
