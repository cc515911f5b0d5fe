//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// WMS Timesync - Time synchronization harness for time-indexed map layers
#[derive(Parser, Debug)]
#[command(
    name = "wms-timesync",
    author,
    version,
    about = "WMS layer time synchronization harness",
    long_about = "A headless animation harness for time-indexed WMS layers.\n\n\
                  Loads an animation blueprint, drives mock layers across the \n\
                  configured time window, gates tick advancement on layer reloads, \n\
                  and dispatches per-tick resolution records to configured sinks."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "WMS_TIMESYNC_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "WMS_TIMESYNC_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the animation pipeline
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
        default_value = "animation.toml",
        env = "WMS_TIMESYNC_CONFIG"
    )]
    pub config: PathBuf,

    /// Override the maximum number of ticks from configuration (0 = whole window)
    #[arg(long, default_value = "0", env = "WMS_TIMESYNC_MAX_TICKS")]
    pub max_ticks: u64,

    /// Override wall-clock pacing between ticks, in milliseconds
    #[arg(long, env = "WMS_TIMESYNC_TICK_INTERVAL_MS")]
    pub tick_interval_ms: Option<u64>,

    /// Validate configuration and exit without running the animation
    #[arg(long)]
    pub dry_run: bool,

    /// Channel buffer size for the record queue
    #[arg(long, default_value = "100", env = "WMS_TIMESYNC_BUFFER_SIZE")]
    pub buffer_size: usize,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "WMS_TIMESYNC_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "animation.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "animation.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show detailed layer information
    #[arg(long)]
    pub layers: bool,

    /// Show sink configuration
    #[arg(long)]
    pub sinks: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
