//! CLI arguments and subcommands for herakles-usage-sampler.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Report format of the monitor loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "herakles-usage-sampler",
    about = "Delta-based CPU and memory usage sampler for processes and threads",
    long_about = "Delta-based CPU and memory usage sampler for processes and threads.\n\n\
                  Samples a process at a fixed interval and reports its CPU usage as a share \
                  of total system CPU time (normalized) and scaled by core count (absolute), \
                  its resident memory, and the CPU usage of each of its threads.",
    author = "Michael Moll <exporter@herakles.now> - Herakles",
    version = "0.1.0",
    propagate_version = true,
    after_help = "Project: https://github.com/cansp-dev/herakles-usage-sampler — More info: https://www.herakles.now — Support: exporter@herakles.now"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Log level (overrides config file)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Process to sample (default: this process)
    #[arg(short = 'p', long)]
    pub pid: Option<u32>,

    /// Sampling interval in milliseconds
    #[arg(short = 'i', long)]
    pub interval_ms: Option<u64>,

    /// Stop after N sampling rounds (default: run until Ctrl+C)
    #[arg(short = 'n', long)]
    pub iterations: Option<usize>,

    /// Do not sample individual threads
    #[arg(long)]
    pub no_threads: bool,

    /// Also sample child processes
    #[arg(long)]
    pub children: bool,

    /// Report format
    #[arg(short = 'f', long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Override the detected CPU core count
    #[arg(long)]
    pub cores: Option<usize>,

    /// Root of the proc filesystem (Linux only)
    #[arg(long)]
    pub proc_root: Option<PathBuf>,

    /// Clear the terminal before each text report
    #[arg(long)]
    pub clear: bool,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sample a process at a fixed interval (default command)
    Monitor,

    /// Sample this process while generating synthetic CPU and memory load
    Load {
        /// Number of busy CPU threads
        #[arg(long)]
        cpu_threads: Option<usize>,

        /// Number of memory allocating threads
        #[arg(long)]
        memory_threads: Option<usize>,

        /// Upper bound of a single allocated block in MB
        #[arg(long)]
        max_block_mb: Option<usize>,
    },

    /// Validate system requirements and configuration
    Check,

    /// Generate configuration files
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },
}
