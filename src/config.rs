//! Configuration management for herakles-usage-sampler.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, Commands, ConfigFormat, LogLevel, OutputFormat};
use clap::ValueEnum;
use herakles_usage_sampler::SampleOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

// Default configuration constants
pub const DEFAULT_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_CONFIG_FILE: &str = "herakles-usage-sampler.yaml";
pub const MAX_LOAD_THREADS: usize = 256;

/// Synthetic load settings for the `load` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    /// Busy threads spinning on integer arithmetic (default: 1)
    #[serde(default = "default_cpu_threads")]
    pub cpu_threads: usize,

    /// Threads allocating and filling random-sized blocks (default: 1)
    #[serde(default = "default_memory_threads")]
    pub memory_threads: usize,

    /// Smallest block in MB (default: 10)
    #[serde(default = "default_min_block_mb")]
    pub min_block_mb: usize,

    /// Largest block in MB (default: 100)
    #[serde(default = "default_max_block_mb")]
    pub max_block_mb: usize,

    /// Blocks kept alive per thread before the oldest half is released (default: 8)
    #[serde(default = "default_max_retained_blocks")]
    pub max_retained_blocks: usize,

    /// Pause between two allocations in milliseconds (default: 40)
    #[serde(default = "default_sleep_ms")]
    pub sleep_ms: u64,
}

fn default_cpu_threads() -> usize {
    1
}
fn default_memory_threads() -> usize {
    1
}
fn default_min_block_mb() -> usize {
    10
}
fn default_max_block_mb() -> usize {
    100
}
fn default_max_retained_blocks() -> usize {
    8
}
fn default_sleep_ms() -> u64 {
    40
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            cpu_threads: default_cpu_threads(),
            memory_threads: default_memory_threads(),
            min_block_mb: default_min_block_mb(),
            max_block_mb: default_max_block_mb(),
            max_retained_blocks: default_max_retained_blocks(),
            sleep_ms: default_sleep_ms(),
        }
    }
}

/// Sampler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Sampling
    /// Process to sample; None samples the sampler itself
    pub pid: Option<u32>,
    #[serde(alias = "interval-ms")]
    pub interval_ms: Option<u64>,
    /// None runs until interrupted
    pub iterations: Option<usize>,
    #[serde(alias = "include-threads")]
    pub include_threads: Option<bool>,
    #[serde(alias = "include-children")]
    pub include_children: Option<bool>,
    /// Overrides the detected core count
    #[serde(alias = "core-count")]
    pub core_count: Option<usize>,
    #[serde(alias = "proc-root")]
    pub proc_root: Option<PathBuf>,

    // Output
    #[serde(alias = "output-format")]
    pub output_format: Option<OutputFormat>,
    #[serde(alias = "clear-screen")]
    pub clear_screen: Option<bool>,

    // Logging
    pub log_level: Option<String>,

    // Synthetic load
    #[serde(default)]
    pub load: LoadConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pid: None,
            interval_ms: Some(DEFAULT_INTERVAL_MS),
            iterations: None,
            include_threads: Some(true),
            include_children: Some(false),
            core_count: None,
            proc_root: None,
            output_format: Some(OutputFormat::Text),
            clear_screen: Some(false),
            log_level: Some("info".into()),
            load: LoadConfig::default(),
        }
    }
}

impl Config {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.unwrap_or(DEFAULT_INTERVAL_MS))
    }

    pub fn sample_options(&self) -> SampleOptions {
        SampleOptions {
            include_threads: self.include_threads.unwrap_or(true),
            include_children: self.include_children.unwrap_or(false),
        }
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format.unwrap_or(OutputFormat::Text)
    }

    /// Effective log level; unknown names fall back to info.
    pub fn log_level(&self) -> LogLevel {
        self.log_level
            .as_deref()
            .and_then(|level| LogLevel::from_str(level, true).ok())
            .unwrap_or(LogLevel::Info)
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if cfg.interval_ms == Some(0) {
        return Err("interval_ms must be greater than 0".into());
    }

    if cfg.iterations == Some(0) {
        return Err("iterations must be at least 1 when set".into());
    }

    if cfg.core_count == Some(0) {
        return Err("core_count must be at least 1 when set".into());
    }

    if let Some(level) = cfg.log_level.as_deref() {
        if LogLevel::from_str(level, true).is_err() {
            return Err(format!(
                "Invalid log_level '{}', expected off, error, warn, info, debug or trace",
                level
            )
            .into());
        }
    }

    if let Some(root) = cfg.proc_root.as_deref() {
        if cfg!(not(target_os = "linux")) {
            return Err("proc_root is only supported on Linux".into());
        }
        if !root.is_dir() {
            return Err(format!("proc_root is not a directory: {}", root.display()).into());
        }
    }

    // Load generator bounds
    let load = &cfg.load;
    if load.cpu_threads > MAX_LOAD_THREADS || load.memory_threads > MAX_LOAD_THREADS {
        return Err(format!(
            "load thread counts must not exceed {} (cpu_threads={}, memory_threads={})",
            MAX_LOAD_THREADS, load.cpu_threads, load.memory_threads
        )
        .into());
    }
    if load.min_block_mb == 0 || load.min_block_mb > load.max_block_mb {
        return Err(format!(
            "load block sizes must satisfy 0 < min_block_mb <= max_block_mb (got {} and {})",
            load.min_block_mb, load.max_block_mb
        )
        .into());
    }
    if load.max_retained_blocks == 0 {
        return Err("load.max_retained_blocks must be at least 1".into());
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(level) = args.log_level {
        config.log_level = Some(format!("{:?}", level).to_lowercase());
    }

    // Sampling overrides
    if let Some(pid) = args.pid {
        config.pid = Some(pid);
    }
    if let Some(interval_ms) = args.interval_ms {
        config.interval_ms = Some(interval_ms);
    }
    if let Some(iterations) = args.iterations {
        config.iterations = Some(iterations);
    }
    if args.no_threads {
        config.include_threads = Some(false);
    }
    if args.children {
        config.include_children = Some(true);
    }
    if let Some(cores) = args.cores {
        config.core_count = Some(cores);
    }
    if let Some(root) = &args.proc_root {
        config.proc_root = Some(root.clone());
    }

    // Output overrides
    if let Some(format) = args.format {
        config.output_format = Some(format);
    }
    if args.clear {
        config.clear_screen = Some(true);
    }

    // Load generator overrides: CLI wins if provided
    if let Some(Commands::Load {
        cpu_threads,
        memory_threads,
        max_block_mb,
    }) = &args.command
    {
        if let Some(n) = cpu_threads {
            config.load.cpu_threads = *n;
        }
        if let Some(n) = memory_threads {
            config.load.memory_threads = *n;
        }
        if let Some(mb) = max_block_mb {
            config.load.max_block_mb = *mb;
        }
    }

    Ok(config)
}

/// Enhanced configuration loading with multiple format support
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let path = match path {
        Some(p) => {
            if !p.exists() {
                warn!("Config file {} not found, using defaults", p.display());
            }
            p.to_path_buf()
        }
        None => {
            // Try default locations
            let defaults = [
                "/etc/herakles/usage-sampler.yaml",
                "/etc/herakles/usage-sampler.yml",
                "/etc/herakles/usage-sampler.json",
                "./herakles-usage-sampler.yaml",
                "./herakles-usage-sampler.yml",
                "./herakles-usage-sampler.json",
            ];

            defaults
                .iter()
                .find(|p| Path::new(p).exists())
                .map(PathBuf::from)
                .unwrap_or_default()
        }
    };

    if path.as_os_str().is_empty() || !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let config: Config = serde_json::from_str(&content)?;
            info!("Loaded JSON configuration from: {}", path.display());
            Ok(config)
        }
        Some("toml") => {
            let config: Config = toml::from_str(&content)?;
            info!("Loaded TOML configuration from: {}", path.display());
            Ok(config)
        }
        _ => {
            // Default to YAML
            let config: Config = serde_yaml::from_str(&content)?;
            info!("Loaded YAML configuration from: {}", path.display());
            Ok(config)
        }
    }
}

/// Renders configuration in the requested format.
pub fn render_config(
    config: &Config,
    format: &ConfigFormat,
) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render_config(config, &format)?);
    Ok(())
}
