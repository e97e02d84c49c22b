//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config, DEFAULT_CONFIG_FILE};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let output = output.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    let mut content = render_config(&config, &format)?;
    if commented && matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# Herakles Usage Sampler Configuration
# =====================================
#
# Sampling
# --------
# pid: null                    # Process to sample (null = the sampler itself)
# interval_ms: 1000            # Time between two sampling rounds
# iterations: null             # Stop after N rounds (null = until Ctrl+C)
# include_threads: true        # Report CPU usage per thread
# include_children: false      # Also sample child processes
# core_count: null             # Override detected CPU cores (null = auto)
# proc_root: null              # Root of the proc filesystem (Linux only)
#
# Output
# ------
# output_format: text          # text, json or yaml
# clear_screen: false          # Clear terminal before each text report
#
# Logging
# -------
# log_level: "info"            # off, error, warn, info, debug, trace
#
# Synthetic Load (load command)
# -----------------------------
# load:
#   cpu_threads: 1             # Busy threads
#   memory_threads: 1          # Allocating threads
#   min_block_mb: 10           # Smallest allocated block
#   max_block_mb: 100          # Largest allocated block
#   max_retained_blocks: 8     # Blocks held per thread before half are freed
#   sleep_ms: 40               # Pause between allocations
"#;

    format!("{comments}\n{yaml}")
}
