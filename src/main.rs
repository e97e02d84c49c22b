//! herakles-usage-sampler - version 0.1.0
//!
//! Periodic CPU and memory usage sampler with tracing logging.
//! This is the main entry point that resolves configuration and dispatches subcommands.

mod cli;
mod commands;
mod config;
mod startup_checks;

use clap::Parser;
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing::{error, info};

use cli::{Args, Commands, LogLevel};
use commands::{command_check, command_config, command_load, command_monitor};
use config::{resolve_config, show_config, validate_effective_config, Config};

/// Initializes tracing logging subsystem with configured log level.
///
/// Logs go to stderr; reports own stdout.
fn setup_logging(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = config.log_level();
    let filter = match log_level {
        LogLevel::Off => LevelFilter::OFF,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Logging initialized with level: {:?}", log_level);
    Ok(())
}

/// Helper function to load and validate configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Warns early when the sampled process cannot be read. Sampling still starts.
fn check_requirements(config: &Config, pid: u32) {
    let proc_root = config
        .proc_root
        .as_deref()
        .unwrap_or_else(|| Path::new("/proc"));

    if let Err(e) = startup_checks::validate_requirements(proc_root, pid) {
        error!("❌ Startup validation failed: {}", e);
        error!("   Sampling rounds for pid {} will likely fail", pid);
    }
}

/// Main application entry point.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format.clone());
    }

    // Config generation works from defaults and needs no validation
    if let Some(Commands::Config {
        output,
        format,
        commented,
    }) = &args.command
    {
        return command_config(output.clone(), format.clone(), *commented);
    }

    let config = load_validated_config(&args)?;
    setup_logging(&config)?;

    match &args.command {
        Some(Commands::Check) => command_check(&config),

        Some(Commands::Load { .. }) => {
            info!("Starting herakles-usage-sampler in load mode");
            check_requirements(&config, std::process::id());
            command_load(&config).await?;
            Ok(())
        }

        Some(Commands::Monitor) | None => {
            let pid = config.pid.unwrap_or_else(std::process::id);
            info!("Starting herakles-usage-sampler for pid {}", pid);
            check_requirements(&config, pid);
            command_monitor(&config).await?;
            info!("herakles-usage-sampler stopped gracefully");
            Ok(())
        }

        Some(Commands::Config { .. }) => unreachable!("Config handled above"),
    }
}
