//! Monitor command implementation.
//!
//! Samples one process at a fixed interval and prints a report per round.

use std::fmt::Write as _;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use herakles_usage_sampler::process::average_per_core_percent;
use herakles_usage_sampler::{ProcessUsage, UsageSampler};
use serde::Serialize;
use tokio::{signal, time};
use tracing::{debug, error, info, warn};

use crate::cli::OutputFormat;
use crate::config::Config;

/// One printed round.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub timestamp: DateTime<Local>,
    pub sampling_ms: f64,
    pub core_count: usize,
    pub usage: &'a ProcessUsage,
}

/// Builds the sampler described by `config`.
pub fn build_sampler(config: &Config) -> Result<UsageSampler> {
    #[cfg(target_os = "linux")]
    let source: herakles_usage_sampler::DynSource = match &config.proc_root {
        Some(root) => Box::new(herakles_usage_sampler::source::ProcfsSource::new(root)),
        None => herakles_usage_sampler::default_source()?,
    };
    #[cfg(not(target_os = "linux"))]
    let source = herakles_usage_sampler::default_source()?;

    let mut sampler = UsageSampler::new(source).context("Failed to create usage sampler")?;
    if let Some(cores) = config.core_count {
        sampler = sampler.with_core_count(cores);
    }
    Ok(sampler)
}

/// Runs the sampling loop until the iteration budget is spent or Ctrl+C.
pub async fn command_monitor(config: &Config) -> Result<()> {
    let mut sampler = build_sampler(config)?;
    let pid = config.pid.unwrap_or_else(std::process::id);
    run_monitor(&mut sampler, pid, config).await;
    sampler.dispose();
    Ok(())
}

/// Shared loop of `monitor` and `load`. Sampling errors are reported and the
/// loop continues with the next tick.
pub async fn run_monitor(sampler: &mut UsageSampler, pid: u32, config: &Config) {
    let options = config.sample_options();
    let format = config.output_format();
    let clear = config.clear_screen.unwrap_or(false) && format == OutputFormat::Text;

    info!(
        "Monitoring pid {} every {:?} ({} cores, {} total memory)",
        pid,
        config.interval(),
        sampler.core_count(),
        sampler.total_memory()
    );

    let mut ticker = time::interval(config.interval());
    ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
    let mut rounds = 0usize;

    let shutdown = signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            result = &mut shutdown => {
                match result {
                    Ok(()) => info!("Received SIGINT (Ctrl+C), stopping monitor"),
                    Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
                }
                break;
            }
        }

        let started = Instant::now();
        let result = sampler.process_usage(pid, options);
        let elapsed = started.elapsed();

        match result {
            Ok(usage) => match render_report(&usage, elapsed, sampler.core_count(), format) {
                Ok(report) => {
                    if clear {
                        print!("\x1B[2J\x1B[H");
                    }
                    print!("{}", report);
                }
                Err(e) => error!("Failed to render report: {:#}", e),
            },
            Err(e) => {
                warn!("Sampling pid {} failed", pid);
                eprintln!("Monitoring error: {}", e);
            }
        }

        rounds += 1;
        if config.iterations.is_some_and(|limit| rounds >= limit) {
            debug!("Completed {} sampling rounds", rounds);
            break;
        }
    }
}

/// Renders one round in the requested format.
pub fn render_report(
    usage: &ProcessUsage,
    elapsed: Duration,
    core_count: usize,
    format: OutputFormat,
) -> Result<String> {
    let report = Report {
        timestamp: Local::now(),
        sampling_ms: elapsed.as_secs_f64() * 1000.0,
        core_count,
        usage,
    };

    match format {
        OutputFormat::Text => Ok(render_text(&report)),
        OutputFormat::Json => {
            let mut json = serde_json::to_string(&report).context("Failed to encode report")?;
            json.push('\n');
            Ok(json)
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(&report).context("Failed to encode report")?;
            Ok(format!("---\n{}", yaml.trim_start_matches("---\n")))
        }
    }
}

fn render_text(report: &Report<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "[{}] Monitoring took {:.3} ms",
        report.timestamp.format("%Y-%m-%d %H:%M:%S"),
        report.sampling_ms
    );
    write_process(&mut out, report.usage, report.core_count, "");
    out
}

fn write_process(out: &mut String, usage: &ProcessUsage, core_count: usize, indent: &str) {
    let _ = writeln!(out, "{indent}PID: {} ({})", usage.process_id, usage.process_name);
    let _ = writeln!(
        out,
        "{indent}  CPU UsageNormalized: {:.2}%",
        usage.cpu_percent_normalized
    );
    let _ = writeln!(out, "{indent}  CPU Usage: {:.2}%", usage.cpu_percent);
    let _ = writeln!(
        out,
        "{indent}  Memory   : {:.3} MB ({:.2}%)",
        usage.memory_bytes.megabytes(),
        usage.memory_percent
    );

    if !usage.threads.is_empty() {
        let _ = writeln!(out, "{indent}  Threads: {}", usage.threads.len());
        for thread in &usage.threads {
            let _ = writeln!(
                out,
                "{indent}    TID: {:06}       CPUNorm: {:05.2}       CPU: {:06.2}",
                thread.thread_id, thread.cpu_percent_normalized, thread.cpu_percent
            );
        }
    }

    if !usage.children.is_empty() {
        let _ = writeln!(out, "{indent}  Child Processes:");
        let child_indent = format!("{indent}    ");
        for child in &usage.children {
            write_process(out, child, core_count, &child_indent);
        }

        let tree_percent = tree_cpu_percent(usage);
        let _ = writeln!(
            out,
            "{indent}  Tree CPU Usage: {:.2}% ({:.2}% per core)",
            tree_percent,
            average_per_core_percent(tree_percent, core_count)
        );
    }
}

/// Absolute CPU percent of a process and all of its sampled descendants.
fn tree_cpu_percent(usage: &ProcessUsage) -> f64 {
    usage.cpu_percent + usage.children.iter().map(tree_cpu_percent).sum::<f64>()
}
