//! Check command implementation.
//!
//! Validates system requirements and configuration.

use std::time::Duration;

use herakles_usage_sampler::cpu_core_count;

use super::monitor::build_sampler;
use crate::config::{validate_effective_config, Config};
use crate::startup_checks::is_root;

/// Validates system requirements and configuration.
pub fn command_check(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Herakles Usage Sampler - System Check");
    println!("========================================");

    let mut all_ok = true;

    println!("\n🖥️  Platform: {}", std::env::consts::OS);
    println!("   ✅ {} CPU cores online", cpu_core_count());
    if let Some(cores) = config.core_count {
        println!("   ℹ️  Core count overridden to {} by configuration", cores);
    }

    #[cfg(target_os = "linux")]
    {
        all_ok &= check_procfs(config);
    }

    // End-to-end sampling round against this process
    println!("\n⏱️  Checking sampling...");
    match build_sampler(config) {
        Ok(mut sampler) => {
            println!("   ✅ Total system memory: {}", sampler.total_memory());
            let options = config.sample_options();
            let pid = std::process::id();
            let first = sampler.process_usage(pid, options);
            std::thread::sleep(Duration::from_millis(100));
            match first.and_then(|_| sampler.process_usage(pid, options)) {
                Ok(usage) => println!(
                    "   ✅ Sampled own process: {:.2}% CPU, {} memory, {} threads",
                    usage.cpu_percent, usage.memory_bytes, usage.threads.len()
                ),
                Err(e) => {
                    println!("   ❌ Sampling failed: {}", e);
                    all_ok = false;
                }
            }
            sampler.dispose();
        }
        Err(e) => {
            println!("   ❌ Cannot create sampler: {:#}", e);
            all_ok = false;
        }
    }

    // Privileges
    println!("\n🔐 Checking privileges...");
    if is_root() {
        println!("   ✅ Running as root");
    } else {
        println!("   ⚠️  Not running as root - processes of other users may not be readable");
    }

    // Check configuration
    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => {
            println!("   ✅ Configuration is valid");
        }
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - system is ready");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review warnings");
        std::process::exit(1);
    }
}

/// Checks every /proc file the Linux source reads.
#[cfg(target_os = "linux")]
fn check_procfs(config: &Config) -> bool {
    use herakles_usage_sampler::source::ProcfsSource;
    use herakles_usage_sampler::PlatformMetricSource;

    let source = match &config.proc_root {
        Some(root) => ProcfsSource::new(root),
        None => ProcfsSource::default(),
    };
    let root = source.root().display().to_string();
    let pid = std::process::id();
    let mut ok = true;

    println!("\n📁 Checking {} filesystem...", root);
    if !source.root().is_dir() {
        println!("   ❌ {} not found", root);
        return false;
    }

    match source.total_system_cpu_ticks() {
        Ok(ticks) => println!("   ✅ {}/stat readable ({} system ticks)", root, ticks),
        Err(e) => {
            println!("   ❌ {}", e);
            ok = false;
        }
    }

    match source.total_system_memory() {
        Ok(total) => println!("   ✅ {}/meminfo readable ({} total)", root, total),
        Err(e) => {
            println!("   ❌ {}", e);
            ok = false;
        }
    }

    match source.process_raw_stat(pid) {
        Ok(stat) => println!("   ✅ {}/{}/stat readable ({})", root, pid, stat.command),
        Err(e) => {
            println!("   ❌ {}", e);
            ok = false;
        }
    }

    match source.process_memory(pid) {
        Ok(memory) => println!("   ✅ {}/{}/status readable (VmRSS {})", root, pid, memory),
        Err(e) => {
            println!("   ❌ {}", e);
            ok = false;
        }
    }

    let threads = source.thread_ids(pid);
    if threads.is_empty() {
        println!("   ❌ {}/{}/task lists no threads", root, pid);
        ok = false;
    } else {
        println!("   ✅ {}/{}/task lists {} threads", root, pid, threads.len());
    }

    ok
}
