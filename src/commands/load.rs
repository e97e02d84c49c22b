//! Load command implementation.
//!
//! Runs the monitor against this process while background threads burn CPU
//! and churn memory, so the sampler has something to measure.

use std::collections::VecDeque;
use std::hint::black_box;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use rand::Rng;
use tracing::{debug, info, warn};

use super::monitor::{build_sampler, run_monitor};
use crate::config::{Config, LoadConfig};

const MB: usize = 1024 * 1024;

/// Background CPU and memory load, stopped cooperatively.
pub struct LoadGenerator {
    stop: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
}

impl LoadGenerator {
    /// Spawns the configured CPU and memory threads.
    pub fn start(settings: &LoadConfig) -> std::io::Result<Self> {
        let mut generator = Self {
            stop: Arc::new(AtomicBool::new(false)),
            handles: Vec::with_capacity(settings.cpu_threads + settings.memory_threads),
        };

        for i in 0..settings.cpu_threads {
            let stop = Arc::clone(&generator.stop);
            let handle = thread::Builder::new()
                .name(format!("cpu-load-{i}"))
                .spawn(move || cpu_load(&stop))?;
            generator.handles.push(handle);
        }

        for i in 0..settings.memory_threads {
            let stop = Arc::clone(&generator.stop);
            let settings = settings.clone();
            let handle = thread::Builder::new()
                .name(format!("mem-load-{i}"))
                .spawn(move || memory_load(&stop, &settings))?;
            generator.handles.push(handle);
        }

        debug!("Started {} load threads", generator.handles.len());
        Ok(generator)
    }

    pub fn thread_count(&self) -> usize {
        self.handles.len()
    }

    pub fn is_running(&self) -> bool {
        self.handles.iter().any(|h| !h.is_finished())
    }

    /// Signals every thread and waits for them to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        for handle in self.handles.drain(..) {
            let name = handle.thread().name().unwrap_or("load").to_string();
            if handle.join().is_err() {
                warn!("Load thread {} panicked", name);
            }
        }
    }
}

impl Drop for LoadGenerator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn factorial(n: u64) -> u64 {
    (2..=n).product()
}

fn cpu_load(stop: &AtomicBool) {
    while !stop.load(Ordering::Relaxed) {
        for n in 0..100_000u64 {
            // 20! is the largest factorial that fits in u64
            black_box(factorial(black_box(n % 21)));
        }
    }
}

fn memory_load(stop: &AtomicBool, settings: &LoadConfig) {
    let mut rng = rand::thread_rng();
    let mut blocks: VecDeque<Vec<u8>> = VecDeque::new();
    let pause = Duration::from_millis(settings.sleep_ms);

    while !stop.load(Ordering::Relaxed) {
        thread::sleep(pause);

        let size = rng.gen_range(settings.min_block_mb..=settings.max_block_mb) * MB;
        let mut block = vec![0u8; size];
        rng.fill(&mut block[..]);
        blocks.push_back(block);

        release_oldest_half(&mut blocks, settings.max_retained_blocks);
    }
}

/// Drops the oldest half of `blocks` once `limit` blocks are held.
fn release_oldest_half(blocks: &mut VecDeque<Vec<u8>>, limit: usize) {
    if blocks.len() >= limit {
        let release = (blocks.len() / 2).max(1);
        blocks.drain(..release);
    }
}

/// Samples this process under synthetic load until the iteration budget is
/// spent or Ctrl+C.
pub async fn command_load(config: &Config) -> Result<()> {
    let pid = std::process::id();
    if let Some(requested) = config.pid.filter(|&p| p != pid) {
        warn!("load always samples its own process; ignoring pid {}", requested);
    }

    let mut sampler = build_sampler(config)?;

    info!(
        "Starting synthetic load: {} CPU threads, {} memory threads ({}-{} MB blocks)",
        config.load.cpu_threads,
        config.load.memory_threads,
        config.load.min_block_mb,
        config.load.max_block_mb
    );
    let generator = LoadGenerator::start(&config.load).context("Failed to start load threads")?;

    debug!("{} load threads running", generator.thread_count());

    run_monitor(&mut sampler, pid, config).await;

    if generator.thread_count() > 0 && !generator.is_running() {
        warn!("All load threads exited before the monitor stopped");
    }
    generator.stop();
    sampler.dispose();
    info!("Synthetic load stopped");
    Ok(())
}
