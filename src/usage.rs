//! Sampling results.

use serde::Serialize;

use crate::process::MemorySize;

/// CPU usage of one thread over the last sampling interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThreadUsage {
    pub thread_id: u32,
    /// Share of total system CPU time, 0-100.
    pub cpu_percent_normalized: f64,
    /// Normalized share times core count.
    pub cpu_percent: f64,
}

/// CPU and memory usage of one process over the last sampling interval.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessUsage {
    pub process_id: u32,
    pub process_name: String,
    /// Share of total system CPU time, 0-100.
    pub cpu_percent_normalized: f64,
    /// Normalized share times core count; exceeds 100 on multi-core load.
    pub cpu_percent: f64,
    pub memory_bytes: MemorySize,
    /// Share of total system memory, 0-100.
    pub memory_percent: f64,
    pub threads: Vec<ThreadUsage>,
    pub children: Vec<ProcessUsage>,
}
