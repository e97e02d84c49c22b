//! Process-related modules for CPU and memory snapshots.
//!
//! This module provides:
//! - `stat`: raw CPU time snapshots and the kernel stat line parser
//! - `cpu`: tick delta and percentage math, online core count
//! - `memory`: byte quantities and kB field parsing

pub mod cpu;
pub mod memory;
pub mod stat;

// Re-export commonly used types
pub use cpu::{
    absolute_cpu_percent, average_per_core_percent, cpu_core_count, cpu_time_delta,
    guarded_cpu_percent, memory_percent, normalized_cpu_percent, CPU_CORES,
};
pub use memory::{find_kb_field, parse_kb_value, MemorySize};
pub use stat::{parse_stat_line, split_stat_line, RawStat};
