//! CPU and memory percentage math for delta-based usage calculation.
//!
//! These functions are pure: they turn tick deltas between two snapshots into
//! percentages. The sampler decides what a meaningful delta is; see
//! `guarded_cpu_percent` for the form it reports.

use once_cell::sync::Lazy;

use crate::process::memory::MemorySize;
use crate::process::stat::RawStat;

/// Get the number of online CPU cores (at least 1).
fn get_cpu_core_count() -> usize {
    #[cfg(unix)]
    {
        // SAFETY: sysconf is safe to call with _SC_NPROCESSORS_ONLN
        // Returns -1 on error, handled by the > 0 check
        unsafe {
            let n = libc::sysconf(libc::_SC_NPROCESSORS_ONLN);
            if n > 0 {
                return n as usize;
            }
        }
    }
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Online CPU cores, detected once.
pub static CPU_CORES: Lazy<usize> = Lazy::new(get_cpu_core_count);

/// Number of online CPU cores.
pub fn cpu_core_count() -> usize {
    *CPU_CORES
}

/// Signed tick delta between two snapshots of the same entity.
///
/// A snapshot whose kernel component is zero (an incomplete sample on some
/// platforms) does not change the arithmetic; callers treat a negative result
/// as "no meaningful usage this round".
pub fn cpu_time_delta(prev: &RawStat, curr: &RawStat) -> i64 {
    curr.total_ticks() as i64 - prev.total_ticks() as i64
}

/// `delta_entity / delta_total * 100`. Not defined for `delta_total == 0`.
pub fn normalized_cpu_percent(delta_total: i64, delta_entity: i64) -> f64 {
    delta_entity as f64 / delta_total as f64 * 100.0
}

/// Normalized percent scaled by core count; exceeds 100 on multi-core load.
pub fn absolute_cpu_percent(normalized: f64, core_count: usize) -> f64 {
    normalized * core_count as f64
}

/// Average per-core share of a total percent, floored at zero.
pub fn average_per_core_percent(total_percent: f64, core_count: usize) -> f64 {
    let result = total_percent / core_count as f64;
    if result < 0.0 {
        0.0
    } else {
        result
    }
}

/// Share of `total` taken by `used`, in percent.
pub fn memory_percent(total: MemorySize, used: MemorySize) -> f64 {
    used / total * 100.0
}

/// Normalized percent as reported by the sampler.
///
/// Zero or negative system deltas yield 0, as do negative entity deltas
/// (counter resets, id reuse) and any non-finite result.
pub fn guarded_cpu_percent(delta_total: i64, delta_entity: i64) -> f64 {
    if delta_total <= 0 {
        return 0.0;
    }
    let percent = normalized_cpu_percent(delta_total, delta_entity);
    if percent.is_finite() && percent > 0.0 {
        percent
    } else {
        0.0
    }
}
