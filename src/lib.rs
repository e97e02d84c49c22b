//! Herakles Usage Sampler Library
//!
//! This library samples CPU and memory consumption of a process (and
//! optionally its threads and children) at discrete points in time. CPU usage
//! is computed from the tick delta between two consecutive samples, so the
//! first sample of any process or thread reports 0%.
//!
//! # Features
//!
//! - **Normalized and absolute CPU**: share of total system CPU time, and that
//!   share scaled by core count
//! - **Memory**: resident bytes and their share of total system memory
//! - **Per-thread CPU**: thread history is replaced wholesale every round
//! - **Pluggable sources**: `/proc` on Linux, Win32 APIs on Windows, or any
//!   `PlatformMetricSource` implementation
//!
//! # Usage
//!
//! ```no_run
//! use herakles_usage_sampler::create_sampler;
//!
//! let mut sampler = create_sampler().expect("supported platform");
//!
//! // First round seeds the snapshot cache and reports 0% CPU.
//! let _ = sampler.current_process_usage(true);
//!
//! std::thread::sleep(std::time::Duration::from_secs(1));
//!
//! let usage = sampler.current_process_usage(true).expect("sample");
//! println!(
//!     "cpu {:.2}% ({:.2}% absolute), memory {} ({:.2}%)",
//!     usage.cpu_percent_normalized, usage.cpu_percent, usage.memory_bytes, usage.memory_percent
//! );
//! for thread in &usage.threads {
//!     println!("  tid {}: {:.2}%", thread.thread_id, thread.cpu_percent_normalized);
//! }
//! ```

pub mod error;
pub mod process;
pub mod sampler;
pub mod snapshot;
pub mod source;
pub mod usage;

// Re-export main types for convenience
pub use error::{SampleError, UsageError};
pub use process::{cpu_core_count, MemorySize, RawStat};
pub use sampler::{create_sampler, SampleOptions, UsageSampler};
pub use snapshot::{Snapshot, SnapshotStore, UsageSnapshotKey};
pub use source::{default_source, DynSource, PlatformMetricSource, ProcessTree};
pub use usage::{ProcessUsage, ThreadUsage};
