//! Platform metric sources.
//!
//! A `PlatformMetricSource` supplies the raw counters one sampling round
//! needs. The sampler is written once against this trait; `default_source`
//! picks the implementation for the running OS.

use ahash::AHashMap as HashMap;

use crate::error::UsageError;
use crate::process::{MemorySize, RawStat};

#[cfg(target_os = "linux")]
pub mod procfs;
#[cfg(windows)]
pub mod windows;

#[cfg(target_os = "linux")]
pub use procfs::ProcfsSource;
#[cfg(windows)]
pub use windows::WindowsSource;

/// Parent to children map of every process visible in one listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessTree {
    children: HashMap<u32, Vec<u32>>,
}

impl ProcessTree {
    /// Builds the tree from `(pid, parent_id)` pairs. Children keep the order
    /// of the pairs; a process listed as its own parent is dropped.
    pub fn from_parents(pairs: impl IntoIterator<Item = (u32, u32)>) -> Self {
        let mut children: HashMap<u32, Vec<u32>> = HashMap::new();
        for (pid, parent) in pairs {
            if pid != parent {
                children.entry(parent).or_default().push(pid);
            }
        }
        Self { children }
    }

    /// Direct children of `pid`.
    pub fn children(&self, pid: u32) -> &[u32] {
        self.children.get(&pid).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Raw CPU and memory counters for processes and threads.
///
/// Tick units are platform-defined and only ever compared with ticks from the
/// same source.
pub trait PlatformMetricSource {
    /// System-wide CPU ticks across all cores.
    fn total_system_cpu_ticks(&self) -> Result<u64, UsageError>;

    fn process_raw_stat(&self, pid: u32) -> Result<RawStat, UsageError>;

    /// Thread ids of `pid`. Empty when the process has no introspectable
    /// thread list.
    fn thread_ids(&self, pid: u32) -> Vec<u32>;

    fn thread_raw_stat(&self, pid: u32, tid: u32) -> Result<RawStat, UsageError>;

    fn total_system_memory(&self) -> Result<MemorySize, UsageError>;

    fn process_memory(&self, pid: u32) -> Result<MemorySize, UsageError>;

    /// Parent links of every visible process, listed once. Sources without a
    /// process tree report an empty one.
    fn process_tree(&self) -> ProcessTree {
        ProcessTree::default()
    }

    /// Direct children of `pid`.
    fn child_pids(&self, pid: u32) -> Vec<u32> {
        self.process_tree().children(pid).to_vec()
    }
}

impl<T: PlatformMetricSource + ?Sized> PlatformMetricSource for Box<T> {
    fn total_system_cpu_ticks(&self) -> Result<u64, UsageError> {
        (**self).total_system_cpu_ticks()
    }

    fn process_raw_stat(&self, pid: u32) -> Result<RawStat, UsageError> {
        (**self).process_raw_stat(pid)
    }

    fn thread_ids(&self, pid: u32) -> Vec<u32> {
        (**self).thread_ids(pid)
    }

    fn thread_raw_stat(&self, pid: u32, tid: u32) -> Result<RawStat, UsageError> {
        (**self).thread_raw_stat(pid, tid)
    }

    fn total_system_memory(&self) -> Result<MemorySize, UsageError> {
        (**self).total_system_memory()
    }

    fn process_memory(&self, pid: u32) -> Result<MemorySize, UsageError> {
        (**self).process_memory(pid)
    }

    fn process_tree(&self) -> ProcessTree {
        (**self).process_tree()
    }

    fn child_pids(&self, pid: u32) -> Vec<u32> {
        (**self).child_pids(pid)
    }
}

/// Boxed source selected for the running OS.
pub type DynSource = Box<dyn PlatformMetricSource + Send>;

/// Returns the metric source for the running OS.
pub fn default_source() -> Result<DynSource, UsageError> {
    #[cfg(target_os = "linux")]
    return Ok(Box::new(ProcfsSource::default()));

    #[cfg(windows)]
    return Ok(Box::new(WindowsSource::new()));

    #[cfg(not(any(target_os = "linux", windows)))]
    Err(UsageError::PlatformUnsupported(std::env::consts::OS))
}
