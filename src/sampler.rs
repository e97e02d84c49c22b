//! Delta-based process and thread usage sampler.
//!
//! Each call to `process_usage` is one sampling round for one process:
//!
//! 1. read system CPU ticks, the process's raw stat and its memory
//! 2. diff against the cached snapshot of the process (first sighting: 0%)
//! 3. optionally read every thread and diff against the cached thread map
//! 4. optionally sample child processes, walking one process listing
//! 5. commit the new snapshots of the process and every sampled descendant
//!
//! All reads of a round happen before the store is touched, children
//! included, so a failed round leaves the previous snapshots in place and the
//! next successful round diffs against the last good sample.
//!
//! The sampler is not synchronized. Sampling takes `&mut self`; callers that
//! share one instance across threads must wrap it in a mutex.

use ahash::AHashSet as HashSet;
use tracing::{debug, warn};

use crate::error::{SampleError, UsageError};
use crate::process::{
    absolute_cpu_percent, cpu_core_count, cpu_time_delta, guarded_cpu_percent, memory_percent,
    MemorySize,
};
use crate::snapshot::{Snapshot, SnapshotStore, ThreadMap, UsageSnapshotKey};
use crate::source::{default_source, DynSource, PlatformMetricSource, ProcessTree};
use crate::usage::{ProcessUsage, ThreadUsage};

/// What a sampling round covers besides the process itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleOptions {
    pub include_threads: bool,
    pub include_children: bool,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            include_threads: true,
            include_children: false,
        }
    }
}

/// Stateful sampler computing CPU and memory usage between rounds.
pub struct UsageSampler<S = DynSource> {
    source: S,
    store: SnapshotStore,
    total_memory: MemorySize,
    core_count: usize,
    pid: u32,
}

/// Creates a sampler backed by the metric source of the running OS.
///
/// Fails when the OS has no source or total system memory is unreadable.
pub fn create_sampler() -> Result<UsageSampler<DynSource>, UsageError> {
    UsageSampler::new(default_source()?)
}

impl<S: PlatformMetricSource> UsageSampler<S> {
    /// Creates a sampler over `source`. Total system memory is read once here;
    /// failure to read it (or a zero total) prevents creation.
    pub fn new(source: S) -> Result<Self, UsageError> {
        let total_memory = source.total_system_memory()?;
        if total_memory.bytes() <= 0.0 {
            return Err(UsageError::read(
                "total system memory",
                std::io::Error::other("reported as zero"),
            ));
        }

        let core_count = cpu_core_count();
        debug!(
            "Usage sampler created: {} cores, {} total memory",
            core_count, total_memory
        );

        Ok(Self {
            source,
            store: SnapshotStore::new(),
            total_memory,
            core_count,
            pid: std::process::id(),
        })
    }

    /// Overrides the detected core count used for absolute percentages.
    pub fn with_core_count(mut self, core_count: usize) -> Self {
        self.core_count = core_count.max(1);
        self
    }

    pub fn core_count(&self) -> usize {
        self.core_count
    }

    pub fn total_memory(&self) -> MemorySize {
        self.total_memory
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Whether a snapshot is cached for `key`.
    pub fn is_tracked(&self, key: UsageSnapshotKey) -> bool {
        self.store.contains(key)
    }

    /// Samples the calling process.
    pub fn current_process_usage(
        &mut self,
        include_threads: bool,
    ) -> Result<ProcessUsage, SampleError> {
        let options = SampleOptions {
            include_threads,
            include_children: false,
        };
        self.process_usage(self.pid, options)
    }

    /// Samples `pid` with the given options.
    pub fn process_usage(
        &mut self,
        pid: u32,
        options: SampleOptions,
    ) -> Result<ProcessUsage, SampleError> {
        let tree = if options.include_children {
            self.source.process_tree()
        } else {
            ProcessTree::default()
        };

        let mut visited = HashSet::new();
        visited.insert(pid);
        let (usage, pending) = self.sample_process(pid, options, &tree, &mut visited)?;
        self.commit(pending);
        Ok(usage)
    }

    /// Drops every cached snapshot. Safe to call more than once.
    pub fn dispose(&mut self) {
        if !self.store.is_empty() {
            debug!("Disposing {} cached snapshots", self.store.len());
        }
        self.store.clear();
    }

    fn commit(&mut self, pending: PendingWrites) {
        for (pid, snapshot) in pending.processes {
            self.store.put(UsageSnapshotKey::Process(pid), snapshot);
        }
        for (pid, map) in pending.thread_maps {
            self.store.replace_thread_map(pid, map);
        }
    }

    /// Reads one process (and its threads and children) without touching the
    /// store. The writes come back alongside the usage.
    fn sample_process(
        &self,
        pid: u32,
        options: SampleOptions,
        tree: &ProcessTree,
        visited: &mut HashSet<u32>,
    ) -> Result<(ProcessUsage, PendingWrites), SampleError> {
        let system_ticks = self.source.total_system_cpu_ticks()?;
        let stat = self.source.process_raw_stat(pid)?;
        let memory = self.source.process_memory(pid)?;

        let cpu_percent_normalized = match self.store.get(UsageSnapshotKey::Process(pid)) {
            Some(previous) => {
                let delta_total = system_ticks as i64 - previous.system_ticks as i64;
                let delta_process = cpu_time_delta(&previous.stat, &stat);
                reported_percent("process", pid, delta_total, delta_process)
            }
            None => {
                debug!("First sample of process {}", pid);
                0.0
            }
        };

        let mut pending = PendingWrites::default();

        let threads = if options.include_threads {
            let (usages, map) = self.sample_threads(pid, system_ticks)?;
            pending.thread_maps.push((pid, map));
            usages
        } else {
            Vec::new()
        };

        let children = if options.include_children {
            self.sample_children(pid, options, tree, visited, &mut pending)?
        } else {
            Vec::new()
        };

        let usage = ProcessUsage {
            process_id: pid,
            process_name: stat.command.clone(),
            cpu_percent_normalized,
            cpu_percent: absolute_cpu_percent(cpu_percent_normalized, self.core_count),
            memory_bytes: memory,
            memory_percent: memory_percent(self.total_memory, memory),
            threads,
            children,
        };
        pending.processes.push((pid, Snapshot { stat, system_ticks }));

        Ok((usage, pending))
    }

    /// Reads every thread of `pid` and diffs it against the cached map.
    /// Returns the usages and the map that replaces the cached one.
    fn sample_threads(
        &self,
        pid: u32,
        system_ticks: u64,
    ) -> Result<(Vec<ThreadUsage>, ThreadMap), UsageError> {
        let previous = self.store.thread_map(pid);
        let tids = self.source.thread_ids(pid);

        let mut usages = Vec::with_capacity(tids.len());
        let mut map = ThreadMap::with_capacity(tids.len());

        for tid in tids {
            let stat = self.source.thread_raw_stat(pid, tid)?;

            let normalized = match previous.and_then(|threads| threads.get(&tid)) {
                Some(prev) => {
                    let delta_total = system_ticks as i64 - prev.system_ticks as i64;
                    reported_percent("thread", tid, delta_total, cpu_time_delta(&prev.stat, &stat))
                }
                None => 0.0,
            };

            usages.push(ThreadUsage {
                thread_id: tid,
                cpu_percent_normalized: normalized,
                cpu_percent: absolute_cpu_percent(normalized, self.core_count),
            });
            map.insert(tid, Snapshot { stat, system_ticks });
        }

        Ok((usages, map))
    }

    /// Samples each child of `pid` as its own round. Children that cannot be
    /// read any more are skipped along with their subtree's writes; they
    /// exited after being listed.
    fn sample_children(
        &self,
        pid: u32,
        options: SampleOptions,
        tree: &ProcessTree,
        visited: &mut HashSet<u32>,
        pending: &mut PendingWrites,
    ) -> Result<Vec<ProcessUsage>, SampleError> {
        let mut children = Vec::new();

        for &child in tree.children(pid) {
            if !visited.insert(child) {
                continue;
            }
            match self.sample_process(child, options, tree, visited) {
                Ok((usage, writes)) => {
                    children.push(usage);
                    pending.append(writes);
                }
                Err(e) if e.causes().iter().all(|c| matches!(c, UsageError::Read { .. })) => {
                    if e.causes().iter().all(UsageError::is_not_found) {
                        debug!("Child {} of {} exited before sampling", child, pid);
                    } else {
                        warn!("Skipping child {} of {}: {}", child, pid, e);
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Ok(children)
    }
}

/// Store writes collected during a round.
#[derive(Debug, Default)]
struct PendingWrites {
    processes: Vec<(u32, Snapshot)>,
    thread_maps: Vec<(u32, ThreadMap)>,
}

impl PendingWrites {
    fn append(&mut self, other: PendingWrites) {
        self.processes.extend(other.processes);
        self.thread_maps.extend(other.thread_maps);
    }
}

/// Guarded percent with a debug trace for discarded deltas.
fn reported_percent(kind: &str, id: u32, delta_total: i64, delta_entity: i64) -> f64 {
    if delta_total <= 0 || delta_entity < 0 {
        debug!(
            "Reporting 0% for {} {}: system delta {}, entity delta {}",
            kind, id, delta_total, delta_entity
        );
    }
    guarded_cpu_percent(delta_total, delta_entity)
}
