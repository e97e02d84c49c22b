//! Snapshot storage for delta-based usage calculation.
//!
//! The store keeps the most recent raw stat per process and per
//! (process, thread) pair. Each snapshot also remembers the system-wide tick
//! counter read in the same round, so every process diffs against its own
//! system baseline.

use ahash::AHashMap as HashMap;

use crate::process::RawStat;

/// Identifies a cache slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UsageSnapshotKey {
    Process(u32),
    Thread { pid: u32, tid: u32 },
}

/// A raw stat together with the system tick counter of its round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub stat: RawStat,
    pub system_ticks: u64,
}

/// Previous snapshots of one process's threads, keyed by thread id.
pub type ThreadMap = HashMap<u32, Snapshot>;

/// Keyed cache of the most recent snapshot per process and thread.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    processes: HashMap<u32, Snapshot>,
    threads: HashMap<u32, ThreadMap>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: UsageSnapshotKey) -> Option<&Snapshot> {
        match key {
            UsageSnapshotKey::Process(pid) => self.processes.get(&pid),
            UsageSnapshotKey::Thread { pid, tid } => {
                self.threads.get(&pid).and_then(|map| map.get(&tid))
            }
        }
    }

    /// Stores `snapshot` under `key`, replacing any previous entry.
    pub fn put(&mut self, key: UsageSnapshotKey, snapshot: Snapshot) {
        match key {
            UsageSnapshotKey::Process(pid) => {
                self.processes.insert(pid, snapshot);
            }
            UsageSnapshotKey::Thread { pid, tid } => {
                self.threads.entry(pid).or_default().insert(tid, snapshot);
            }
        }
    }

    pub fn contains(&self, key: UsageSnapshotKey) -> bool {
        self.get(key).is_some()
    }

    /// Thread snapshots of `pid`; `None` reads as an empty map.
    pub fn thread_map(&self, pid: u32) -> Option<&ThreadMap> {
        self.threads.get(&pid)
    }

    /// Swaps the whole thread map of `pid`. Threads absent from `map` lose
    /// their history.
    pub fn replace_thread_map(&mut self, pid: u32, map: ThreadMap) {
        self.threads.insert(pid, map);
    }

    /// Number of cached snapshots, process and thread keys alike.
    pub fn len(&self) -> usize {
        self.processes.len() + self.threads.values().map(|map| map.len()).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.processes.clear();
        self.threads.clear();
    }
}
