//! Integration tests for the delta-based usage sampler.
//!
//! A scripted in-memory source stands in for the OS so every round's counters
//! are known exactly.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::io;

use herakles_usage_sampler::{
    MemorySize, PlatformMetricSource, ProcessTree, RawStat, SampleOptions, UsageError, UsageSampler,
    UsageSnapshotKey,
};

const GB: u64 = 1024 * 1024 * 1024;
const MB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Default)]
struct FakeProcess {
    parent: u32,
    name: String,
    user: u64,
    kernel: u64,
    memory: u64,
    threads: BTreeMap<u32, (u64, u64)>,
    /// Listed as a child but gone by the time its stat is read.
    vanished: bool,
}

#[derive(Debug, Default)]
struct ScriptedSource {
    system_ticks: Cell<u64>,
    total_memory: Cell<u64>,
    processes: RefCell<HashMap<u32, FakeProcess>>,
    fail_stat: Cell<bool>,
    fail_memory: Cell<bool>,
    fail_thread: Cell<Option<u32>>,
    tree_listings: Cell<usize>,
}

impl ScriptedSource {
    fn new(total_memory: u64) -> Self {
        let source = Self::default();
        source.total_memory.set(total_memory);
        source
    }

    fn set_ticks(&self, ticks: u64) {
        self.system_ticks.set(ticks);
    }

    fn set_process(&self, pid: u32, user: u64, kernel: u64, memory: u64) {
        let mut processes = self.processes.borrow_mut();
        let process = processes.entry(pid).or_insert_with(|| FakeProcess {
            name: format!("proc-{pid}"),
            ..FakeProcess::default()
        });
        process.user = user;
        process.kernel = kernel;
        process.memory = memory;
    }

    fn set_parent(&self, pid: u32, parent: u32) {
        if let Some(process) = self.processes.borrow_mut().get_mut(&pid) {
            process.parent = parent;
        }
    }

    fn set_vanished(&self, pid: u32) {
        if let Some(process) = self.processes.borrow_mut().get_mut(&pid) {
            process.vanished = true;
        }
    }

    fn set_threads(&self, pid: u32, threads: &[(u32, u64, u64)]) {
        if let Some(process) = self.processes.borrow_mut().get_mut(&pid) {
            process.threads = threads
                .iter()
                .map(|&(tid, user, kernel)| (tid, (user, kernel)))
                .collect();
        }
    }

    fn not_found(target: String) -> UsageError {
        UsageError::read(target, io::Error::from(io::ErrorKind::NotFound))
    }
}

impl PlatformMetricSource for ScriptedSource {
    fn total_system_cpu_ticks(&self) -> Result<u64, UsageError> {
        Ok(self.system_ticks.get())
    }

    fn process_raw_stat(&self, pid: u32) -> Result<RawStat, UsageError> {
        if self.fail_stat.get() {
            return Err(UsageError::read(
                format!("process {pid}"),
                io::Error::from(io::ErrorKind::PermissionDenied),
            ));
        }
        let processes = self.processes.borrow();
        match processes.get(&pid) {
            Some(p) if !p.vanished => {
                let mut stat = RawStat::from_times(pid, p.user, p.kernel);
                stat.command = p.name.clone();
                stat.parent_id = p.parent;
                Ok(stat)
            }
            _ => Err(Self::not_found(format!("process {pid}"))),
        }
    }

    fn thread_ids(&self, pid: u32) -> Vec<u32> {
        self.processes
            .borrow()
            .get(&pid)
            .map(|p| p.threads.keys().copied().collect())
            .unwrap_or_default()
    }

    fn thread_raw_stat(&self, pid: u32, tid: u32) -> Result<RawStat, UsageError> {
        if self.fail_thread.get() == Some(tid) {
            return Err(UsageError::parse("garbage", "scripted failure"));
        }
        let processes = self.processes.borrow();
        processes
            .get(&pid)
            .and_then(|p| p.threads.get(&tid))
            .map(|&(user, kernel)| RawStat::from_times(tid, user, kernel))
            .ok_or_else(|| Self::not_found(format!("thread {tid}")))
    }

    fn total_system_memory(&self) -> Result<MemorySize, UsageError> {
        Ok(MemorySize::from_bytes(self.total_memory.get()))
    }

    fn process_memory(&self, pid: u32) -> Result<MemorySize, UsageError> {
        if self.fail_memory.get() {
            return Err(UsageError::read(
                format!("memory of process {pid}"),
                io::Error::from(io::ErrorKind::PermissionDenied),
            ));
        }
        self.processes
            .borrow()
            .get(&pid)
            .map(|p| MemorySize::from_bytes(p.memory))
            .ok_or_else(|| Self::not_found(format!("memory of process {pid}")))
    }

    fn process_tree(&self) -> ProcessTree {
        self.tree_listings.set(self.tree_listings.get() + 1);
        let mut pairs: Vec<(u32, u32)> = self
            .processes
            .borrow()
            .iter()
            .map(|(&pid, p)| (pid, p.parent))
            .collect();
        pairs.sort_unstable();
        ProcessTree::from_parents(pairs)
    }
}

fn sampler(source: ScriptedSource) -> UsageSampler<ScriptedSource> {
    UsageSampler::new(source)
        .expect("sampler over scripted source")
        .with_core_count(4)
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

const PROCESS_ONLY: SampleOptions = SampleOptions {
    include_threads: false,
    include_children: false,
};

const WITH_THREADS: SampleOptions = SampleOptions {
    include_threads: true,
    include_children: false,
};

// -------------------------------------------------------------------------
// Construction
// -------------------------------------------------------------------------

#[test]
fn test_zero_total_memory_prevents_creation() {
    let source = ScriptedSource::new(0);
    assert!(UsageSampler::new(source).is_err());
}

#[test]
fn test_core_count_override_is_clamped() {
    let sampler = UsageSampler::new(ScriptedSource::new(GB))
        .unwrap()
        .with_core_count(0);
    assert_eq!(sampler.core_count(), 1);
}

// -------------------------------------------------------------------------
// Cold start and deltas
// -------------------------------------------------------------------------

#[test]
fn test_cold_start_reports_zero_cpu_and_caches_process() {
    let source = ScriptedSource::new(16 * GB);
    source.set_ticks(10_000);
    source.set_process(42, 5_000, 2_000, 512 * MB);

    let mut sampler = sampler(source);
    assert!(!sampler.is_tracked(UsageSnapshotKey::Process(42)));

    let usage = sampler.process_usage(42, PROCESS_ONLY).unwrap();
    assert_eq!(usage.process_id, 42);
    assert_eq!(usage.process_name, "proc-42");
    assert_eq!(usage.cpu_percent_normalized, 0.0);
    assert_eq!(usage.cpu_percent, 0.0);
    assert_close(usage.memory_percent, 3.125);
    assert!(sampler.is_tracked(UsageSnapshotKey::Process(42)));
}

#[test]
fn test_delta_normalized_and_absolute_percent() {
    let source = ScriptedSource::new(16 * GB);
    source.set_ticks(1_000);
    source.set_process(42, 100, 50, 512 * MB);

    let mut sampler = sampler(source);
    sampler.process_usage(42, PROCESS_ONLY).unwrap();

    sampler.source().set_ticks(1_200);
    sampler.source().set_process(42, 140, 70, 512 * MB);
    let usage = sampler.process_usage(42, PROCESS_ONLY).unwrap();

    assert_close(usage.cpu_percent_normalized, 30.0);
    assert_close(usage.cpu_percent, 120.0);
}

#[test]
fn test_memory_percent() {
    let source = ScriptedSource::new(16 * GB);
    source.set_ticks(1);
    source.set_process(1, 0, 0, 512 * MB);

    let mut sampler = sampler(source);
    let usage = sampler.process_usage(1, PROCESS_ONLY).unwrap();
    assert_eq!(usage.memory_bytes, MemorySize::from_megabytes(512.0));
    assert_close(usage.memory_percent, 3.125);
}

#[test]
fn test_zero_system_delta_reports_zero() {
    let source = ScriptedSource::new(GB);
    source.set_ticks(5_000);
    source.set_process(42, 100, 50, MB);
    source.set_threads(42, &[(42, 60, 30), (43, 40, 20)]);

    let mut sampler = sampler(source);
    sampler.process_usage(42, WITH_THREADS).unwrap();

    sampler.source().set_process(42, 200, 80, MB);
    sampler.source().set_threads(42, &[(42, 120, 50), (43, 80, 30)]);
    let usage = sampler.process_usage(42, WITH_THREADS).unwrap();

    assert_eq!(usage.cpu_percent_normalized, 0.0);
    assert_eq!(usage.cpu_percent, 0.0);
    assert!(usage
        .threads
        .iter()
        .all(|t| t.cpu_percent_normalized == 0.0 && t.cpu_percent.is_finite()));
}

#[test]
fn test_negative_process_delta_is_clamped() {
    let source = ScriptedSource::new(GB);
    source.set_ticks(1_000);
    source.set_process(42, 500, 500, MB);

    let mut sampler = sampler(source);
    sampler.process_usage(42, PROCESS_ONLY).unwrap();

    // pid reused by a fresh process with smaller counters
    sampler.source().set_ticks(1_100);
    sampler.source().set_process(42, 1, 1, MB);
    let usage = sampler.process_usage(42, PROCESS_ONLY).unwrap();
    assert_eq!(usage.cpu_percent_normalized, 0.0);

    // next round diffs against the reused pid's counters
    sampler.source().set_ticks(1_200);
    sampler.source().set_process(42, 11, 11, MB);
    let usage = sampler.process_usage(42, PROCESS_ONLY).unwrap();
    assert_close(usage.cpu_percent_normalized, 20.0);
}

#[test]
fn test_current_process_usage_samples_own_pid() {
    let pid = std::process::id();
    let source = ScriptedSource::new(GB);
    source.set_ticks(100);
    source.set_process(pid, 10, 10, MB);
    source.set_threads(pid, &[(pid, 10, 10)]);

    let mut sampler = sampler(source);
    let usage = sampler.current_process_usage(true).unwrap();
    assert_eq!(usage.process_id, pid);
    assert_eq!(usage.threads.len(), 1);

    let usage = sampler.current_process_usage(false).unwrap();
    assert!(usage.threads.is_empty());
    assert!(usage.children.is_empty());
}

// -------------------------------------------------------------------------
// Threads
// -------------------------------------------------------------------------

#[test]
fn test_thread_percentages() {
    let source = ScriptedSource::new(GB);
    source.set_ticks(1_000);
    source.set_process(42, 100, 100, MB);
    source.set_threads(42, &[(42, 50, 50), (43, 50, 50)]);

    let mut sampler = sampler(source);
    let usage = sampler.process_usage(42, WITH_THREADS).unwrap();
    assert_eq!(usage.threads.len(), 2);
    assert!(usage.threads.iter().all(|t| t.cpu_percent_normalized == 0.0));
    assert!(sampler.is_tracked(UsageSnapshotKey::Thread { pid: 42, tid: 43 }));

    sampler.source().set_ticks(1_400);
    sampler.source().set_process(42, 200, 140, MB);
    sampler.source().set_threads(42, &[(42, 60, 50), (43, 130, 90)]);
    let usage = sampler.process_usage(42, WITH_THREADS).unwrap();

    let ids: Vec<u32> = usage.threads.iter().map(|t| t.thread_id).collect();
    assert_eq!(ids, vec![42, 43]);
    assert_close(usage.threads[0].cpu_percent_normalized, 2.5);
    assert_close(usage.threads[0].cpu_percent, 10.0);
    assert_close(usage.threads[1].cpu_percent_normalized, 30.0);
    assert_close(usage.threads[1].cpu_percent, 120.0);
    assert_close(usage.cpu_percent_normalized, 35.0);
}

#[test]
fn test_thread_map_is_replaced_each_round() {
    let source = ScriptedSource::new(GB);
    source.set_ticks(1_000);
    source.set_process(42, 0, 0, MB);
    source.set_threads(42, &[(42, 10, 0), (7, 100, 0)]);

    let mut sampler = sampler(source);
    sampler.process_usage(42, WITH_THREADS).unwrap();
    assert!(sampler.is_tracked(UsageSnapshotKey::Thread { pid: 42, tid: 7 }));

    // Round N+1: thread 7 is gone
    sampler.source().set_ticks(1_100);
    sampler.source().set_threads(42, &[(42, 20, 0)]);
    let usage = sampler.process_usage(42, WITH_THREADS).unwrap();
    assert!(usage.threads.iter().all(|t| t.thread_id != 7));
    assert!(!sampler.is_tracked(UsageSnapshotKey::Thread { pid: 42, tid: 7 }));

    // Round N+2: thread 7 returns with more ticks and starts cold
    sampler.source().set_ticks(1_200);
    sampler.source().set_threads(42, &[(42, 30, 0), (7, 190, 0)]);
    let usage = sampler.process_usage(42, WITH_THREADS).unwrap();
    let seven = usage.threads.iter().find(|t| t.thread_id == 7).unwrap();
    assert_eq!(seven.cpu_percent_normalized, 0.0);
    let main = usage.threads.iter().find(|t| t.thread_id == 42).unwrap();
    assert_close(main.cpu_percent_normalized, 10.0);
}

#[test]
fn test_threads_excluded_leaves_thread_history_untouched() {
    let source = ScriptedSource::new(GB);
    source.set_ticks(1_000);
    source.set_process(42, 0, 0, MB);
    source.set_threads(42, &[(43, 0, 0)]);

    let mut sampler = sampler(source);
    sampler.process_usage(42, WITH_THREADS).unwrap();

    sampler.source().set_ticks(1_100);
    let usage = sampler.process_usage(42, PROCESS_ONLY).unwrap();
    assert!(usage.threads.is_empty());
    assert!(sampler.is_tracked(UsageSnapshotKey::Thread { pid: 42, tid: 43 }));
}

#[test]
fn test_thread_failure_fails_round_without_committing() {
    let source = ScriptedSource::new(GB);
    source.set_ticks(1_000);
    source.set_process(42, 100, 50, MB);
    source.set_threads(42, &[(42, 100, 50), (43, 0, 0)]);

    let mut sampler = sampler(source);
    sampler.process_usage(42, WITH_THREADS).unwrap();

    sampler.source().set_ticks(1_100);
    sampler.source().set_process(42, 500, 500, MB);
    sampler.source().fail_thread.set(Some(43));
    let err = sampler.process_usage(42, WITH_THREADS).unwrap_err();
    assert!(matches!(err.causes(), [UsageError::Parse { .. }]));

    sampler.source().fail_thread.set(None);
    sampler.source().set_ticks(1_200);
    sampler.source().set_process(42, 140, 70, MB);
    let usage = sampler.process_usage(42, WITH_THREADS).unwrap();
    assert_close(usage.cpu_percent_normalized, 30.0);
}

// -------------------------------------------------------------------------
// Failure propagation
// -------------------------------------------------------------------------

#[test]
fn test_stat_failure_keeps_previous_snapshot() {
    let source = ScriptedSource::new(GB);
    source.set_ticks(1_000);
    source.set_process(42, 100, 50, MB);

    let mut sampler = sampler(source);
    sampler.process_usage(42, PROCESS_ONLY).unwrap();

    sampler.source().set_ticks(1_100);
    sampler.source().fail_stat.set(true);
    let err = sampler.process_usage(42, PROCESS_ONLY).unwrap_err();
    assert_eq!(err.causes().len(), 1);
    assert!(err.to_string().contains("process 42"));
    assert!(sampler.is_tracked(UsageSnapshotKey::Process(42)));

    // Healthy again: diffed against the pre-failure snapshot, not a cold start
    sampler.source().fail_stat.set(false);
    sampler.source().set_ticks(1_200);
    sampler.source().set_process(42, 140, 70, MB);
    let usage = sampler.process_usage(42, PROCESS_ONLY).unwrap();
    assert_close(usage.cpu_percent_normalized, 30.0);
}

#[test]
fn test_stat_failure_on_cold_start_caches_nothing() {
    let source = ScriptedSource::new(GB);
    source.set_ticks(1_000);
    source.fail_stat.set(true);

    let mut sampler = sampler(source);
    assert!(sampler.process_usage(42, PROCESS_ONLY).is_err());
    assert!(!sampler.is_tracked(UsageSnapshotKey::Process(42)));
}

#[test]
fn test_memory_failure_fails_warm_and_cold_rounds() {
    let source = ScriptedSource::new(GB);
    source.set_ticks(1_000);
    source.set_process(42, 100, 50, MB);
    source.fail_memory.set(true);

    let mut sampler = sampler(source);
    assert!(sampler.process_usage(42, PROCESS_ONLY).is_err());
    assert!(!sampler.is_tracked(UsageSnapshotKey::Process(42)));

    sampler.source().fail_memory.set(false);
    sampler.process_usage(42, PROCESS_ONLY).unwrap();

    sampler.source().set_ticks(1_100);
    sampler.source().set_process(42, 900, 900, MB);
    sampler.source().fail_memory.set(true);
    assert!(sampler.process_usage(42, PROCESS_ONLY).is_err());

    sampler.source().fail_memory.set(false);
    sampler.source().set_ticks(1_200);
    sampler.source().set_process(42, 140, 70, MB);
    let usage = sampler.process_usage(42, PROCESS_ONLY).unwrap();
    assert_close(usage.cpu_percent_normalized, 30.0);
}

// -------------------------------------------------------------------------
// Children
// -------------------------------------------------------------------------

#[test]
fn test_children_are_opt_in() {
    let source = ScriptedSource::new(GB);
    source.set_ticks(1_000);
    source.set_process(10, 0, 0, MB);
    source.set_process(11, 0, 0, MB);
    source.set_parent(11, 10);

    let mut sampler = sampler(source);
    let usage = sampler.process_usage(10, SampleOptions::default()).unwrap();
    assert!(usage.children.is_empty());
    assert!(!sampler.is_tracked(UsageSnapshotKey::Process(11)));
}

#[test]
fn test_children_sampled_recursively_in_listing_order() {
    let source = ScriptedSource::new(GB);
    source.set_ticks(1_000);
    for pid in [10, 11, 12, 13] {
        source.set_process(pid, 0, 0, MB);
    }
    source.set_parent(12, 10);
    source.set_parent(11, 10);
    source.set_parent(13, 11);

    let options = SampleOptions {
        include_threads: false,
        include_children: true,
    };
    let mut sampler = sampler(source);
    sampler.process_usage(10, options).unwrap();

    sampler.source().set_ticks(1_100);
    sampler.source().set_process(13, 25, 25, MB);
    let usage = sampler.process_usage(10, options).unwrap();

    let ids: Vec<u32> = usage.children.iter().map(|c| c.process_id).collect();
    assert_eq!(ids, vec![11, 12]);
    let grandchild = &usage.children[0].children[0];
    assert_eq!(grandchild.process_id, 13);
    assert_close(grandchild.cpu_percent_normalized, 50.0);
    assert!(usage.children[1].children.is_empty());
}

#[test]
fn test_child_failure_fails_round_without_committing_siblings() {
    let source = ScriptedSource::new(GB);
    source.set_ticks(1_000);
    for pid in [10, 11, 12] {
        source.set_process(pid, 0, 0, MB);
    }
    source.set_parent(11, 10);
    source.set_parent(12, 10);
    source.set_threads(11, &[(11, 0, 0)]);
    source.set_threads(12, &[(12, 0, 0), (99, 0, 0)]);

    let options = SampleOptions {
        include_threads: true,
        include_children: true,
    };
    let mut sampler = sampler(source);
    sampler.process_usage(10, options).unwrap();

    // Child 11 is read before child 12 fails to parse
    sampler.source().set_ticks(1_100);
    sampler.source().set_process(11, 25, 25, MB);
    sampler.source().set_threads(11, &[(11, 25, 25)]);
    sampler.source().fail_thread.set(Some(99));
    let err = sampler.process_usage(10, options).unwrap_err();
    assert!(matches!(err.causes(), [UsageError::Parse { .. }]));

    sampler.source().fail_thread.set(None);
    sampler.source().set_ticks(1_200);
    sampler.source().set_process(11, 75, 75, MB);
    sampler.source().set_threads(11, &[(11, 75, 75)]);
    let usage = sampler.process_usage(10, options).unwrap();

    let child = &usage.children[0];
    assert_eq!(child.process_id, 11);
    assert_close(child.cpu_percent_normalized, 75.0);
    assert_close(child.threads[0].cpu_percent_normalized, 75.0);
}

#[test]
fn test_process_tree_listed_once_per_round() {
    let source = ScriptedSource::new(GB);
    source.set_ticks(1_000);
    for pid in [10, 11, 12, 13] {
        source.set_process(pid, 0, 0, MB);
    }
    source.set_parent(11, 10);
    source.set_parent(12, 11);
    source.set_parent(13, 12);

    let options = SampleOptions {
        include_threads: false,
        include_children: true,
    };
    let mut sampler = sampler(source);
    let usage = sampler.process_usage(10, options).unwrap();
    assert_eq!(usage.children[0].children[0].children[0].process_id, 13);
    assert_eq!(sampler.source().tree_listings.get(), 1);

    sampler.process_usage(10, PROCESS_ONLY).unwrap();
    assert_eq!(sampler.source().tree_listings.get(), 1);
}

#[test]
fn test_vanished_child_is_skipped() {
    let source = ScriptedSource::new(GB);
    source.set_ticks(1_000);
    for pid in [10, 11, 12] {
        source.set_process(pid, 0, 0, MB);
        source.set_parent(pid, 10);
    }
    source.set_parent(10, 1);
    source.set_vanished(11);

    let options = SampleOptions {
        include_threads: false,
        include_children: true,
    };
    let mut sampler = sampler(source);
    let usage = sampler.process_usage(10, options).unwrap();

    let ids: Vec<u32> = usage.children.iter().map(|c| c.process_id).collect();
    assert_eq!(ids, vec![12]);
    assert!(!sampler.is_tracked(UsageSnapshotKey::Process(11)));
}

#[test]
fn test_parent_cycle_terminates() {
    let source = ScriptedSource::new(GB);
    source.set_ticks(1_000);
    source.set_process(20, 0, 0, MB);
    source.set_process(21, 0, 0, MB);
    source.set_parent(20, 21);
    source.set_parent(21, 20);

    let options = SampleOptions {
        include_threads: false,
        include_children: true,
    };
    let mut sampler = sampler(source);
    let usage = sampler.process_usage(20, options).unwrap();
    assert_eq!(usage.children.len(), 1);
    assert_eq!(usage.children[0].process_id, 21);
    assert!(usage.children[0].children.is_empty());
}

// -------------------------------------------------------------------------
// Lifecycle
// -------------------------------------------------------------------------

#[test]
fn test_dispose_forgets_history_and_is_idempotent() {
    let source = ScriptedSource::new(GB);
    source.set_ticks(1_000);
    source.set_process(42, 100, 50, MB);
    source.set_threads(42, &[(42, 100, 50)]);

    let mut sampler = sampler(source);
    sampler.process_usage(42, WITH_THREADS).unwrap();

    sampler.dispose();
    sampler.dispose();
    assert!(!sampler.is_tracked(UsageSnapshotKey::Process(42)));
    assert!(!sampler.is_tracked(UsageSnapshotKey::Thread { pid: 42, tid: 42 }));

    sampler.source().set_ticks(1_200);
    sampler.source().set_process(42, 140, 70, MB);
    let usage = sampler.process_usage(42, WITH_THREADS).unwrap();
    assert_eq!(usage.cpu_percent_normalized, 0.0);
}

#[test]
fn test_independent_samplers_do_not_share_history() {
    let first = ScriptedSource::new(GB);
    first.set_ticks(1_000);
    first.set_process(42, 100, 50, MB);
    let second = ScriptedSource::new(GB);
    second.set_ticks(1_000);
    second.set_process(42, 100, 50, MB);

    let mut a = sampler(first);
    let mut b = sampler(second);
    a.process_usage(42, PROCESS_ONLY).unwrap();

    b.source().set_ticks(1_200);
    b.source().set_process(42, 140, 70, MB);
    let usage = b.process_usage(42, PROCESS_ONLY).unwrap();
    assert_eq!(usage.cpu_percent_normalized, 0.0);
}

#[test]
fn test_usage_serializes_memory_as_bytes() {
    let source = ScriptedSource::new(GB);
    source.set_ticks(1_000);
    source.set_process(42, 0, 0, 3 * MB);

    let mut sampler = sampler(source);
    let usage = sampler.process_usage(42, PROCESS_ONLY).unwrap();
    let json = serde_json::to_value(&usage).unwrap();
    assert_eq!(json["memory_bytes"], 3 * MB);
    assert_eq!(json["process_id"], 42);
    assert!(json["threads"].as_array().unwrap().is_empty());
}
