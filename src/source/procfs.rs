//! Linux metric source backed by the /proc filesystem.
//!
//! Reads system CPU ticks from `/proc/stat`, total memory from
//! `/proc/meminfo`, and per-process data from `/proc/<pid>/stat`,
//! `/proc/<pid>/status` and `/proc/<pid>/task/<tid>/stat`. The root is
//! configurable so tests can point it at a fabricated tree.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::UsageError;
use crate::process::{find_kb_field, parse_stat_line, MemorySize, RawStat};
use crate::source::{PlatformMetricSource, ProcessTree};

pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// CPU statistics from the aggregate `cpu` line of /proc/stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuStat {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuStat {
    /// Calculate total CPU time (all fields).
    ///
    /// guest/guest_nice are already accounted in user/nice and are not part
    /// of the struct.
    pub fn total(&self) -> u64 {
        self.user + self.nice + self.system + self.idle + self.iowait + self.irq + self.softirq + self.steal
    }
}

/// Parses the aggregate `cpu ` line of /proc/stat content.
pub fn parse_cpu_stat(content: &str) -> Result<CpuStat, UsageError> {
    let line = content.lines().find(|l| l.starts_with("cpu ")).ok_or_else(|| {
        UsageError::parse(
            content.lines().next().unwrap_or_default(),
            "no aggregate cpu line found in stat",
        )
    })?;

    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 8 {
        return Err(UsageError::parse(
            line,
            format!(
                "expected at least 7 cpu values, got {}",
                parts.len() - 1
            ),
        ));
    }

    let field = |i: usize| -> Result<u64, UsageError> {
        match parts.get(i) {
            Some(v) => v.parse::<u64>().map_err(|e| {
                UsageError::parse(line, format!("cpu field {} `{}`: {}", i, v, e))
            }),
            None => Ok(0),
        }
    };

    Ok(CpuStat {
        user: field(1)?,
        nice: field(2)?,
        system: field(3)?,
        idle: field(4)?,
        iowait: field(5)?,
        irq: field(6)?,
        softirq: field(7)?,
        steal: field(8)?,
    })
}

/// Metric source reading from a procfs root.
#[derive(Debug, Clone)]
pub struct ProcfsSource {
    root: PathBuf,
}

impl Default for ProcfsSource {
    fn default() -> Self {
        Self::new(DEFAULT_PROC_ROOT)
    }
}

impl ProcfsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read(&self, path: &Path) -> Result<String, UsageError> {
        fs::read_to_string(path).map_err(|e| UsageError::read(path.display().to_string(), e))
    }

    fn read_stat_file(&self, path: &Path) -> Result<RawStat, UsageError> {
        let content = self.read(path)?;
        parse_stat_line(&content)
    }

    fn read_kb_field(&self, path: &Path, key: &str) -> Result<MemorySize, UsageError> {
        let content = self.read(path)?;
        find_kb_field(&content, key).ok_or_else(|| {
            UsageError::read(
                path.display().to_string(),
                std::io::Error::other(format!("no {} line found", key)),
            )
        })
    }

    /// Numeric entries of `dir`, sorted ascending. Missing or unreadable
    /// directories yield no entries.
    fn numeric_entries(dir: &Path) -> Vec<u32> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Cannot list {}: {}", dir.display(), e);
                return Vec::new();
            }
        };

        let mut ids: Vec<u32> = entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name();
                let name = name.to_str()?;
                if !name.chars().all(|c| c.is_ascii_digit()) {
                    return None;
                }
                name.parse().ok()
            })
            .collect();
        ids.sort_unstable();
        ids
    }
}

impl PlatformMetricSource for ProcfsSource {
    fn total_system_cpu_ticks(&self) -> Result<u64, UsageError> {
        let path = self.root.join("stat");
        let content = self.read(&path)?;
        Ok(parse_cpu_stat(&content)?.total())
    }

    fn process_raw_stat(&self, pid: u32) -> Result<RawStat, UsageError> {
        self.read_stat_file(&self.root.join(pid.to_string()).join("stat"))
    }

    fn thread_ids(&self, pid: u32) -> Vec<u32> {
        Self::numeric_entries(&self.root.join(pid.to_string()).join("task"))
    }

    fn thread_raw_stat(&self, pid: u32, tid: u32) -> Result<RawStat, UsageError> {
        let path = self
            .root
            .join(pid.to_string())
            .join("task")
            .join(tid.to_string())
            .join("stat");
        self.read_stat_file(&path)
    }

    fn total_system_memory(&self) -> Result<MemorySize, UsageError> {
        self.read_kb_field(&self.root.join("meminfo"), "MemTotal:")
    }

    fn process_memory(&self, pid: u32) -> Result<MemorySize, UsageError> {
        self.read_kb_field(&self.root.join(pid.to_string()).join("status"), "VmRSS:")
    }

    fn process_tree(&self) -> ProcessTree {
        ProcessTree::from_parents(Self::numeric_entries(&self.root).into_iter().filter_map(
            |pid| {
                self.process_raw_stat(pid)
                    .ok()
                    .map(|stat| (pid, stat.parent_id))
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const STAT: &str = "cpu  100 5 50 1000 10 1 2 3 7 0\ncpu0 50 2 25 500 5 1 1 2 0 0\nintr 0\nbtime 1700000000\n";

    fn write_process(root: &Path, pid: u32, ppid: u32, comm: &str, utime: u64, stime: u64) {
        let dir = root.join(pid.to_string());
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("stat"),
            format!(
                "{} ({}) S {} {} {} 0 -1 4194304 0 0 0 0 {} {} 0 0 20 0 1 0 1 0 0\n",
                pid, comm, ppid, pid, pid, utime, stime
            ),
        )
        .unwrap();
        fs::write(dir.join("status"), "Name:\ttest\nVmRSS:\t    2048 kB\n").unwrap();
    }

    // -------------------------------------------------------------------------
    // Tests for parse_cpu_stat
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_cpu_stat_sums_eight_fields() {
        let stat = parse_cpu_stat(STAT).unwrap();
        assert_eq!(stat.user, 100);
        assert_eq!(stat.steal, 3);
        // guest (7) is not added on top of user
        assert_eq!(stat.total(), 100 + 5 + 50 + 1000 + 10 + 1 + 2 + 3);
    }

    #[test]
    fn test_parse_cpu_stat_without_steal() {
        let stat = parse_cpu_stat("cpu  1 2 3 4 5 6 7\n").unwrap();
        assert_eq!(stat.steal, 0);
        assert_eq!(stat.total(), 28);
    }

    #[test]
    fn test_parse_cpu_stat_invalid() {
        assert!(parse_cpu_stat("cpu0 1 2 3 4 5 6 7\n").is_err());
        assert!(parse_cpu_stat("cpu  1 2 3\n").is_err());
        assert!(parse_cpu_stat("cpu  1 x 3 4 5 6 7\n").is_err());
    }

    // -------------------------------------------------------------------------
    // Tests for ProcfsSource
    // -------------------------------------------------------------------------

    #[test]
    fn test_total_system_cpu_ticks() {
        let dir = tempdir().expect("Failed to create temp dir");
        fs::write(dir.path().join("stat"), STAT).unwrap();

        let source = ProcfsSource::new(dir.path());
        assert_eq!(source.total_system_cpu_ticks().unwrap(), 1171);
    }

    #[test]
    fn test_malformed_cpu_line_is_a_parse_error() {
        let dir = tempdir().expect("Failed to create temp dir");
        fs::write(dir.path().join("stat"), "cpu  1 x 3 4 5 6 7\nintr 0\n").unwrap();

        let source = ProcfsSource::new(dir.path());
        let err = source.total_system_cpu_ticks().unwrap_err();
        assert!(matches!(err, UsageError::Parse { ref line, .. } if line == "cpu  1 x 3 4 5 6 7"));

        fs::write(dir.path().join("stat"), "intr 0\n").unwrap();
        let err = source.total_system_cpu_ticks().unwrap_err();
        assert!(matches!(err, UsageError::Parse { .. }));
    }

    #[test]
    fn test_total_system_cpu_ticks_missing_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        let source = ProcfsSource::new(dir.path());
        let err = source.total_system_cpu_ticks().unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_process_raw_stat_and_memory() {
        let dir = tempdir().expect("Failed to create temp dir");
        write_process(dir.path(), 42, 1, "my (weird) proc", 300, 200);

        let source = ProcfsSource::new(dir.path());
        let stat = source.process_raw_stat(42).unwrap();
        assert_eq!(stat.command, "my (weird) proc");
        assert_eq!(stat.total_ticks(), 500);

        let memory = source.process_memory(42).unwrap();
        assert_eq!(memory, MemorySize::from_megabytes(2.0));
    }

    #[test]
    fn test_process_memory_without_vmrss() {
        let dir = tempdir().expect("Failed to create temp dir");
        write_process(dir.path(), 2, 0, "kthreadd", 0, 0);
        fs::write(dir.path().join("2").join("status"), "Name:\tkthreadd\n").unwrap();

        let source = ProcfsSource::new(dir.path());
        let err = source.process_memory(2).unwrap_err();
        assert!(err.to_string().contains("VmRSS:"));
    }

    #[test]
    fn test_total_system_memory() {
        let dir = tempdir().expect("Failed to create temp dir");
        fs::write(
            dir.path().join("meminfo"),
            "MemTotal:       16777216 kB\nMemFree:         1000 kB\n",
        )
        .unwrap();

        let source = ProcfsSource::new(dir.path());
        assert_eq!(
            source.total_system_memory().unwrap(),
            MemorySize::from_gigabytes(16.0)
        );
    }

    #[test]
    fn test_thread_ids_sorted_and_missing_task_dir() {
        let dir = tempdir().expect("Failed to create temp dir");
        write_process(dir.path(), 42, 1, "worker", 0, 0);

        let source = ProcfsSource::new(dir.path());
        assert!(source.thread_ids(42).is_empty());

        let task = dir.path().join("42").join("task");
        for tid in [45u32, 42, 43] {
            fs::create_dir_all(task.join(tid.to_string())).unwrap();
        }
        fs::create_dir_all(task.join("not-a-tid")).unwrap();

        assert_eq!(source.thread_ids(42), vec![42, 43, 45]);
    }

    #[test]
    fn test_thread_raw_stat() {
        let dir = tempdir().expect("Failed to create temp dir");
        let task = dir.path().join("42").join("task").join("43");
        fs::create_dir_all(&task).unwrap();
        fs::write(
            task.join("stat"),
            "43 (tokio-runtime-w) R 1 42 42 0 -1 0 0 0 0 0 11 4 0 0 20 0 1 0 1 0 0\n",
        )
        .unwrap();

        let source = ProcfsSource::new(dir.path());
        let stat = source.thread_raw_stat(42, 43).unwrap();
        assert_eq!(stat.id, 43);
        assert_eq!(stat.command, "tokio-runtime-w");
        assert_eq!(stat.total_ticks(), 15);

        assert!(source.thread_raw_stat(42, 44).is_err());
    }

    #[test]
    fn test_child_pids() {
        let dir = tempdir().expect("Failed to create temp dir");
        write_process(dir.path(), 10, 1, "parent", 0, 0);
        write_process(dir.path(), 12, 10, "child b", 0, 0);
        write_process(dir.path(), 11, 10, "child a", 0, 0);
        write_process(dir.path(), 13, 11, "grandchild", 0, 0);
        fs::create_dir_all(dir.path().join("self")).unwrap();

        let source = ProcfsSource::new(dir.path());
        assert_eq!(source.child_pids(10), vec![11, 12]);
        assert_eq!(source.child_pids(11), vec![13]);
        assert!(source.child_pids(13).is_empty());
    }

    #[test]
    fn test_process_tree_skips_unreadable_entries() {
        let dir = tempdir().expect("Failed to create temp dir");
        write_process(dir.path(), 10, 1, "parent", 0, 0);
        write_process(dir.path(), 11, 10, "child", 0, 0);
        fs::create_dir_all(dir.path().join("12")).unwrap();

        let tree = ProcfsSource::new(dir.path()).process_tree();
        assert_eq!(tree.children(10), &[11]);
        assert_eq!(tree.children(1), &[10]);
    }
}
