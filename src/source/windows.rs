//! Windows metric source backed by Win32 process and thread time APIs.
//!
//! Ticks are FILETIME units (100 ns). System time comes from
//! `GetSystemTimes` (its kernel time already includes idle time), process and
//! thread times from `GetProcessTimes`/`GetThreadTimes`, thread and parent
//! listings from Toolhelp snapshots, and memory from `GlobalMemoryStatusEx`
//! and `K32GetProcessMemoryInfo`.

use std::mem;

use windows_sys::Win32::Foundation::{CloseHandle, FILETIME, HANDLE, INVALID_HANDLE_VALUE};
use windows_sys::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, Thread32First, Thread32Next,
    PROCESSENTRY32W, TH32CS_SNAPPROCESS, TH32CS_SNAPTHREAD, THREADENTRY32,
};
use windows_sys::Win32::System::ProcessStatus::{K32GetProcessMemoryInfo, PROCESS_MEMORY_COUNTERS};
use windows_sys::Win32::System::SystemInformation::{GlobalMemoryStatusEx, MEMORYSTATUSEX};
use windows_sys::Win32::System::Threading::{
    GetProcessTimes, GetSystemTimes, GetThreadTimes, OpenProcess, OpenThread,
    PROCESS_ACCESS_RIGHTS, PROCESS_QUERY_LIMITED_INFORMATION, THREAD_QUERY_LIMITED_INFORMATION,
};

use crate::error::UsageError;
use crate::process::{MemorySize, RawStat};
use crate::source::{PlatformMetricSource, ProcessTree};

/// Access requested for process time and memory queries.
const PROCESS_ACCESS: PROCESS_ACCESS_RIGHTS = PROCESS_QUERY_LIMITED_INFORMATION;

/// Closes the wrapped handle on drop.
struct OwnedHandle(HANDLE);

impl OwnedHandle {
    fn new(handle: HANDLE, target: impl Into<String>) -> Result<Self, UsageError> {
        if handle.is_null() || handle == INVALID_HANDLE_VALUE {
            return Err(UsageError::read(target, std::io::Error::last_os_error()));
        }
        Ok(Self(handle))
    }
}

impl Drop for OwnedHandle {
    fn drop(&mut self) {
        // SAFETY: the handle was returned valid by the opening call and is
        // closed exactly once.
        unsafe {
            CloseHandle(self.0);
        }
    }
}

fn filetime_ticks(ft: &FILETIME) -> u64 {
    ((ft.dwHighDateTime as u64) << 32) | ft.dwLowDateTime as u64
}

fn empty_filetime() -> FILETIME {
    FILETIME {
        dwLowDateTime: 0,
        dwHighDateTime: 0,
    }
}

/// One entry of a process snapshot.
struct ProcessEntry {
    pid: u32,
    parent_id: u32,
    name: String,
}

/// Metric source for Windows.
#[derive(Debug, Clone, Default)]
pub struct WindowsSource;

impl WindowsSource {
    pub fn new() -> Self {
        Self
    }

    fn process_entries(&self) -> Result<Vec<ProcessEntry>, UsageError> {
        // SAFETY: plain snapshot call; the handle is owned below.
        let snapshot = OwnedHandle::new(
            unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) },
            "process snapshot",
        )?;

        let mut entries = Vec::new();
        // SAFETY: PROCESSENTRY32W is plain data; dwSize is set before use.
        let mut entry: PROCESSENTRY32W = unsafe { mem::zeroed() };
        entry.dwSize = mem::size_of::<PROCESSENTRY32W>() as u32;

        // SAFETY: entry is a valid, sized PROCESSENTRY32W.
        let mut ok = unsafe { Process32FirstW(snapshot.0, &mut entry) } != 0;
        while ok {
            let len = entry
                .szExeFile
                .iter()
                .position(|&c| c == 0)
                .unwrap_or(entry.szExeFile.len());
            entries.push(ProcessEntry {
                pid: entry.th32ProcessID,
                parent_id: entry.th32ParentProcessID,
                name: String::from_utf16_lossy(&entry.szExeFile[..len]),
            });
            // SAFETY: as above.
            ok = unsafe { Process32NextW(snapshot.0, &mut entry) } != 0;
        }
        Ok(entries)
    }

    fn open_process(pid: u32) -> Result<OwnedHandle, UsageError> {
        // SAFETY: OpenProcess has no memory preconditions.
        let handle = unsafe { OpenProcess(PROCESS_ACCESS, 0, pid) };
        OwnedHandle::new(handle, format!("process {}", pid))
    }
}

impl PlatformMetricSource for WindowsSource {
    fn total_system_cpu_ticks(&self) -> Result<u64, UsageError> {
        let mut idle = empty_filetime();
        let mut kernel = empty_filetime();
        let mut user = empty_filetime();
        // SAFETY: all three out-pointers reference live FILETIMEs.
        if unsafe { GetSystemTimes(&mut idle, &mut kernel, &mut user) } == 0 {
            return Err(UsageError::read(
                "system times",
                std::io::Error::last_os_error(),
            ));
        }
        Ok(filetime_ticks(&kernel) + filetime_ticks(&user))
    }

    fn process_raw_stat(&self, pid: u32) -> Result<RawStat, UsageError> {
        let process = Self::open_process(pid)?;
        let mut creation = empty_filetime();
        let mut exit = empty_filetime();
        let mut kernel = empty_filetime();
        let mut user = empty_filetime();
        // SAFETY: valid process handle and live out-pointers.
        let ok = unsafe {
            GetProcessTimes(process.0, &mut creation, &mut exit, &mut kernel, &mut user)
        };
        if ok == 0 {
            return Err(UsageError::read(
                format!("times of process {}", pid),
                std::io::Error::last_os_error(),
            ));
        }

        let mut stat = RawStat::from_times(pid, filetime_ticks(&user), filetime_ticks(&kernel));
        if let Some(entry) = self
            .process_entries()
            .ok()
            .and_then(|entries| entries.into_iter().find(|e| e.pid == pid))
        {
            stat.command = entry.name;
            stat.parent_id = entry.parent_id;
        }
        Ok(stat)
    }

    fn thread_ids(&self, pid: u32) -> Vec<u32> {
        // SAFETY: plain snapshot call; the handle is owned below.
        let snapshot = match OwnedHandle::new(
            unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPTHREAD, 0) },
            "thread snapshot",
        ) {
            Ok(handle) => handle,
            Err(e) => {
                tracing::debug!("Cannot list threads of {}: {}", pid, e);
                return Vec::new();
            }
        };

        let mut ids = Vec::new();
        // SAFETY: THREADENTRY32 is plain data; dwSize is set before use.
        let mut entry: THREADENTRY32 = unsafe { mem::zeroed() };
        entry.dwSize = mem::size_of::<THREADENTRY32>() as u32;

        // SAFETY: entry is a valid, sized THREADENTRY32.
        let mut ok = unsafe { Thread32First(snapshot.0, &mut entry) } != 0;
        while ok {
            if entry.th32OwnerProcessID == pid {
                ids.push(entry.th32ThreadID);
            }
            // SAFETY: as above.
            ok = unsafe { Thread32Next(snapshot.0, &mut entry) } != 0;
        }
        ids
    }

    fn thread_raw_stat(&self, _pid: u32, tid: u32) -> Result<RawStat, UsageError> {
        // SAFETY: OpenThread has no memory preconditions.
        let thread = OwnedHandle::new(
            unsafe { OpenThread(THREAD_QUERY_LIMITED_INFORMATION, 0, tid) },
            format!("thread {}", tid),
        )?;
        let mut creation = empty_filetime();
        let mut exit = empty_filetime();
        let mut kernel = empty_filetime();
        let mut user = empty_filetime();
        // SAFETY: valid thread handle and live out-pointers.
        let ok = unsafe {
            GetThreadTimes(thread.0, &mut creation, &mut exit, &mut kernel, &mut user)
        };
        if ok == 0 {
            return Err(UsageError::read(
                format!("times of thread {}", tid),
                std::io::Error::last_os_error(),
            ));
        }
        Ok(RawStat::from_times(
            tid,
            filetime_ticks(&user),
            filetime_ticks(&kernel),
        ))
    }

    fn total_system_memory(&self) -> Result<MemorySize, UsageError> {
        // SAFETY: MEMORYSTATUSEX is plain data; dwLength is set before use.
        let mut status: MEMORYSTATUSEX = unsafe { mem::zeroed() };
        status.dwLength = mem::size_of::<MEMORYSTATUSEX>() as u32;
        // SAFETY: status is a valid, sized MEMORYSTATUSEX.
        if unsafe { GlobalMemoryStatusEx(&mut status) } == 0 {
            return Err(UsageError::read(
                "memory status",
                std::io::Error::last_os_error(),
            ));
        }
        Ok(MemorySize::from_bytes(status.ullTotalPhys))
    }

    fn process_memory(&self, pid: u32) -> Result<MemorySize, UsageError> {
        let process = Self::open_process(pid)?;
        // SAFETY: PROCESS_MEMORY_COUNTERS is plain data.
        let mut counters: PROCESS_MEMORY_COUNTERS = unsafe { mem::zeroed() };
        let size = mem::size_of::<PROCESS_MEMORY_COUNTERS>() as u32;
        counters.cb = size;
        // SAFETY: valid handle and a correctly sized counters struct.
        if unsafe { K32GetProcessMemoryInfo(process.0, &mut counters, size) } == 0 {
            return Err(UsageError::read(
                format!("memory of process {}", pid),
                std::io::Error::last_os_error(),
            ));
        }
        Ok(MemorySize::from_bytes(counters.PagefileUsage as u64))
    }

    fn process_tree(&self) -> ProcessTree {
        match self.process_entries() {
            Ok(entries) => {
                ProcessTree::from_parents(entries.into_iter().map(|e| (e.pid, e.parent_id)))
            }
            Err(e) => {
                tracing::debug!("Cannot list processes: {}", e);
                ProcessTree::default()
            }
        }
    }
}
