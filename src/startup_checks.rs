//! Startup requirement validation for herakles-usage-sampler.
//!
//! This module validates that the sampler has the permissions it needs to
//! read the target process before the monitor loop starts.

use std::fs;
use std::path::Path;
use tracing::{error, info, warn};

/// Validate all runtime requirements for sampling `pid`.
pub fn validate_requirements(proc_root: &Path, pid: u32) -> Result<(), ValidationError> {
    info!("🔍 Validating runtime requirements...");

    check_user_privileges();
    check_proc_access(proc_root, pid)?;

    info!("✅ All runtime requirements validated");
    Ok(())
}

/// Whether the sampler runs with root privileges.
#[cfg(unix)]
pub fn is_root() -> bool {
    nix::unistd::geteuid().is_root()
}

#[cfg(not(unix))]
pub fn is_root() -> bool {
    false
}

/// Check if running with sufficient privileges
fn check_user_privileges() {
    if is_root() {
        info!("✅ Running as root (uid=0)");
    } else {
        warn!("⚠️  Not running as root - processes of other users may not be readable");
        warn!("   Recommendation: Run as root to sample any process");
    }
}

/// Check that the stat and status files of `pid` are readable
fn check_proc_access(proc_root: &Path, pid: u32) -> Result<(), ValidationError> {
    if cfg!(not(target_os = "linux")) {
        return Ok(());
    }

    let process_dir = proc_root.join(pid.to_string());
    if !process_dir.exists() {
        error!("❌ Process {} not found under {}", pid, proc_root.display());
        return Err(ValidationError::ProcessNotFound(pid));
    }

    for file in ["stat", "status"] {
        let path = process_dir.join(file);
        match fs::read_to_string(&path) {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                error!("❌ Cannot read {} - insufficient permissions", path.display());
                error!("   Solutions:");
                error!("   1. Run as root or as the owner of process {}", pid);
                error!("   2. Grant capabilities:");
                error!("      setcap cap_dac_read_search,cap_sys_ptrace+ep /path/to/binary");
                return Err(ValidationError::InsufficientPermissions(format!(
                    "{}: {}",
                    path.display(),
                    e
                )));
            }
            Err(e) => {
                warn!("⚠️  Could not test {}: {}", path.display(), e);
            }
        }
    }

    info!("✅ /proc access: process {} is readable", pid);
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Insufficient permissions: {0}")]
    InsufficientPermissions(String),

    #[error("Process {0} does not exist")]
    ProcessNotFound(u32),
}
