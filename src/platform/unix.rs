use crate::core::models::{Pid, ProcessRecord, ProcessState};
use crate::core::process_tree::ProcessTreeError;
use crate::core::source::ProcessSource;
#[cfg(target_os = "linux")]
use crate::core::source::ProcfsSource;
use psutil::process::{Process, ProcessError};

/// Live process metadata backed by psutil
#[derive(Debug, Clone, Copy, Default)]
pub struct PsutilSource;

impl PsutilSource {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessSource for PsutilSource {
    fn resolve(&self, pid: Pid) -> Result<ProcessRecord, ProcessTreeError> {
        match resolve_with_psutil(pid) {
            Err(ProcessTreeError::MetadataUnavailable { reason, .. }) => {
                resolve_fallback(pid, reason)
            }
            other => other,
        }
    }
}

fn resolve_with_psutil(pid: Pid) -> Result<ProcessRecord, ProcessTreeError> {
    let process = Process::new(pid).map_err(|err| lookup_error(pid, err))?;
    let name = process.name().map_err(|err| lookup_error(pid, err))?;
    let parent = process.ppid().map_err(|err| lookup_error(pid, err))?;
    let state = process_state(&process);

    Ok(ProcessRecord::new(pid, name, state).with_parent(parent))
}

/// psutil decodes `stat` as UTF-8 and fails on names set through
/// `PR_SET_NAME` with arbitrary bytes; procfs is read lossily instead.
#[cfg(target_os = "linux")]
fn resolve_fallback(pid: Pid, reason: String) -> Result<ProcessRecord, ProcessTreeError> {
    tracing::debug!(pid, %reason, "psutil lookup failed, reading procfs directly");
    ProcfsSource::default().resolve(pid)
}

#[cfg(not(target_os = "linux"))]
fn resolve_fallback(pid: Pid, reason: String) -> Result<ProcessRecord, ProcessTreeError> {
    Err(ProcessTreeError::metadata(pid, reason))
}

#[cfg(target_os = "linux")]
fn process_state(process: &Process) -> ProcessState {
    use psutil::process::Status;

    match process.status() {
        Ok(Status::Running) => ProcessState::Running,
        Ok(Status::Sleeping) => ProcessState::Sleeping,
        Ok(Status::DiskSleep) => ProcessState::DiskSleep,
        Ok(Status::Stopped) => ProcessState::Stopped,
        Ok(Status::TracingStop) => ProcessState::TracingStop,
        Ok(Status::Zombie) => ProcessState::Zombie,
        Ok(Status::Dead) => ProcessState::Dead,
        Ok(Status::WakeKill) => ProcessState::WakeKill,
        Ok(Status::Waking) => ProcessState::Waking,
        Ok(Status::Parked) => ProcessState::Parked,
        Ok(Status::Idle) => ProcessState::Idle,
        _ => ProcessState::Unknown,
    }
}

#[cfg(not(target_os = "linux"))]
fn process_state(_process: &Process) -> ProcessState {
    ProcessState::Unknown
}

/// Map a psutil failure onto the lookup taxonomy.
///
/// psutil reports some races (process exiting mid-read) as generic errors,
/// so anything that is not explicit is re-checked against the live table.
fn lookup_error(pid: Pid, err: ProcessError) -> ProcessTreeError {
    match err {
        ProcessError::NoSuchProcess { .. } => ProcessTreeError::ProcessNotFound(pid),
        ProcessError::AccessDenied { .. } => ProcessTreeError::PermissionDenied(pid),
        other if !process_alive(pid) => {
            tracing::debug!(pid, "psutil lookup failed for exited process: {:?}", other);
            ProcessTreeError::ProcessNotFound(pid)
        }
        other => ProcessTreeError::metadata(pid, other.to_string()),
    }
}

/// Check if process is alive
///
/// Signal 0 performs the existence and permission checks without delivering
/// anything.
pub fn process_alive(pid: Pid) -> bool {
    let Ok(c_pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    if c_pid <= 0 {
        return false;
    }
    match send_signal(c_pid, 0) {
        Ok(()) => true,
        Err(errno) => errno == libc::EPERM, // EPERM means process exists but no permission
    }
}

/// Safely send signal
///
/// Encapsulates unsafe kill call and returns Result instead of raw error code
fn send_signal(pid: libc::pid_t, signal: libc::c_int) -> Result<(), libc::c_int> {
    let result = unsafe { libc::kill(pid, signal) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error()
            .raw_os_error()
            .unwrap_or(0))
    }
}
