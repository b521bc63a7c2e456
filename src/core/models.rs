//! Data model shared by the walker, the metadata sources and the CLI

use crate::error::{AncestryError, AncestryResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Process identifier as reported by the OS.
pub type Pid = u32;

/// The designated root of the process tree.
pub const ROOT_PID: Pid = 1;

/// Longest command name the kernel keeps (`TASK_COMM_LEN - 1`).
pub const MAX_NAME_LEN: usize = 15;

/// Scheduling state of a process at observation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    Running,
    Sleeping,
    DiskSleep,
    Stopped,
    TracingStop,
    Zombie,
    Dead,
    WakeKill,
    Waking,
    Parked,
    Idle,
    Unknown,
}

impl ProcessState {
    /// Parse the single-letter state code from `/proc/<pid>/stat`.
    pub fn from_code(code: char) -> Self {
        match code {
            'R' => ProcessState::Running,
            'S' => ProcessState::Sleeping,
            'D' => ProcessState::DiskSleep,
            'T' => ProcessState::Stopped,
            't' => ProcessState::TracingStop,
            'Z' => ProcessState::Zombie,
            'X' | 'x' => ProcessState::Dead,
            'K' => ProcessState::WakeKill,
            'W' => ProcessState::Waking,
            'P' => ProcessState::Parked,
            'I' => ProcessState::Idle,
            _ => ProcessState::Unknown,
        }
    }

    pub fn code(&self) -> char {
        match self {
            ProcessState::Running => 'R',
            ProcessState::Sleeping => 'S',
            ProcessState::DiskSleep => 'D',
            ProcessState::Stopped => 'T',
            ProcessState::TracingStop => 't',
            ProcessState::Zombie => 'Z',
            ProcessState::Dead => 'X',
            ProcessState::WakeKill => 'K',
            ProcessState::Waking => 'W',
            ProcessState::Parked => 'P',
            ProcessState::Idle => 'I',
            ProcessState::Unknown => '?',
        }
    }

    /// The kernel's `task_struct::__state` bitmask for this state.
    ///
    /// Idle is `TASK_UNINTERRUPTIBLE | TASK_NOLOAD`. Zombie and dead tasks
    /// both sit in `TASK_DEAD`; `EXIT_ZOMBIE`/`EXIT_DEAD` live in
    /// `exit_state`. Unknown maps to -1.
    pub fn kernel_value(&self) -> i64 {
        match self {
            ProcessState::Running => 0x0000,
            ProcessState::Sleeping => 0x0001,
            ProcessState::DiskSleep => 0x0002,
            ProcessState::Stopped => 0x0004,
            ProcessState::TracingStop => 0x0008,
            ProcessState::Dead | ProcessState::Zombie => 0x0080,
            ProcessState::Parked => 0x0040,
            ProcessState::WakeKill => 0x0100,
            ProcessState::Waking => 0x0200,
            ProcessState::Idle => 0x0402,
            ProcessState::Unknown => -1,
        }
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kernel_value())
    }
}

/// One observed process at a point in time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcessRecord {
    pub pid: Pid,
    pub name: String,
    pub state: ProcessState,
    /// `None` when the OS reports no parent (ppid 0)
    #[serde(default, deserialize_with = "deserialize_parent_pid")]
    pub parent_pid: Option<Pid>,
    pub observed_at: DateTime<Utc>,
}

impl ProcessRecord {
    pub fn new(pid: Pid, name: impl Into<String>, state: ProcessState) -> Self {
        Self {
            pid,
            name: truncate_name(name.into()),
            state,
            parent_pid: None,
            observed_at: Utc::now(),
        }
    }

    /// Attach the parent identifier; zero means "no parent".
    pub fn with_parent(mut self, parent_pid: Option<Pid>) -> Self {
        self.parent_pid = parent_pid.filter(|ppid| *ppid != 0);
        self
    }

    pub fn is_root(&self) -> bool {
        self.pid == ROOT_PID
    }

    /// Render the record as the inspector's log line.
    pub fn line(&self) -> String {
        format!("PID: {} | Name: {} | State: {}", self.pid, self.name, self.state)
    }
}

impl fmt::Display for ProcessRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line())
    }
}

fn deserialize_parent_pid<'de, D>(deserializer: D) -> Result<Option<Pid>, D::Error>
where
    D: Deserializer<'de>,
{
    let parent = Option::<Pid>::deserialize(deserializer)?;
    Ok(parent.filter(|ppid| *ppid != 0))
}

fn truncate_name(mut name: String) -> String {
    if name.len() > MAX_NAME_LEN {
        let mut cut = MAX_NAME_LEN;
        while !name.is_char_boundary(cut) {
            cut -= 1;
        }
        name.truncate(cut);
    }
    name
}

/// Why a walk stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Termination {
    /// Emitted the record for the root process
    RootReached,
    /// The last record carried no parent identifier
    NoParent,
    /// The parent identifier could not be resolved (it may have exited)
    ResolutionFailure { pid: Pid, reason: String },
    /// The step bound was exhausted before reaching the root
    StepLimit { limit: usize },
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::RootReached => f.write_str("reached root process"),
            Termination::NoParent => f.write_str("no parent process"),
            Termination::ResolutionFailure { pid, reason } => {
                write!(f, "parent {} could not be resolved: {}", pid, reason)
            }
            Termination::StepLimit { limit } => write!(f, "step limit {} exhausted", limit),
        }
    }
}

/// A completed walk: the ancestor chain plus the reason it ended
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AncestryReport {
    pub start_pid: Pid,
    /// Chain: [start, parent, grandparent, ..., last resolved ancestor]
    pub records: Vec<ProcessRecord>,
    #[serde(default)]
    pub depth: usize,
    #[serde(default)]
    pub root_pid: Option<Pid>,
    pub termination: Termination,
}

impl AncestryReport {
    pub fn new(start_pid: Pid, records: Vec<ProcessRecord>, termination: Termination) -> Self {
        let depth = records.len();
        let root_pid = records.last().map(|record| record.pid);
        Self {
            start_pid,
            records,
            depth,
            root_pid,
            termination,
        }
    }

    pub fn pids(&self) -> Vec<Pid> {
        self.records.iter().map(|record| record.pid).collect()
    }

    pub fn contains_process(&self, pid: Pid) -> bool {
        self.records.iter().any(|record| record.pid == pid)
    }

    pub fn reached_root(&self) -> bool {
        self.termination == Termination::RootReached
    }

    /// Check data integrity
    pub fn validate(&self) -> AncestryResult<()> {
        let first = self.records.first().ok_or_else(|| {
            AncestryError::validation("report.records", "ancestor chain cannot be empty")
        })?;

        if first.pid != self.start_pid {
            return Err(AncestryError::validation(
                "report.records",
                format!(
                    "chain starts at {} but start_pid is {}",
                    first.pid, self.start_pid
                ),
            ));
        }

        if self.depth != self.records.len() {
            return Err(AncestryError::validation(
                "report.depth",
                format!(
                    "depth ({}) must equal record count ({})",
                    self.depth,
                    self.records.len()
                ),
            ));
        }

        let mut seen = HashSet::new();
        for record in &self.records {
            if !seen.insert(record.pid) {
                return Err(AncestryError::validation(
                    "report.records",
                    format!("duplicate pid {} detected", record.pid),
                ));
            }
        }

        Ok(())
    }
}
