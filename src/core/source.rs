//! Process metadata sources
//!
//! The walker never touches the OS directly; it resolves identifiers
//! through a [`ProcessSource`]. Live lookups go through psutil (see
//! [`crate::platform`]) or through [`ProcfsSource`] when a specific procfs
//! mount is configured. [`ProcessTable`] holds an in-memory snapshot.

use crate::core::models::{Pid, ProcessRecord, ProcessState};
use crate::core::process_tree::ProcessTreeError;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Resolves a process identifier to a point-in-time [`ProcessRecord`].
#[cfg_attr(test, mockall::automock)]
pub trait ProcessSource {
    fn resolve(&self, pid: Pid) -> Result<ProcessRecord, ProcessTreeError>;
}

impl<S: ProcessSource + ?Sized> ProcessSource for &S {
    fn resolve(&self, pid: Pid) -> Result<ProcessRecord, ProcessTreeError> {
        (**self).resolve(pid)
    }
}

impl<S: ProcessSource + ?Sized> ProcessSource for Box<S> {
    fn resolve(&self, pid: Pid) -> Result<ProcessRecord, ProcessTreeError> {
        (**self).resolve(pid)
    }
}

/// In-memory process table keyed by pid
#[derive(Debug, Clone, Default)]
pub struct ProcessTable {
    processes: HashMap<Pid, ProcessRecord>,
}

impl ProcessTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a process, returning the previous entry.
    pub fn insert(&mut self, record: ProcessRecord) -> Option<ProcessRecord> {
        self.processes.insert(record.pid, record)
    }

    pub fn remove(&mut self, pid: Pid) -> Option<ProcessRecord> {
        self.processes.remove(&pid)
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }
}

impl FromIterator<ProcessRecord> for ProcessTable {
    fn from_iter<I: IntoIterator<Item = ProcessRecord>>(iter: I) -> Self {
        let mut table = ProcessTable::new();
        for record in iter {
            table.insert(record);
        }
        table
    }
}

impl ProcessSource for ProcessTable {
    fn resolve(&self, pid: Pid) -> Result<ProcessRecord, ProcessTreeError> {
        self.processes
            .get(&pid)
            .cloned()
            .ok_or(ProcessTreeError::ProcessNotFound(pid))
    }
}

/// Reads `<root>/<pid>/stat` from a procfs mount
#[derive(Debug, Clone)]
pub struct ProcfsSource {
    root: PathBuf,
}

impl ProcfsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for ProcfsSource {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_PROC_ROOT)
    }
}

impl ProcessSource for ProcfsSource {
    fn resolve(&self, pid: Pid) -> Result<ProcessRecord, ProcessTreeError> {
        let dir = self.root.join(pid.to_string());
        let raw = match fs::read(dir.join("stat")) {
            Ok(raw) => raw,
            Err(err) => return Err(classify_read_error(pid, &dir, err)),
        };
        // comm is raw bytes; any process may set a non UTF-8 name
        parse_stat(pid, &String::from_utf8_lossy(&raw))
    }
}

fn classify_read_error(pid: Pid, dir: &Path, err: io::Error) -> ProcessTreeError {
    match err.kind() {
        io::ErrorKind::PermissionDenied => ProcessTreeError::PermissionDenied(pid),
        io::ErrorKind::NotFound if !dir.exists() => ProcessTreeError::ProcessNotFound(pid),
        _ => ProcessTreeError::metadata(pid, format!("cannot read stat: {err}")),
    }
}

/// Parse the contents of `/proc/<pid>/stat`.
///
/// The command name sits between the first `(` and the last `)`, since it
/// may itself contain spaces and parentheses.
pub fn parse_stat(pid: Pid, raw: &str) -> Result<ProcessRecord, ProcessTreeError> {
    let open = raw
        .find('(')
        .ok_or_else(|| ProcessTreeError::metadata(pid, "stat has no command name"))?;
    let close = raw
        .rfind(')')
        .filter(|close| *close > open)
        .ok_or_else(|| ProcessTreeError::metadata(pid, "stat command name is unterminated"))?;

    let stat_pid: Pid = raw[..open]
        .trim()
        .parse()
        .map_err(|_| ProcessTreeError::metadata(pid, "stat pid field is not numeric"))?;
    if stat_pid != pid {
        return Err(ProcessTreeError::metadata(
            pid,
            format!("stat belongs to pid {stat_pid}"),
        ));
    }

    let name = &raw[open + 1..close];
    let mut fields = raw[close + 1..].split_whitespace();

    let state = fields
        .next()
        .and_then(|field| field.chars().next())
        .map(ProcessState::from_code)
        .ok_or_else(|| ProcessTreeError::metadata(pid, "stat is missing the state field"))?;
    let ppid: Pid = fields
        .next()
        .ok_or_else(|| ProcessTreeError::metadata(pid, "stat is missing the ppid field"))?
        .parse()
        .map_err(|_| ProcessTreeError::metadata(pid, "stat ppid field is not numeric"))?;

    Ok(ProcessRecord::new(pid, name, state).with_parent(Some(ppid)))
}
