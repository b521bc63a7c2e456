//! Ancestor chain walker
//!
//! This module walks the process tree from a starting process up to the
//! root (PID 1), producing one [`ProcessRecord`] per step.
//!
//! The start identifier is resolved eagerly so that an unknown or unreadable
//! process is reported before anything is emitted. Every later lookup is
//! best effort: an ancestor that cannot be resolved (typically because it
//! exited between observing its pid and reading it) simply ends the walk.

use crate::config::{InspectorConfig, DEFAULT_MAX_STEPS};
use crate::core::models::{AncestryReport, Pid, ProcessRecord, Termination, ROOT_PID};
use crate::core::source::ProcessSource;
use crate::error::{AncestryError, AncestryResult};
use crate::platform;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

#[derive(Error, Debug)]
pub enum ProcessTreeError {
    #[error("Process not found: {0}")]
    ProcessNotFound(Pid),
    #[error("Permission denied accessing process: {0}")]
    PermissionDenied(Pid),
    #[error("Failed to read metadata for process {pid}: {reason}")]
    MetadataUnavailable { pid: Pid, reason: String },
    #[error("Unsupported platform")]
    UnsupportedPlatform,
}

impl ProcessTreeError {
    pub fn metadata(pid: Pid, reason: impl Into<String>) -> Self {
        ProcessTreeError::MetadataUnavailable {
            pid,
            reason: reason.into(),
        }
    }
}

#[derive(Debug)]
enum WalkState {
    /// Resolved, waiting to be emitted
    Ready(ProcessRecord),
    /// Emitted; the parent is looked up on the next call
    Emitted { pid: Pid, parent_pid: Option<Pid> },
    Done(Termination),
}

/// Lazy iterator over the ancestors of a process, starting with the process
/// itself.
///
/// Each parent is resolved only when the next record is requested, so
/// dropping the iterator abandons the walk with nothing to unwind.
#[derive(Debug)]
pub struct AncestorWalk<S> {
    source: S,
    start_pid: Pid,
    max_steps: usize,
    steps: usize,
    state: Option<WalkState>,
}

impl<S: ProcessSource> AncestorWalk<S> {
    pub fn start_pid(&self) -> Pid {
        self.start_pid
    }

    /// Number of records emitted so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, Some(WalkState::Done(_)))
    }

    /// Why the walk stopped, once it has.
    pub fn termination(&self) -> Option<&Termination> {
        match &self.state {
            Some(WalkState::Done(termination)) => Some(termination),
            _ => None,
        }
    }

    /// Drain the remaining walk into a report.
    pub fn into_report(mut self) -> AncestryReport {
        let records: Vec<ProcessRecord> = self.by_ref().collect();
        let termination = self
            .termination()
            .cloned()
            .unwrap_or(Termination::NoParent);
        AncestryReport::new(self.start_pid, records, termination)
    }

    fn advance(&self, pid: Pid, parent_pid: Option<Pid>) -> WalkState {
        if pid == ROOT_PID {
            return WalkState::Done(Termination::RootReached);
        }

        let Some(parent_pid) = parent_pid else {
            return WalkState::Done(Termination::NoParent);
        };

        if self.steps >= self.max_steps {
            return WalkState::Done(Termination::StepLimit {
                limit: self.max_steps,
            });
        }

        match self.source.resolve(parent_pid) {
            Ok(parent) => WalkState::Ready(parent),
            Err(err) => WalkState::Done(Termination::ResolutionFailure {
                pid: parent_pid,
                reason: err.to_string(),
            }),
        }
    }

    fn log_termination(&self, termination: &Termination) {
        match termination {
            Termination::StepLimit { limit } => {
                warn!(start_pid = self.start_pid, limit, "Ancestor walk hit step limit")
            }
            other => debug!(start_pid = self.start_pid, "Ancestor walk finished: {}", other),
        }
    }
}

impl<S: ProcessSource> Iterator for AncestorWalk<S> {
    type Item = ProcessRecord;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.state.take()? {
                WalkState::Ready(record) => {
                    self.steps += 1;
                    trace!(step = self.steps, "{}", record.line());
                    self.state = Some(WalkState::Emitted {
                        pid: record.pid,
                        parent_pid: record.parent_pid,
                    });
                    return Some(record);
                }
                WalkState::Emitted { pid, parent_pid } => {
                    let next = self.advance(pid, parent_pid);
                    if let WalkState::Done(termination) = &next {
                        self.log_termination(termination);
                    }
                    self.state = Some(next);
                }
                done @ WalkState::Done(_) => {
                    self.state = Some(done);
                    return None;
                }
            }
        }
    }
}

/// Walk the ancestors of `start` using the default step bound.
pub fn walk<S: ProcessSource>(source: S, start: Pid) -> AncestryResult<AncestorWalk<S>> {
    walk_with_limit(source, start, DEFAULT_MAX_STEPS)
}

/// Walk the ancestors of `start`, emitting at most `max_steps` records.
///
/// Fails only when `start` itself cannot be resolved.
pub fn walk_with_limit<S: ProcessSource>(
    source: S,
    start: Pid,
    max_steps: usize,
) -> AncestryResult<AncestorWalk<S>> {
    let first = source
        .resolve(start)
        .map_err(|err| AncestryError::from_start_lookup(start, err))?;

    let state = if max_steps == 0 {
        WalkState::Done(Termination::StepLimit { limit: 0 })
    } else {
        WalkState::Ready(first)
    };

    Ok(AncestorWalk {
        source,
        start_pid: start,
        max_steps,
        steps: 0,
        state: Some(state),
    })
}

/// Inspect the ancestry of a live process using the configured source.
///
/// Takes the raw identifier so that values outside the platform range
/// (e.g. the unset default of `-1`) report as invalid rather than wrap.
pub fn inspect(target: i64, config: &InspectorConfig) -> AncestryResult<AncestryReport> {
    info!("=== Inspector Starting ===");
    info!("Target PID parameter: {}", target);

    let start = Pid::try_from(target)
        .ok()
        .filter(|pid| *pid != 0)
        .ok_or(AncestryError::InvalidIdentifier { pid: target })?;

    let source = platform::live_source(config);
    let report = walk_with_limit(source, start, config.max_steps)?.into_report();

    info!("=== Inspection Complete ===");
    Ok(report)
}
