//! Platform-specific process metadata
//!
//! Platform strategy:
//! - Unix: psutil for live process information
//! - Any platform: a configured procfs mount is read directly

#[cfg(unix)]
mod unix;

#[cfg(unix)]
pub use unix::{process_alive, PsutilSource};

use crate::config::InspectorConfig;
use crate::core::models::{Pid, ProcessRecord};
use crate::core::process_tree::ProcessTreeError;
use crate::core::source::{ProcessSource, ProcfsSource};

/// Source used where no live backend exists
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedSource;

impl ProcessSource for UnsupportedSource {
    fn resolve(&self, _pid: Pid) -> Result<ProcessRecord, ProcessTreeError> {
        Err(ProcessTreeError::UnsupportedPlatform)
    }
}

/// Pick the metadata source for live inspection.
pub fn live_source(config: &InspectorConfig) -> Box<dyn ProcessSource + Send + Sync> {
    if let Some(root) = &config.proc_root {
        tracing::debug!(proc_root = %root.display(), "Reading process metadata from procfs");
        return Box::new(ProcfsSource::new(root.clone()));
    }

    #[cfg(unix)]
    {
        Box::new(PsutilSource::new())
    }

    #[cfg(not(unix))]
    {
        Box::new(UnsupportedSource)
    }
}
