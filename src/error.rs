//! Unified error handling for the ancestry inspector
//!
//! Lookup failures from a metadata source are reported as
//! [`ProcessTreeError`](crate::core::process_tree::ProcessTreeError) and
//! only surface here when they prevent the walk from producing its first
//! record.

use crate::core::process_tree::ProcessTreeError;
use anyhow::Error as AnyhowError;
use std::io;
use thiserror::Error;

/// Exit status for generic failures (config, I/O, logger setup).
pub const EXIT_FAILURE: u8 = 1;

#[cfg(unix)]
const EXIT_NO_SUCH_PROCESS: u8 = libc::ESRCH as u8;
#[cfg(not(unix))]
const EXIT_NO_SUCH_PROCESS: u8 = 3;

#[cfg(unix)]
const EXIT_INVALID_ARGUMENT: u8 = libc::EINVAL as u8;
#[cfg(not(unix))]
const EXIT_INVALID_ARGUMENT: u8 = 22;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum AncestryError {
    /// The start identifier does not name any live process
    #[error("Invalid process identifier: {pid}")]
    InvalidIdentifier { pid: i64 },

    /// The start process exists but its metadata could not be read
    #[error("No process metadata for PID {pid}: {source}")]
    MetadataUnavailable {
        pid: u32,
        #[source]
        source: ProcessTreeError,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Validation errors
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// Filesystem errors
    #[error("Filesystem error: {message} (path: {path})")]
    Filesystem {
        message: String,
        path: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Unknown errors
    #[error("Unknown error: {message}")]
    Unknown {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl AncestryError {
    /// Map a failed lookup of the start identifier onto the crate error.
    pub fn from_start_lookup(pid: u32, err: ProcessTreeError) -> Self {
        match err {
            ProcessTreeError::ProcessNotFound(_) => AncestryError::InvalidIdentifier {
                pid: i64::from(pid),
            },
            other => AncestryError::MetadataUnavailable { pid, source: other },
        }
    }

    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AncestryError::Validation {
            message: message.into(),
            field: Some(field.to_string()),
        }
    }

    /// Get error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            AncestryError::InvalidIdentifier { .. } => ErrorCategory::Lookup,
            AncestryError::MetadataUnavailable { .. } => ErrorCategory::Lookup,
            AncestryError::Config { .. } => ErrorCategory::Config,
            AncestryError::Validation { .. } => ErrorCategory::Validation,
            AncestryError::Filesystem { .. } => ErrorCategory::Filesystem,
            AncestryError::Unknown { .. } => ErrorCategory::Unknown,
        }
    }

    /// Process exit status for this error.
    ///
    /// Lookup failures exit with their errno value (EINVAL, ESRCH).
    pub fn exit_code(&self) -> u8 {
        match self {
            AncestryError::InvalidIdentifier { .. } => EXIT_INVALID_ARGUMENT,
            AncestryError::MetadataUnavailable { .. } => EXIT_NO_SUCH_PROCESS,
            _ => EXIT_FAILURE,
        }
    }

    /// Get user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AncestryError::InvalidIdentifier { pid } => {
                format!("ERROR: no process found for PID {}", pid)
            }
            AncestryError::MetadataUnavailable { pid, source } => {
                format!("ERROR: no process metadata for PID {} ({})", pid, source)
            }
            AncestryError::Config { message, .. } => {
                format!("Configuration problem: {}", message)
            }
            AncestryError::Validation { message, .. } => {
                format!("Input validation failed: {}", message)
            }
            AncestryError::Filesystem { message, .. } => {
                format!("File system problem: {}", message)
            }
            AncestryError::Unknown { message, .. } => {
                format!("Unexpected error: {}", message)
            }
        }
    }
}

impl From<AnyhowError> for AncestryError {
    fn from(err: AnyhowError) -> Self {
        AncestryError::Unknown {
            message: err.to_string(),
            source: None,
        }
    }
}

impl From<io::Error> for AncestryError {
    fn from(err: io::Error) -> Self {
        AncestryError::Filesystem {
            message: format!("I/O error: {err}"),
            path: "<io>".to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<config::ConfigError> for AncestryError {
    fn from(err: config::ConfigError) -> Self {
        AncestryError::Config {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

/// Error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Lookup,
    Config,
    Validation,
    Filesystem,
    Unknown,
}

impl ErrorCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            ErrorCategory::Lookup => "Lookup",
            ErrorCategory::Config => "Configuration",
            ErrorCategory::Validation => "Validation",
            ErrorCategory::Filesystem => "Filesystem",
            ErrorCategory::Unknown => "Unknown",
        }
    }
}

/// Result type alias for convenience
pub type AncestryResult<T> = Result<T, AncestryError>;
