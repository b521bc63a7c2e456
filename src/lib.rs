//! Ancestry library
//!
//! Walks a process's ancestor chain up to the root process, one
//! point-in-time record per ancestor.

pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod output;
pub mod platform;
pub mod utils;

// Re-export commonly used types for convenience
pub use crate::config::InspectorConfig;
pub use crate::core::models::*;
pub use crate::core::process_tree::{inspect, walk, walk_with_limit, AncestorWalk, ProcessTreeError};
pub use crate::core::source::{parse_stat, ProcessSource, ProcessTable, ProcfsSource};
pub use crate::error::{AncestryError, AncestryResult, ErrorCategory};
pub use crate::output::OutputFormat;
