//! CLI command handling
//!
//! Parsing lives in [`parser`]; this module runs the parsed commands.

pub mod parser;

pub use parser::*;

use crate::config::InspectorConfig;
use crate::core::process_tree::inspect;
use crate::error::{AncestryError, AncestryResult};
use crate::output::render;
use std::io::Write;

/// Run `walk`: inspect the target and write the chain to `out`.
pub fn run_walk<W: Write>(
    args: &WalkArgs,
    config: &InspectorConfig,
    out: &mut W,
) -> AncestryResult<()> {
    let mut config = config.clone();
    args.apply(&mut config);
    config.validate()?;

    let report = inspect(config.target_pid, &config)?;
    render(&report, config.format, out)
}

/// Run `config`: dump the effective configuration.
pub fn run_config<W: Write>(config: &InspectorConfig, out: &mut W) -> AncestryResult<()> {
    let json = serde_json::to_string_pretty(config).map_err(|err| {
        AncestryError::Config {
            message: format!("failed to serialize configuration: {err}"),
            source: Some(Box::new(err)),
        }
    })?;
    writeln!(out, "{json}")?;
    Ok(())
}
