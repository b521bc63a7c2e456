//! Report rendering

use crate::core::models::AncestryReport;
use crate::error::{AncestryError, AncestryResult};
use serde::{Deserialize, Serialize};
use std::io::Write;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One `PID: <pid> | Name: <name> | State: <state>` line per process
    #[default]
    Text,
    /// The whole report as a JSON document
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        }
    }
}

/// Write `report` to `out` in the requested format.
pub fn render<W: Write>(
    report: &AncestryReport,
    format: OutputFormat,
    out: &mut W,
) -> AncestryResult<()> {
    match format {
        OutputFormat::Text => {
            for record in &report.records {
                writeln!(out, "{}", record.line())?;
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(report).map_err(|err| {
                AncestryError::Unknown {
                    message: format!("failed to serialize report: {err}"),
                    source: Some(Box::new(err)),
                }
            })?;
            writeln!(out, "{json}")?;
        }
    }
    out.flush()?;
    Ok(())
}
