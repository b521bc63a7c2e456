//! Command-line parsing
//!
//! Uses clap to define the interface.

use crate::config::InspectorConfig;
use crate::output::OutputFormat;
use clap::{Args, Parser, Subcommand};
use std::ffi::OsString;
use std::path::PathBuf;

/// Options shared by every subcommand
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalOpts {
    /// Configuration file (default: <config dir>/ancestry/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "warn,ancestry=trace" (default: RUST_LOG)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Also append logs to this file
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

/// Options for the walk command
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkArgs {
    /// Process to start from (default: configured target_pid)
    #[arg(value_name = "PID", allow_negative_numbers = true)]
    pub pid: Option<i32>,

    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Stop after emitting this many records
    #[arg(long, value_name = "N")]
    pub max_steps: Option<usize>,

    /// Read process metadata from this procfs mount instead of the live system
    #[arg(long, value_name = "DIR")]
    pub proc_root: Option<PathBuf>,
}

impl WalkArgs {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut InspectorConfig) {
        if let Some(pid) = self.pid {
            config.target_pid = i64::from(pid);
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(max_steps) = self.max_steps {
            config.max_steps = max_steps;
        }
        if let Some(root) = &self.proc_root {
            config.proc_root = Some(root.clone());
        }
    }
}

/// ancestry - walk a process's parent chain up to init
#[derive(Parser, Debug, Clone)]
#[command(
    name = "ancestry",
    about = "Walk a process's ancestor chain up to the root process",
    version,
    disable_help_subcommand = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Print the ancestor chain of a process (default command)
    Walk(WalkArgs),

    /// Print the effective configuration as JSON
    Config,

    /// Print version information
    Version,
}

impl Cli {
    /// Parse the process arguments
    pub fn parse_args() -> Cli {
        match Self::try_parse_args_from(std::env::args_os()) {
            Ok(cli) => cli,
            Err(err) => err.exit(),
        }
    }

    /// Try to parse arguments (for tests or a custom argv)
    pub fn try_parse_args_from<I, T>(iter: I) -> Result<Cli, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Cli::try_parse_from(iter)
    }

    /// The subcommand to run; a bare invocation walks the configured target.
    pub fn command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Walk(WalkArgs::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Cli {
        let argv = std::iter::once("ancestry").chain(args.iter().copied());
        Cli::try_parse_args_from(argv).expect("expected command parsing to succeed")
    }

    #[test]
    fn bare_invocation_walks_configured_target() {
        let cli = parse(&[]);
        assert_eq!(cli.command(), Commands::Walk(WalkArgs::default()));
    }

    #[test]
    fn walk_accepts_pid_and_flags() {
        let cli = parse(&[
            "walk",
            "120",
            "--format",
            "json",
            "--max-steps",
            "10",
            "--proc-root",
            "/host/proc",
            "--log-level",
            "debug",
        ]);
        let Commands::Walk(args) = cli.command() else {
            panic!("expected walk command");
        };
        assert_eq!(args.pid, Some(120));
        assert_eq!(args.format, Some(OutputFormat::Json));
        assert_eq!(args.max_steps, Some(10));
        assert_eq!(args.proc_root, Some(PathBuf::from("/host/proc")));
        assert_eq!(cli.global.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn negative_pid_is_accepted_by_the_parser() {
        let Commands::Walk(args) = parse(&["walk", "-1"]).command() else {
            panic!("expected walk command");
        };
        assert_eq!(args.pid, Some(-1));
    }

    #[test]
    fn pid_outside_platform_range_is_a_usage_error() {
        let argv = ["ancestry", "walk", "99999999999"];
        assert!(Cli::try_parse_args_from(argv).is_err());
    }

    #[test]
    fn overrides_apply_on_top_of_config() {
        let mut config = InspectorConfig::default();
        let args = WalkArgs {
            pid: Some(42),
            format: None,
            max_steps: Some(3),
            proc_root: None,
        };
        args.apply(&mut config);
        assert_eq!(config.target_pid, 42);
        assert_eq!(config.max_steps, 3);
        assert_eq!(config.format, OutputFormat::Text);
        assert_eq!(config.proc_root, None);
    }
}
