//! Inspector configuration
//!
//! Layers, lowest priority first: built-in defaults, an optional TOML file,
//! `ANCESTRY_*` environment variables. CLI flags are applied on top by the
//! binary.

use crate::error::{AncestryError, AncestryResult};
use crate::output::OutputFormat;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const APP_DIRECTORY: &str = "ancestry";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const ENV_PREFIX: &str = "ANCESTRY";

pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Unset target, matching the kernel module parameter default.
pub const DEFAULT_TARGET_PID: i64 = -1;

// Far deeper than any real process tree; only reached on a parent cycle.
pub const DEFAULT_MAX_STEPS: usize = 4096;

pub const DEFAULT_LOG_FILTER: &str = "warn,ancestry=info";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectorConfig {
    /// Process to inspect when none is given on the command line
    #[serde(default = "default_target_pid")]
    pub target_pid: i64,
    /// Upper bound on emitted records
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    /// Read `<proc_root>/<pid>/stat` instead of the live psutil backend
    #[serde(default)]
    pub proc_root: Option<PathBuf>,
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub log_level: Option<String>,
}

fn default_target_pid() -> i64 {
    DEFAULT_TARGET_PID
}

fn default_max_steps() -> usize {
    DEFAULT_MAX_STEPS
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            target_pid: DEFAULT_TARGET_PID,
            max_steps: DEFAULT_MAX_STEPS,
            proc_root: None,
            format: OutputFormat::default(),
            log_level: None,
        }
    }
}

impl InspectorConfig {
    /// Load the layered configuration.
    ///
    /// An explicit `path` must exist; the per-user default file is optional.
    pub fn load(path: Option<&Path>) -> AncestryResult<Self> {
        let mut builder = Config::builder()
            .set_default("target_pid", DEFAULT_TARGET_PID)?
            .set_default("max_steps", DEFAULT_MAX_STEPS as i64)?
            .set_default("format", OutputFormat::default().as_str())?;

        match path {
            Some(path) => {
                builder = builder.add_source(File::from(path.to_path_buf()).required(true));
            }
            None => {
                if let Some(default_path) = default_config_path() {
                    builder = builder.add_source(File::from(default_path).required(false));
                }
            }
        }

        let config: InspectorConfig = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AncestryResult<()> {
        if self.max_steps == 0 {
            return Err(AncestryError::validation(
                "max_steps",
                "max_steps must be at least 1",
            ));
        }
        if let Some(root) = &self.proc_root {
            if root.as_os_str().is_empty() {
                return Err(AncestryError::validation(
                    "proc_root",
                    "proc_root cannot be an empty path",
                ));
            }
        }
        Ok(())
    }
}

/// `<config dir>/ancestry/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIRECTORY).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    struct EnvGuard {
        key: String,
        original: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let original = std::env::var(key).ok();
            std::env::set_var(key, value);
            Self {
                key: key.to_string(),
                original,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.original {
                Some(val) => std::env::set_var(&self.key, val),
                None => std::env::remove_var(&self.key),
            }
        }
    }

    fn write_config(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        fs::write(&path, body).expect("write config");
        path
    }

    #[test]
    #[serial]
    fn file_values_override_defaults() {
        let dir = TempDir::new().expect("temp dir");
        let path = write_config(
            &dir,
            "target_pid = 120\nmax_steps = 8\nformat = \"json\"\nproc_root = \"/host/proc\"\n",
        );

        let config = InspectorConfig::load(Some(&path)).expect("config should load");
        assert_eq!(config.target_pid, 120);
        assert_eq!(config.max_steps, 8);
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.proc_root, Some(PathBuf::from("/host/proc")));
        assert_eq!(config.log_level, None);
    }

    #[test]
    #[serial]
    fn environment_overrides_file() {
        let dir = TempDir::new().expect("temp dir");
        let path = write_config(&dir, "max_steps = 8\n");
        let _guard = EnvGuard::set("ANCESTRY_MAX_STEPS", "16");

        let config = InspectorConfig::load(Some(&path)).expect("config should load");
        assert_eq!(config.max_steps, 16);
        assert_eq!(config.target_pid, DEFAULT_TARGET_PID);
    }

    #[test]
    #[serial]
    fn explicit_missing_file_is_an_error() {
        let dir = TempDir::new().expect("temp dir");
        let err = InspectorConfig::load(Some(&dir.path().join("missing.toml")))
            .expect_err("missing explicit config should fail");
        assert!(matches!(err, AncestryError::Config { .. }));
    }

    #[test]
    #[serial]
    fn zero_step_bound_is_rejected() {
        let dir = TempDir::new().expect("temp dir");
        let path = write_config(&dir, "max_steps = 0\n");
        let err = InspectorConfig::load(Some(&path)).expect_err("zero bound should fail");
        assert!(matches!(err, AncestryError::Validation { .. }));
    }

    #[test]
    fn defaults_mirror_module_parameter() {
        let config = InspectorConfig::default();
        assert_eq!(config.target_pid, -1);
        assert_eq!(config.max_steps, DEFAULT_MAX_STEPS);
        assert!(config.validate().is_ok());
    }
}
