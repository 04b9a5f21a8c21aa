//! GitHub Actions step summary and step outputs.
use log::*;
#[cfg(test)]
use mockall::automock;
use std::{env, fs::OpenOptions, io::Write, path::PathBuf};

use crate::{error::ActionError, result::Result};

/// Set to `true` by the Actions runner.
pub const ACTIONS_ENV_VAR: &str = "GITHUB_ACTIONS";
/// Markdown file appended to the job summary.
pub const SUMMARY_ENV_VAR: &str = "GITHUB_STEP_SUMMARY";
/// File collecting `key=value` step outputs.
pub const OUTPUT_ENV_VAR: &str = "GITHUB_OUTPUT";

/// Destination for human readable status and machine readable outputs.
#[cfg_attr(test, automock)]
pub trait Reporter: Send + Sync {
    fn append_summary(&self, message: &str) -> Result<()>;
    fn set_output(&self, key: &str, value: &str) -> Result<()>;
}

/// [`Reporter`] writing to the files provided by the Actions runner.
/// Outside of Actions every call is a no-op.
#[derive(Debug, Clone, Default)]
pub struct GithubActions {
    enabled: bool,
    summary_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
}

impl GithubActions {
    pub fn new(
        enabled: bool,
        summary_path: Option<PathBuf>,
        output_path: Option<PathBuf>,
    ) -> Self {
        Self {
            enabled,
            summary_path,
            output_path,
        }
    }

    pub fn from_env() -> Self {
        let enabled = env::var(ACTIONS_ENV_VAR).is_ok_and(|v| v == "true");
        let path_var = |name: &str| {
            env::var(name)
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };

        Self::new(
            enabled,
            path_var(SUMMARY_ENV_VAR),
            path_var(OUTPUT_ENV_VAR),
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn append_line(&self, path: &Option<PathBuf>, line: &str) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let Some(path) = path else {
            return Ok(());
        };

        let mut file =
            OpenOptions::new().append(true).open(path).map_err(|e| {
                ActionError::local_io(format!(
                    "failed opening file {}: {e}",
                    path.display()
                ))
            })?;

        writeln!(file, "{line}").map_err(|e| {
            ActionError::local_io(format!(
                "failed writing to file {}: {e}",
                path.display()
            ))
        })?;

        Ok(())
    }
}

impl Reporter for GithubActions {
    fn append_summary(&self, message: &str) -> Result<()> {
        self.append_line(&self.summary_path, message.trim_end())
    }

    fn set_output(&self, key: &str, value: &str) -> Result<()> {
        debug!("setting output {key}={value}");
        self.append_line(&self.output_path, &format!("{key}={value}"))
    }
}
