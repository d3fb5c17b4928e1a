//! `helm template` invocation

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{EngineError, Result};

/// The helm command line
#[derive(Debug, Clone)]
pub struct Helm {
    program: PathBuf,
}

impl Default for Helm {
    fn default() -> Self {
        Self::new("helm")
    }
}

impl Helm {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run `helm template <args...> <chart>` and return its stdout
    ///
    /// A non-zero exit fails with the captured stderr. On success stderr
    /// (deprecation notices and the like) only goes to the debug log.
    pub fn template(&self, chart: &Path, args: &[String]) -> Result<String> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("template").args(args).arg(chart);

        tracing::debug!(
            "Running: {} template {} {}",
            self.program.display(),
            args.join(" "),
            chart.display()
        );

        let output = cmd
            .stdin(Stdio::null())
            .output()
            .map_err(|source| EngineError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(EngineError::TemplateFailed {
                code: output.status.code(),
                stderr: stderr.trim_end().to_string(),
            });
        }
        if !stderr.trim().is_empty() {
            tracing::debug!("helm stderr: {}", stderr.trim_end());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
