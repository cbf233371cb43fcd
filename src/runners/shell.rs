// Shell Runner
// Executes one pipeline step as a single external process

use crate::error::{EngineError, EngineResult};
use crate::pipeline::models::{Step, StepResult, StepStatus};

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Runs a step's command line through the shell with the working tree as
/// its current directory. The environment is inherited unchanged.
///
/// Strict result-or-error discipline: success produces a `StepResult`,
/// any failure produces only an error. The job driver turns a failure
/// error into the failing `StepResult` it records.
pub struct ShellRunner {
    timeout: Option<Duration>,
}

impl ShellRunner {
    pub fn new() -> Self {
        Self { timeout: None }
    }

    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    pub async fn run_step(&self, step: &Step, working_dir: &Path) -> EngineResult<StepResult> {
        debug!(step = %step.name, run = %step.run, "running step");

        let child = Command::new("sh")
            .arg("-c")
            .arg(&step.run)
            .current_dir(working_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EngineError::StepFailed {
                step: step.name.clone(),
                stderr: e.to_string(),
                logs: String::new(),
            })?;

        let output = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, child.wait_with_output())
                .await
                .map_err(|_| {
                    warn!(step = %step.name, "step timed out");
                    EngineError::StepTimeout {
                        step: step.name.clone(),
                        secs: timeout.as_secs(),
                    }
                })??,
            None => child.wait_with_output().await?,
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        // One log blob per step: stdout first, then stderr
        let logs = format!("{}{}", stdout, stderr);

        if !output.status.success() {
            return Err(EngineError::StepFailed {
                step: step.name.clone(),
                stderr: stderr.trim().to_string(),
                logs,
            });
        }

        Ok(StepResult {
            name: step.name.clone(),
            status: StepStatus::Success,
            logs,
        })
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new()
    }
}
