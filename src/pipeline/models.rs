use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A parsed pipeline definition: the `.ci.yaml` found in the working tree.
///
/// Immutable after parse; one run owns one definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub name: String,
    /// Trigger events this pipeline reacts to (e.g. "push").
    #[serde(default)]
    pub on: Vec<String>,
    pub jobs: HashMap<String, Job>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Names of jobs that must succeed before this one runs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub needs: Vec<String>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    /// The command line executed through the shell.
    pub run: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    Success,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Running,
    Success,
    Failure,
    /// Never ran because a dependency did not succeed.
    Skipped,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failure | JobStatus::Skipped)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Success,
    Failure,
}

/// Outcome of one executed step. Created exactly once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    pub name: String,
    pub status: StepStatus,
    /// Combined stdout + stderr of the step process.
    pub logs: String,
}

/// Outcome of one job. `steps` preserves execution order; a failing step
/// is the last entry, steps after it never produce a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    pub name: String,
    pub status: JobStatus,
    pub steps: Vec<StepResult>,
}

impl JobResult {
    pub fn skipped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: JobStatus::Skipped,
            steps: Vec::new(),
        }
    }
}

impl Pipeline {
    /// Total number of defined jobs.
    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }
}
