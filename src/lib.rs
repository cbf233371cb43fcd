// tinyci
// A lightweight self-hosted CI engine: clone a repository at a revision,
// run the jobs its pipeline definition declares, record the result.

pub mod config;
pub mod engine;
pub mod error;
pub mod git;
pub mod pipeline;
pub mod runners;
pub mod storage;

// Re-export commonly used types
pub use config::EngineConfig;
pub use engine::{Engine, Trigger};
pub use error::{EngineError, EngineResult};

// Re-export pipeline types
pub use pipeline::{
    Job, JobGraph, JobResult, JobScheduler, JobStatus, Pipeline, PipelineParser, RunStatus,
    Step, StepResult, StepStatus,
};

// Re-export acquisition and storage types
pub use git::{AuthStore, RepoAuth, Workspace};
pub use storage::{RunMeta, RunRecord, RunStore, TriggerKind};
