// Engine Errors
// Every failure the engine surfaces to a trigger caller

use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while acquiring sources, validating a pipeline,
/// executing steps, or persisting runs.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("unsupported ref kind (tags are not built): {reference}")]
    UnsupportedRefKind { reference: String },

    #[error("git clone failed: {stderr}")]
    CloneFailed { stderr: String },

    #[error("git checkout of '{reference}' failed: {stderr}")]
    CheckoutFailed { reference: String, stderr: String },

    #[error("git query failed: {context}")]
    GitQuery { context: String },

    #[error("invalid pipeline definition: {0}")]
    InvalidDefinition(#[from] serde_yaml::Error),

    #[error("job '{job}' depends on unknown job '{dependency}'")]
    UnknownDependency { job: String, dependency: String },

    #[error("dependency cycle between jobs: {}", participants.join(" -> "))]
    DependencyCycle { participants: Vec<String> },

    #[error("step '{step}' failed: {stderr}")]
    StepFailed {
        step: String,
        stderr: String,
        logs: String,
    },

    #[error("step '{step}' timed out after {secs}s")]
    StepTimeout { step: String, secs: u64 },

    #[error("run '{id}' not found")]
    RunNotFound { id: String },

    #[error("scheduler lost contact with a job task: {0}")]
    JobPanicked(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
