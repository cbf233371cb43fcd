pub mod dependency;
pub mod models;
pub mod parser;
pub mod scheduler;

pub use dependency::JobGraph;
pub use models::{
    Job, JobResult, JobStatus, Pipeline, RunStatus, Step, StepResult, StepStatus,
};
pub use parser::PipelineParser;
pub use scheduler::JobScheduler;
