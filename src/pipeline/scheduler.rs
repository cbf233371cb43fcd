// Job Scheduler
// Dependency-aware concurrent execution of a pipeline's job graph

use crate::error::{EngineError, EngineResult};
use crate::pipeline::dependency::JobGraph;
use crate::pipeline::models::{
    Job, JobResult, JobStatus, Pipeline, StepResult, StepStatus,
};
use crate::runners::shell::ShellRunner;

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tracing::{info, warn};

/// Executes every job in a pipeline exactly once, honoring `needs`
/// ordering and running independent jobs concurrently.
///
/// Jobs are admitted once all of their dependencies have succeeded; a job
/// whose dependency failed (or was itself skipped) is recorded as
/// `Skipped` without running. Completions are drained through a single
/// channel, so the result map has exactly one writer.
pub struct JobScheduler {
    max_parallel: usize,
    step_timeout: Option<Duration>,
}

impl JobScheduler {
    pub fn new(max_parallel: usize, step_timeout: Option<Duration>) -> Self {
        Self {
            max_parallel: max_parallel.max(1),
            step_timeout,
        }
    }

    /// Run the whole graph to completion. Validation failures reject the
    /// definition before any step executes.
    pub async fn execute(
        &self,
        pipeline: &Pipeline,
        working_dir: &Path,
    ) -> EngineResult<HashMap<String, JobResult>> {
        let graph = JobGraph::build(pipeline)?;

        let total = pipeline.jobs.len();
        let mut results: HashMap<String, JobResult> = HashMap::with_capacity(total);
        if total == 0 {
            return Ok(results);
        }

        let (tx, mut rx) = mpsc::unbounded_channel::<JobResult>();
        let limiter = Arc::new(Semaphore::new(self.max_parallel));
        let mut remaining: HashMap<String, usize> = pipeline
            .jobs
            .keys()
            .map(|name| (name.clone(), graph.dependency_count(name)))
            .collect();

        for name in graph.roots() {
            self.spawn_job(&name, pipeline, working_dir, tx.clone(), limiter.clone());
        }

        while results.len() < total {
            let completed = rx.recv().await.ok_or_else(|| {
                EngineError::JobPanicked("job result channel closed early".to_string())
            })?;

            // Skips cascade synchronously, so drain through a worklist
            let mut terminal = VecDeque::new();
            terminal.push_back(completed);

            while let Some(result) = terminal.pop_front() {
                let name = result.name.clone();
                results.insert(name.clone(), result);

                for dependent in graph.dependents_of(&name) {
                    let waiting = match remaining.get_mut(dependent) {
                        Some(count) => {
                            *count -= 1;
                            *count
                        }
                        None => continue,
                    };
                    if waiting > 0 {
                        continue;
                    }

                    let deps_succeeded = pipeline.jobs[dependent].needs.iter().all(|dep| {
                        results
                            .get(dep)
                            .map(|r| r.status == JobStatus::Success)
                            .unwrap_or(false)
                    });

                    if deps_succeeded {
                        self.spawn_job(
                            dependent,
                            pipeline,
                            working_dir,
                            tx.clone(),
                            limiter.clone(),
                        );
                    } else {
                        info!(job = %dependent, "skipping job, dependency did not succeed");
                        terminal.push_back(JobResult::skipped(dependent.clone()));
                    }
                }
            }
        }

        Ok(results)
    }

    fn spawn_job(
        &self,
        name: &str,
        pipeline: &Pipeline,
        working_dir: &Path,
        tx: mpsc::UnboundedSender<JobResult>,
        limiter: Arc<Semaphore>,
    ) {
        let name = name.to_string();
        let job = pipeline.jobs[&name].clone();
        let working_dir = working_dir.to_path_buf();
        let runner = ShellRunner::with_timeout(self.step_timeout);

        tokio::spawn(async move {
            let _permit = match limiter.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            };
            let result = run_job(name, &job, &working_dir, &runner).await;
            let _ = tx.send(result);
        });
    }
}

/// The per-job state machine: Pending -> Running -> {Succeeded, Failed}.
///
/// Steps run strictly in definition order. The first failure terminates
/// the job; the failing step's result is recorded, later steps never run.
async fn run_job(
    name: String,
    job: &Job,
    working_dir: &Path,
    runner: &ShellRunner,
) -> JobResult {
    info!(job = %name, steps = job.steps.len(), "job started");

    let mut steps = Vec::new();
    let mut status = JobStatus::Success;

    for step in &job.steps {
        match runner.run_step(step, working_dir).await {
            Ok(result) => steps.push(result),
            Err(err) => {
                warn!(job = %name, step = %step.name, error = %err, "step failed");
                let logs = match &err {
                    EngineError::StepFailed { logs, .. } => logs.clone(),
                    other => other.to_string(),
                };
                steps.push(StepResult {
                    name: step.name.clone(),
                    status: StepStatus::Failure,
                    logs,
                });
                status = JobStatus::Failure;
                break;
            }
        }
    }

    info!(job = %name, status = ?status, "job finished");
    JobResult { name, status, steps }
}
