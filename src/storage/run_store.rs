// Run Store
// Assigns run identity, aggregates status, persists and serves run records

use crate::error::{EngineError, EngineResult};
use crate::pipeline::models::{JobResult, JobStatus, Pipeline, RunStatus};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, warn};

/// How a run came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerKind {
    Webhook,
    Manual,
}

/// Trigger metadata attached to a run record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMeta {
    pub repo_name: String,
    pub branch: String,
    pub commit_sha: String,
    pub commit_message: String,
    pub commit_author: String,
    pub triggered_by: String,
    pub trigger: TriggerKind,
    pub started_at: DateTime<Utc>,
}

/// One durable record per run. Written once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: String,
    /// The definition snapshot this run executed.
    pub pipeline: Pipeline,
    pub results: HashMap<String, JobResult>,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub repo_name: String,
    pub branch: String,
    pub commit_sha: String,
    pub commit_message: String,
    pub commit_author: String,
    pub triggered_by: String,
    pub trigger: TriggerKind,
}

// Same-second retriggers get distinct ids from this counter.
static RUN_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Identifier-keyed persistence of run records, one JSON file per run.
pub struct RunStore {
    root: PathBuf,
}

impl RunStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Wall-clock run id (`YYYYMMDDHHMMSS`) with a monotonic suffix, so
    /// ids stay unique within a second and lexicographically sortable.
    pub fn next_run_id() -> String {
        let stamp = Utc::now().format("%Y%m%d%H%M%S");
        let seq = RUN_COUNTER.fetch_add(1, Ordering::Relaxed) % 10_000;
        format!("{}-{:04}", stamp, seq)
    }

    /// Persist a finished run. The record is written whole: serialized to
    /// a temp file in the store directory, then renamed into place, so
    /// concurrent readers never observe a partial record.
    pub fn store_run(
        &self,
        pipeline: Pipeline,
        results: HashMap<String, JobResult>,
        meta: RunMeta,
    ) -> EngineResult<RunRecord> {
        fs::create_dir_all(&self.root)?;

        let record = RunRecord {
            id: Self::next_run_id(),
            status: overall_status(&results),
            pipeline,
            results,
            started_at: meta.started_at,
            finished_at: Utc::now(),
            repo_name: meta.repo_name,
            branch: meta.branch,
            commit_sha: meta.commit_sha,
            commit_message: meta.commit_message,
            commit_author: meta.commit_author,
            triggered_by: meta.triggered_by,
            trigger: meta.trigger,
        };

        let path = self.record_path(&record.id);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(&record)?)?;
        fs::rename(&tmp, &path)?;

        info!(run = %record.id, path = %path.display(), "stored run record");
        Ok(record)
    }

    pub fn get_run(&self, id: &str) -> EngineResult<RunRecord> {
        let path = self.record_path(id);
        if !path.exists() {
            return Err(EngineError::RunNotFound { id: id.to_string() });
        }
        let content = fs::read_to_string(&path)?;
        let record: RunRecord = serde_json::from_str(&content)?;
        Ok(record)
    }

    /// Up to `limit` records, newest start time first. An empty store
    /// yields an empty list, not an error.
    pub fn list_recent_runs(&self, limit: usize) -> EngineResult<Vec<RunRecord>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut runs = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            let id = match name.strip_prefix("run_").and_then(|n| n.strip_suffix(".json")) {
                Some(id) => id.to_string(),
                None => continue,
            };
            match self.get_run(&id) {
                Ok(record) => runs.push(record),
                Err(e) => warn!(run = %id, error = %e, "skipping unreadable run record"),
            }
        }

        runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        runs.truncate(limit);
        Ok(runs)
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("run_{}.json", id))
    }
}

fn overall_status(results: &HashMap<String, JobResult>) -> RunStatus {
    let all_succeeded = results
        .values()
        .all(|result| result.status == JobStatus::Success);
    if all_succeeded {
        RunStatus::Success
    } else {
        RunStatus::Failure
    }
}
