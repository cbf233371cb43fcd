// Engine
// Trigger entry point: acquire sources, execute the graph, persist the run

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::git::auth::AuthStore;
use crate::git::workspace::{branch_from_ref, embed_token, repo_slug_from_url, Workspace};
use crate::pipeline::parser::PipelineParser;
use crate::pipeline::scheduler::JobScheduler;
use crate::storage::run_store::{RunMeta, RunRecord, RunStore, TriggerKind};

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// The tuple a trigger source (webhook listener, CLI) hands the engine.
#[derive(Debug, Clone)]
pub struct Trigger {
    pub clone_url: String,
    /// Push ref, e.g. `refs/heads/main`.
    pub git_ref: String,
    /// Exact commit to build; HEAD of the branch when absent.
    pub commit_sha: Option<String>,
    pub repo_full_name: String,
    pub branch: String,
    pub triggered_by: String,
    pub kind: TriggerKind,
}

/// One engine instance owns one working tree, one run store and one auth
/// store. Runs are serialized: the working tree is shared mutable state,
/// so a second trigger waits until the current run finishes.
pub struct Engine {
    config: EngineConfig,
    run_store: RunStore,
    auth_store: AuthStore,
    run_lock: Mutex<()>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let run_store = RunStore::new(&config.run_store_dir);
        let auth_store = AuthStore::new(&config.auth_store_dir);
        Self {
            config,
            run_store,
            auth_store,
            run_lock: Mutex::new(()),
        }
    }

    pub fn run_store(&self) -> &RunStore {
        &self.run_store
    }

    pub fn auth_store(&self) -> &AuthStore {
        &self.auth_store
    }

    /// Execute one end-to-end run. The caller always gets either a fully
    /// populated record (possibly with failed or skipped jobs) or a
    /// single structured error from acquisition or validation.
    pub async fn run(&self, trigger: Trigger) -> EngineResult<RunRecord> {
        let _guard = self.run_lock.lock().await;
        let started_at = Utc::now();

        let branch = match branch_from_ref(&trigger.git_ref)? {
            Some(branch) => branch,
            None => {
                warn!(
                    reference = %trigger.git_ref,
                    fallback = %self.config.default_branch,
                    "could not resolve a branch from ref, using default"
                );
                self.config.default_branch.clone()
            }
        };

        let repo_name = if trigger.repo_full_name.is_empty() {
            repo_slug_from_url(&trigger.clone_url).unwrap_or_default()
        } else {
            trigger.repo_full_name.clone()
        };

        // A credential miss is not fatal: public repositories clone anyway
        let clone_url = match self.auth_store.get(&repo_name) {
            Ok(Some(auth)) => {
                info!(repo = %repo_name, "cloning with stored credential");
                embed_token(&trigger.clone_url, &auth.token)
            }
            Ok(None) => trigger.clone_url.clone(),
            Err(e) => {
                warn!(repo = %repo_name, error = %e, "credential lookup failed, cloning without");
                trigger.clone_url.clone()
            }
        };

        let workspace = Workspace::new(&self.config.working_dir);
        workspace
            .acquire(&clone_url, &branch, trigger.commit_sha.as_deref())
            .await?;

        // Read-backs are best effort; sentinel values stand in on failure
        let commit_sha = match workspace.current_commit().await {
            Ok(sha) => sha,
            Err(e) => {
                warn!(error = %e, "could not read back commit SHA");
                "unknown".to_string()
            }
        };
        let effective_branch = match workspace.current_branch().await {
            Ok(head) if head != "HEAD" => head,
            _ => branch.clone(),
        };
        let (commit_author, commit_message) = if commit_sha != "unknown" {
            match workspace.commit_details(&commit_sha).await {
                Ok(details) => details,
                Err(e) => {
                    warn!(error = %e, "could not read back commit details");
                    ("unknown".to_string(), "unknown".to_string())
                }
            }
        } else {
            ("unknown".to_string(), "unknown".to_string())
        };

        let definition_path = workspace.path().join(&self.config.definition_file);
        let pipeline = PipelineParser::from_file(&definition_path)?;
        info!(
            pipeline = %pipeline.name,
            jobs = pipeline.job_count(),
            commit = %commit_sha,
            "executing pipeline"
        );

        let scheduler =
            JobScheduler::new(self.config.max_parallel_jobs, self.config.step_timeout);
        let results = scheduler.execute(&pipeline, workspace.path()).await?;

        let meta = RunMeta {
            repo_name,
            branch: effective_branch,
            commit_sha,
            commit_message,
            commit_author,
            triggered_by: trigger.triggered_by,
            trigger: trigger.kind,
            started_at,
        };
        let record = self.run_store.store_run(pipeline, results, meta)?;
        info!(run = %record.id, status = ?record.status, "run finished");
        Ok(record)
    }

    /// Manual trigger: derive the clone URL from the repository name and
    /// build the branch HEAD (or a specific commit when given).
    pub async fn run_manual(
        &self,
        repo_full_name: &str,
        branch: Option<&str>,
        commit_sha: Option<&str>,
    ) -> EngineResult<RunRecord> {
        let branch = branch.unwrap_or(&self.config.default_branch);
        let trigger = Trigger {
            clone_url: format!("https://github.com/{}.git", repo_full_name),
            git_ref: format!("refs/heads/{}", branch),
            commit_sha: commit_sha.map(str::to_string),
            repo_full_name: repo_full_name.to_string(),
            branch: branch.to_string(),
            triggered_by: "cli".to_string(),
            kind: TriggerKind::Manual,
        };
        self.run(trigger).await
    }
}
