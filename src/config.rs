// Engine Configuration
// Paths and limits for one engine instance

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the CI engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory the repository under test is cloned into.
    /// One engine owns this path exclusively; runs against it are serialized.
    pub working_dir: PathBuf,

    /// Directory run records are persisted under.
    pub run_store_dir: PathBuf,

    /// Directory per-repository credentials are stored under.
    pub auth_store_dir: PathBuf,

    /// Branch used when a ref cannot be resolved to one.
    pub default_branch: String,

    /// File name of the pipeline definition inside the working tree.
    pub definition_file: String,

    /// Maximum number of jobs executing at once.
    pub max_parallel_jobs: usize,

    /// Per-step timeout (None = a hung step hangs the run).
    pub step_timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            working_dir: PathBuf::from("temp_repo"),
            run_store_dir: PathBuf::from("run_metadata"),
            auth_store_dir: PathBuf::from("auth_data"),
            default_branch: "main".to_string(),
            definition_file: ".ci.yaml".to_string(),
            max_parallel_jobs: 4,
            step_timeout: None,
        }
    }
}

impl EngineConfig {
    /// Root all paths under the given directory, keeping the default names.
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            working_dir: root.join("temp_repo"),
            run_store_dir: root.join("run_metadata"),
            auth_store_dir: root.join("auth_data"),
            ..Self::default()
        }
    }

    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = Some(timeout);
        self
    }

    pub fn with_max_parallel_jobs(mut self, max: usize) -> Self {
        self.max_parallel_jobs = max.max(1);
        self
    }
}
