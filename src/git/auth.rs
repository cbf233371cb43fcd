// Repo Auth Store
// File-backed bearer-credential lookup, one JSON record per repository

use crate::error::EngineResult;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A stored credential for one repository.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepoAuth {
    pub repo_name: String,
    pub token: String,
}

/// Credential store keyed by `owner/repo`. A missing credential is not an
/// error: public repositories clone without one.
pub struct AuthStore {
    root: PathBuf,
}

impl AuthStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Look up the credential for a repository. `Ok(None)` on a miss.
    pub fn get(&self, repo_name: &str) -> EngineResult<Option<RepoAuth>> {
        let path = self.record_path(repo_name);
        if !path.exists() {
            debug!(repo = repo_name, "no stored credential");
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        let auth: RepoAuth = serde_json::from_str(&content)?;
        Ok(Some(auth))
    }

    /// Persist a credential, replacing any existing one.
    pub fn store(&self, repo_name: &str, token: &str) -> EngineResult<()> {
        fs::create_dir_all(&self.root)?;
        let auth = RepoAuth {
            repo_name: repo_name.to_string(),
            token: token.to_string(),
        };
        let path = self.record_path(repo_name);
        fs::write(&path, serde_json::to_string_pretty(&auth)?)?;
        info!(repo = repo_name, path = %path.display(), "stored credential");
        Ok(())
    }

    fn record_path(&self, repo_name: &str) -> PathBuf {
        let file_id = repo_name.replace('/', "_");
        self.root.join(format!("{}.json", file_id))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
