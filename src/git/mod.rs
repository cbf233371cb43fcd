// Git Module
// Source acquisition and repository credentials

pub mod auth;
pub mod workspace;

pub use auth::{AuthStore, RepoAuth};
pub use workspace::{branch_from_ref, embed_token, repo_slug_from_url, Workspace};
