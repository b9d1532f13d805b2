//! GitHub CLI (`gh`) step builders.

use std::path::PathBuf;

use crate::core::types::Step;

/// Fields of a pull request to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub title: String,
    pub body: String,
    pub draft: bool,
}

/// `gh pr create` with title and body as literal arguments.
pub fn create_pull_request(workdir: impl Into<PathBuf>, pr: &PullRequest) -> Step {
    let mut command = vec![
        "gh".to_string(),
        "pr".to_string(),
        "create".to_string(),
        "--title".to_string(),
        pr.title.clone(),
        "--body".to_string(),
        pr.body.clone(),
    ];
    if pr.draft {
        command.push("--draft".to_string());
    }
    Step::new("Creating pull request with gh CLI...", command, workdir)
}
