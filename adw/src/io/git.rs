//! Git step builders.
//!
//! Workflows never shell out to git directly; they build [`Step`]s here and
//! hand them to the pipeline, so every invocation is captured in the run log
//! and can be scripted in tests.

use std::path::PathBuf;

use crate::core::types::Step;

/// Builds git steps for one working copy.
#[derive(Debug, Clone)]
pub struct Git {
    workdir: PathBuf,
}

impl Git {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// Print the current branch (empty on detached HEAD).
    pub fn current_branch(&self) -> Step {
        self.step("Getting current branch...", &["branch", "--show-current"])
    }

    pub fn status(&self) -> Step {
        self.step("Running git status...", &["status"])
    }

    /// Stage everything under the working directory.
    pub fn add_all(&self) -> Step {
        self.step("Running git add ...", &["add", "."])
    }

    /// Commit with `message` passed verbatim as a single argument.
    pub fn commit(&self, message: &str) -> Step {
        let subject = message.lines().next().unwrap_or_default();
        self.step(
            &format!("Committing with message: {subject}"),
            &["commit", "-m", message],
        )
    }

    /// Push `branch` and set its upstream.
    pub fn push_upstream(&self, remote: &str, branch: &str) -> Step {
        self.step(
            &format!("Pushing to {remote}/{branch}..."),
            &["push", "-u", remote, branch],
        )
    }

    /// One `- <subject>` line per commit reachable from HEAD but not `trunk`.
    pub fn commit_subjects_since(&self, trunk: &str) -> Step {
        let range = format!("{trunk}..HEAD");
        self.step(
            "Getting commits for PR description...",
            &["log", &range, "--pretty=format:- %s"],
        )
    }

    fn step(&self, description: &str, args: &[&str]) -> Step {
        let mut command = Vec::with_capacity(args.len() + 1);
        command.push("git".to_string());
        command.extend(args.iter().map(|arg| arg.to_string()));
        Step::new(description, command, &self.workdir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_keeps_multiline_message_as_one_argument() {
        let git = Git::new("/repo");
        let message = "Add annotator\n\nFooter with \"quotes\" and $(subshell)";
        let step = git.commit(message);

        assert_eq!(step.command, vec!["git", "commit", "-m", message]);
        assert_eq!(step.description, "Committing with message: Add annotator");
        assert_eq!(step.workdir, PathBuf::from("/repo"));
    }

    #[test]
    fn push_sets_upstream_for_branch() {
        let step = Git::new("/repo").push_upstream("origin", "feature/x");
        assert_eq!(step.command, vec!["git", "push", "-u", "origin", "feature/x"]);
    }

    #[test]
    fn commit_subjects_use_trunk_range() {
        let step = Git::new("/repo").commit_subjects_since("master");
        assert_eq!(
            step.command,
            vec!["git", "log", "master..HEAD", "--pretty=format:- %s"]
        );
    }
}
