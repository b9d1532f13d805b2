//! Shared deterministic types for the workflow core.
//!
//! These types define stable contracts between the pipeline and its
//! collaborators. They hold no handles to processes or files.

use std::fmt;
use std::path::PathBuf;

/// One external command invocation.
///
/// Immutable once built; the pipeline constructs it right before running it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Operator-facing description (e.g. "Creating feature branch...").
    pub description: String,
    /// Program followed by its literal arguments. Never interpreted by a shell.
    pub command: Vec<String>,
    /// Directory the process runs in.
    pub workdir: PathBuf,
}

impl Step {
    pub fn new(
        description: impl Into<String>,
        command: Vec<String>,
        workdir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            description: description.into(),
            command,
            workdir: workdir.into(),
        }
    }

    /// Executable name (first argv token), or `""` for an empty command.
    pub fn program(&self) -> &str {
        self.command.first().map(String::as_str).unwrap_or_default()
    }

    /// Arguments after the program.
    pub fn args(&self) -> &[String] {
        self.command.get(1..).unwrap_or_default()
    }
}

/// How an external process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// Process ran and exited with this code.
    Exited(i32),
    /// Process ran but ended without an exit code (killed by a signal).
    Terminated,
    /// Executable could not be located or started.
    NotLaunched,
}

/// Captured result of running one [`Step`]. Produced once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    /// Merged stdout/stderr text, or a launch-failure message.
    pub output: String,
    pub status: StepStatus,
}

impl StepResult {
    pub fn exited(code: i32, output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            status: StepStatus::Exited(code),
        }
    }

    pub fn not_launched(message: impl Into<String>) -> Self {
        Self {
            output: message.into(),
            status: StepStatus::NotLaunched,
        }
    }

    /// True iff the process exited with code 0.
    pub fn succeeded(&self) -> bool {
        self.status == StepStatus::Exited(0)
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self.status {
            StepStatus::Exited(code) => Some(code),
            StepStatus::Terminated | StepStatus::NotLaunched => None,
        }
    }
}

/// Values one stage hands to a later stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArtifactKey {
    /// Spec file written by the planning stage.
    SpecFile,
    /// Current branch name, queried at the start of commit/PR flows.
    Branch,
    /// Commit subjects since divergence from trunk.
    Commits,
    /// Title submitted with a pull request.
    PullRequestTitle,
    /// URL of a created pull request.
    PullRequestUrl,
}

impl ArtifactKey {
    /// Human label used in the run log.
    pub fn label(self) -> &'static str {
        match self {
            ArtifactKey::SpecFile => "Spec File",
            ArtifactKey::Branch => "Branch",
            ArtifactKey::Commits => "Commits",
            ArtifactKey::PullRequestTitle => "Title",
            ArtifactKey::PullRequestUrl => "Pull Request",
        }
    }

    /// Key used by the structured `ADW_RESULT:` trailer.
    pub fn trailer_key(self) -> &'static str {
        match self {
            ArtifactKey::SpecFile => "spec_file",
            ArtifactKey::Branch => "branch",
            ArtifactKey::Commits => "commits",
            ArtifactKey::PullRequestTitle => "pr_title",
            ArtifactKey::PullRequestUrl => "pr_url",
        }
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Branch category derived from the `<category>/<slug>` naming convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchCategory {
    Feature,
    Chore,
    Bug,
    Other,
}

impl BranchCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            BranchCategory::Feature => "feature",
            BranchCategory::Chore => "chore",
            BranchCategory::Bug => "bug",
            BranchCategory::Other => "other",
        }
    }

    /// Prefix (including `/`) for recognised categories.
    pub fn prefix(self) -> Option<&'static str> {
        match self {
            BranchCategory::Feature => Some("feature/"),
            BranchCategory::Chore => Some("chore/"),
            BranchCategory::Bug => Some("bug/"),
            BranchCategory::Other => None,
        }
    }
}

impl fmt::Display for BranchCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current branch as seen at the start of a commit/PR flow. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchDescriptor {
    pub raw_name: String,
    pub category: BranchCategory,
    pub derived_title: String,
}
