//! Fixed stage sequences for each workflow.
//!
//! Every workflow shares the [`Pipeline`] state machine; they differ only in
//! their stage list, which stage feeds the extractor, and how the run log is
//! titled and named.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use tracing::info;

use crate::core::branch::BranchPolicy;
use crate::core::extract::{PULL_REQUEST_URL, SPEC_FILE};
use crate::core::run_log::RunLog;
use crate::core::types::{ArtifactKey, BranchCategory};
use crate::io::assistant::Assistant;
use crate::io::config::AdwConfig;
use crate::io::git::Git;
use crate::io::github::{PullRequest, create_pull_request};
use crate::io::log_store::LogStore;
use crate::io::process::StepRunner;
use crate::io::specs::{display_relative, find_related_spec};
use crate::io::templates::{PrBodyInputs, Templates};
use crate::pipeline::{
    Handoff, Pipeline, PipelineContext, PipelineEvent, PipelineReport, Prepared, Stage,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowKind {
    Bug,
    Chore,
    Feature,
    Build,
    Commit,
    PullRequest,
}

impl WorkflowKind {
    pub fn log_title(self) -> &'static str {
        match self {
            WorkflowKind::Bug => "Bug Fix Log",
            WorkflowKind::Chore => "Chore Log",
            WorkflowKind::Feature => "Feature Plan Log",
            WorkflowKind::Build => "Feature Build Log",
            WorkflowKind::Commit => "Commit Log",
            WorkflowKind::PullRequest => "Pull Request Log",
        }
    }

    /// Label of the operator input in the log header and summary.
    pub fn subject_label(self) -> &'static str {
        match self {
            WorkflowKind::Bug => "Bug Description",
            WorkflowKind::Chore => "Chore Description",
            WorkflowKind::Feature | WorkflowKind::Build => "Feature Description",
            WorkflowKind::Commit => "Commit Message",
            WorkflowKind::PullRequest => "Pull Request Title",
        }
    }

    /// Log file prefix, as in `<prefix>_log_<timestamp>.md`.
    pub fn file_prefix(self) -> &'static str {
        match self {
            WorkflowKind::Bug => "bug",
            WorkflowKind::Chore => "chore",
            WorkflowKind::Feature => "feature",
            WorkflowKind::Build => "build",
            WorkflowKind::Commit => "commit",
            WorkflowKind::PullRequest => "pr",
        }
    }
}

/// A workflow ready to run: its kind, operator input and stage list.
pub struct Workflow<'a> {
    kind: WorkflowKind,
    subject: String,
    stages: Vec<Stage<'a>>,
}

impl Workflow<'_> {
    pub fn kind(&self) -> WorkflowKind {
        self.kind
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn headings(&self) -> Vec<&str> {
        self.stages.iter().map(Stage::heading).collect()
    }
}

/// Builds workflows for one working copy and configuration.
pub struct Workflows<'c> {
    config: &'c AdwConfig,
    workdir: PathBuf,
    assistant: Assistant,
    git: Git,
    templates: Templates,
}

impl<'c> Workflows<'c> {
    pub fn new(config: &'c AdwConfig, workdir: impl Into<PathBuf>) -> Self {
        let workdir = workdir.into();
        Self {
            config,
            assistant: Assistant::new(config.assistant.command.clone(), &workdir),
            git: Git::new(&workdir),
            templates: Templates::new(),
            workdir,
        }
    }

    pub fn log_dir(&self) -> PathBuf {
        self.workdir.join(&self.config.log_dir)
    }

    /// create-branch(bug) -> bug plan and fix.
    pub fn bug(&self, description: &str) -> Workflow<'_> {
        Workflow {
            kind: WorkflowKind::Bug,
            subject: description.to_string(),
            stages: vec![
                Stage::new(
                    "Git Branch Creation",
                    self.assistant.create_branch(BranchCategory::Bug, description),
                ),
                Stage::new("Bug Planning and Fix", self.assistant.bug(description)),
            ],
        }
    }

    pub fn chore(&self, description: &str) -> Workflow<'_> {
        Workflow {
            kind: WorkflowKind::Chore,
            subject: description.to_string(),
            stages: vec![Stage::new("Chore Execution", self.assistant.chore(description))],
        }
    }

    /// Planning only. The spec path is recorded when the output names one.
    pub fn feature(&self, description: &str) -> Workflow<'_> {
        Workflow {
            kind: WorkflowKind::Feature,
            subject: description.to_string(),
            stages: vec![
                Stage::new("Feature Planning", self.assistant.plan_feature(description))
                    .with_handoff(Handoff::Extract {
                        patterns: &SPEC_FILE,
                        required: false,
                    }),
            ],
        }
    }

    /// create-branch(feature) -> plan -> implement the extracted spec.
    pub fn build_feature(&self, description: &str) -> Workflow<'_> {
        Workflow {
            kind: WorkflowKind::Build,
            subject: description.to_string(),
            stages: vec![
                Stage::new(
                    "Git Branch Creation",
                    self.assistant
                        .create_branch(BranchCategory::Feature, description),
                ),
                Stage::new("Feature Planning", self.assistant.plan_feature(description))
                    .with_handoff(Handoff::Extract {
                        patterns: &SPEC_FILE,
                        required: true,
                    }),
                Stage::deferred("Feature Implementation", move |ctx: &PipelineContext| {
                    Ok(self.assistant.implement(ctx.require(ArtifactKey::SpecFile)?))
                }),
            ],
        }
    }

    /// Guarded branch -> status -> add -> commit -> push with upstream.
    pub fn commit(&self, message: &str) -> Workflow<'_> {
        let message = message.to_string();
        let attribution = &self.config.attribution;
        Workflow {
            kind: WorkflowKind::Commit,
            subject: message.clone(),
            stages: vec![
                Stage::new("Current Branch", self.git.current_branch())
                    .with_handoff(Handoff::CurrentBranch),
                Stage::new("Git Status", self.git.status()),
                Stage::new("Stage Changes", self.git.add_all()),
                Stage::deferred("Commit", move |_: &PipelineContext| {
                    let full = self
                        .templates
                        .render_commit_message(
                            &message,
                            &attribution.footer,
                            &attribution.co_author,
                        )
                        .context("render commit message")?;
                    Ok(self.git.commit(&full))
                }),
                Stage::deferred("Push", move |ctx: &PipelineContext| {
                    let branch = ctx.require(ArtifactKey::Branch)?;
                    Ok(self.git.push_upstream(&self.config.remote, branch))
                }),
            ],
        }
    }

    /// Guarded branch -> commits since trunk -> `gh pr create`.
    ///
    /// Without an explicit `title` the branch's derived title is used.
    pub fn pull_request(&self, title: Option<&str>, draft: bool) -> Workflow<'_> {
        let title = title.map(str::trim).filter(|t| !t.is_empty()).map(String::from);
        let subject = title
            .clone()
            .unwrap_or_else(|| "(derived from branch name)".to_string());
        Workflow {
            kind: WorkflowKind::PullRequest,
            subject,
            stages: vec![
                Stage::new("Current Branch", self.git.current_branch())
                    .with_handoff(Handoff::CurrentBranch),
                Stage::new(
                    "Commit History",
                    self.git.commit_subjects_since(&self.config.trunk_branch),
                )
                .with_handoff(Handoff::Capture(ArtifactKey::Commits)),
                Stage::prepared("Pull Request Creation", move |ctx: &PipelineContext| {
                    let branch = ctx
                        .branch()
                        .context("current branch was not recorded")?;
                    let specs_dir = self.workdir.join(&self.config.specs_dir);
                    let spec = find_related_spec(&specs_dir, &branch.raw_name)?
                        .map(|path| display_relative(&path, &self.workdir));
                    let body = self
                        .templates
                        .render_pr_body(&PrBodyInputs {
                            category: Some(branch.category),
                            commits: ctx.get(ArtifactKey::Commits),
                            spec: spec.as_deref(),
                            footer: &self.config.attribution.footer,
                        })
                        .context("render pull request body")?;
                    let pr = PullRequest {
                        title: title.unwrap_or_else(|| branch.derived_title.clone()),
                        body,
                        draft,
                    };
                    Ok(Prepared::new(create_pull_request(&self.workdir, &pr))
                        .note(ArtifactKey::PullRequestTitle, &pr.title))
                })
                .with_handoff(Handoff::Extract {
                    patterns: &PULL_REQUEST_URL,
                    required: false,
                }),
            ],
        }
    }

    /// Run `workflow` to a terminal state, persisting its log either way.
    pub fn run<R, F>(
        &self,
        runner: &R,
        workflow: Workflow<'_>,
        started_at: NaiveDateTime,
        on_event: F,
    ) -> Result<PipelineReport>
    where
        R: StepRunner,
        F: FnMut(PipelineEvent<'_>),
    {
        let Workflow {
            kind,
            subject,
            stages,
        } = workflow;
        info!(workflow = ?kind, stages = stages.len(), "starting workflow");

        let log = RunLog::new(kind.log_title(), kind.subject_label(), subject, started_at);
        let store = LogStore::new(self.log_dir(), kind.file_prefix());
        let policy = BranchPolicy::new(&self.config.trunk_branch);
        Pipeline::new(runner, policy, store, log).run(stages, on_event)
    }
}
