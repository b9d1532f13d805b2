//! Abort-on-first-failure execution of a fixed stage sequence.
//!
//! A run moves `Start -> Stage 1 -> ... -> Stage n -> Done`. Any stage can
//! send it to the absorbing `Aborted` state: the step exited non-zero, the
//! tool could not be launched, a required artifact was missing from its
//! output, or the branch guard refused the current branch. Either terminal
//! state flushes the run log exactly once.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, instrument};

use crate::core::branch::BranchPolicy;
use crate::core::errors::PipelineError;
use crate::core::extract::PatternSet;
use crate::core::run_log::RunLog;
use crate::core::types::{ArtifactKey, BranchDescriptor, Step, StepResult, StepStatus};
use crate::io::log_store::LogStore;
use crate::io::process::StepRunner;

/// Builds a stage's step from what earlier stages produced.
pub type StepBuilder<'a> = Box<dyn FnOnce(&PipelineContext) -> Result<Prepared> + 'a>;

/// A step ready to run, plus values decided while building it.
///
/// Notes are recorded in the run log before the step runs, so they survive
/// a failing step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prepared {
    step: Step,
    notes: Vec<(ArtifactKey, String)>,
}

impl Prepared {
    pub fn new(step: Step) -> Self {
        Self {
            step,
            notes: Vec::new(),
        }
    }

    pub fn note(mut self, key: ArtifactKey, value: impl Into<String>) -> Self {
        self.notes.push((key, value.into()));
        self
    }
}

impl From<Step> for Prepared {
    fn from(step: Step) -> Self {
        Self::new(step)
    }
}

/// What a successful stage hands to later stages.
#[derive(Debug, Clone, Copy)]
pub enum Handoff {
    /// Nothing; the output is only logged.
    None,
    /// Pull a value out of the output with a prioritised pattern set.
    ///
    /// When `required`, no match aborts the run with `ArtifactNotFound`.
    Extract {
        patterns: &'static PatternSet,
        required: bool,
    },
    /// Output is the current branch name; it must pass the branch guard.
    CurrentBranch,
    /// Keep the trimmed output (if any) under `key`.
    Capture(ArtifactKey),
}

/// One entry of a fixed step sequence.
pub struct Stage<'a> {
    heading: String,
    build: StepBuilder<'a>,
    handoff: Handoff,
}

impl<'a> Stage<'a> {
    /// Stage whose step is fully known up front.
    pub fn new(heading: impl Into<String>, step: Step) -> Self {
        Self {
            heading: heading.into(),
            build: Box::new(move |_| Ok(Prepared::new(step))),
            handoff: Handoff::None,
        }
    }

    /// Stage whose step depends on earlier output (e.g. an extracted path).
    pub fn deferred(
        heading: impl Into<String>,
        build: impl FnOnce(&PipelineContext) -> Result<Step> + 'a,
    ) -> Self {
        Self::prepared(heading, move |ctx: &PipelineContext| build(ctx).map(Prepared::from))
    }

    /// Like [`Stage::deferred`], with notes for the run log.
    pub fn prepared(
        heading: impl Into<String>,
        build: impl FnOnce(&PipelineContext) -> Result<Prepared> + 'a,
    ) -> Self {
        Self {
            heading: heading.into(),
            build: Box::new(build),
            handoff: Handoff::None,
        }
    }

    pub fn with_handoff(mut self, handoff: Handoff) -> Self {
        self.handoff = handoff;
        self
    }

    pub fn heading(&self) -> &str {
        &self.heading
    }
}

/// Values threaded between stages of one run. Discarded when the run ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineContext {
    artifacts: BTreeMap<ArtifactKey, String>,
    branch: Option<BranchDescriptor>,
}

impl PipelineContext {
    pub fn get(&self, key: ArtifactKey) -> Option<&str> {
        self.artifacts.get(&key).map(String::as_str)
    }

    /// Value an earlier stage must have produced.
    pub fn require(&self, key: ArtifactKey) -> Result<&str> {
        self.get(key)
            .ok_or_else(|| anyhow!("{key} was not produced by an earlier stage"))
    }

    pub fn branch(&self) -> Option<&BranchDescriptor> {
        self.branch.as_ref()
    }

    pub fn artifacts(&self) -> impl Iterator<Item = (ArtifactKey, &str)> {
        self.artifacts.iter().map(|(key, value)| (*key, value.as_str()))
    }

    fn insert(&mut self, key: ArtifactKey, value: String) {
        self.artifacts.insert(key, value);
    }
}

/// Progress notifications for the caller. The pipeline itself prints nothing.
#[derive(Debug, Clone, Copy)]
pub enum PipelineEvent<'e> {
    StageStarted {
        number: usize,
        total: usize,
        heading: &'e str,
        step: &'e Step,
    },
    StageFinished {
        number: usize,
        heading: &'e str,
        result: &'e StepResult,
    },
    ArtifactFound {
        key: ArtifactKey,
        value: &'e str,
    },
    LogSaved {
        path: &'e Path,
    },
}

/// Outcome of a run that reached `Done`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub context: PipelineContext,
    pub log_path: PathBuf,
    pub steps_run: usize,
}

/// Drives one run. Owns its context and log exclusively until it ends.
pub struct Pipeline<'r, R: StepRunner> {
    runner: &'r R,
    policy: BranchPolicy,
    store: LogStore,
    log: RunLog,
    context: PipelineContext,
}

impl<'r, R: StepRunner> Pipeline<'r, R> {
    pub fn new(runner: &'r R, policy: BranchPolicy, store: LogStore, log: RunLog) -> Self {
        Self {
            runner,
            policy,
            store,
            log,
            context: PipelineContext::default(),
        }
    }

    /// Run `stages` in order, stopping at the first failure.
    ///
    /// On abort the returned error wraps a [`PipelineError`] (or the error of
    /// a step builder); the partial log is persisted before returning either way.
    #[instrument(skip_all, fields(stages = stages.len()))]
    pub fn run<F>(mut self, stages: Vec<Stage<'_>>, mut on_event: F) -> Result<PipelineReport>
    where
        F: FnMut(PipelineEvent<'_>),
    {
        let total = stages.len();
        for (index, stage) in stages.into_iter().enumerate() {
            let number = index + 1;
            if let Err(err) = self.run_stage(number, total, stage, &mut on_event) {
                return Err(self.abort(err, &mut on_event));
            }
        }

        self.log.record_summary();
        let log_path = self.store.persist(&self.log).context("save run log")?;
        on_event(PipelineEvent::LogSaved { path: &log_path });
        info!(steps = total, "pipeline completed");

        Ok(PipelineReport {
            context: self.context,
            log_path,
            steps_run: total,
        })
    }

    fn run_stage<F>(
        &mut self,
        number: usize,
        total: usize,
        stage: Stage<'_>,
        on_event: &mut F,
    ) -> Result<()>
    where
        F: FnMut(PipelineEvent<'_>),
    {
        let Stage {
            heading,
            build,
            handoff,
        } = stage;

        let Prepared { step, notes } =
            build(&self.context).with_context(|| format!("prepare {heading}"))?;
        for (key, value) in notes {
            self.announce(key, value, on_event);
        }
        on_event(PipelineEvent::StageStarted {
            number,
            total,
            heading: &heading,
            step: &step,
        });

        debug!(number, heading = %heading, program = step.program(), "running stage");
        let result = self.runner.run(&step);
        self.log.record_step(&heading, &result);
        on_event(PipelineEvent::StageFinished {
            number,
            heading: &heading,
            result: &result,
        });

        match result.status {
            StepStatus::Exited(0) => {}
            StepStatus::NotLaunched => {
                return Err(PipelineError::ExternalToolMissing {
                    stage: heading,
                    message: result.output.trim().to_string(),
                }
                .into());
            }
            StepStatus::Exited(_) | StepStatus::Terminated => {
                debug!(number, heading = %heading, exit_code = ?result.exit_code(), "stage failed");
                return Err(PipelineError::StepFailed {
                    stage: heading,
                    exit_code: result.exit_code(),
                }
                .into());
            }
        }

        self.apply_handoff(&heading, handoff, &result.output, on_event)
    }

    fn apply_handoff<F>(
        &mut self,
        heading: &str,
        handoff: Handoff,
        output: &str,
        on_event: &mut F,
    ) -> Result<()>
    where
        F: FnMut(PipelineEvent<'_>),
    {
        match handoff {
            Handoff::None => {}
            Handoff::Extract { patterns, required } => {
                let key = patterns.key();
                match patterns.find(output) {
                    Some(value) => self.announce(key, value, on_event),
                    None if required => {
                        return Err(PipelineError::ArtifactNotFound {
                            stage: heading.to_string(),
                            artifact: key,
                        }
                        .into());
                    }
                    None => debug!(artifact = %key, "optional artifact not found"),
                }
            }
            Handoff::CurrentBranch => {
                let name = output.trim();
                let descriptor =
                    self.policy
                        .describe(name)
                        .map_err(|invalid| PipelineError::InvalidBranch {
                            branch: invalid.branch,
                            trunk: self.policy.trunk().to_string(),
                        })?;
                self.announce(ArtifactKey::Branch, name.to_string(), on_event);
                self.context.branch = Some(descriptor);
            }
            Handoff::Capture(key) => {
                let value = output.trim();
                if !value.is_empty() {
                    self.context.insert(key, value.to_string());
                }
            }
        }
        Ok(())
    }

    fn announce<F>(&mut self, key: ArtifactKey, value: String, on_event: &mut F)
    where
        F: FnMut(PipelineEvent<'_>),
    {
        info!(artifact = %key, value = %value, "artifact found");
        self.log.record_artifact(key, &value);
        on_event(PipelineEvent::ArtifactFound { key, value: &value });
        self.context.insert(key, value);
    }

    /// Record the failure, flush the partial log, and hand the error back.
    fn abort<F>(mut self, err: anyhow::Error, on_event: &mut F) -> anyhow::Error
    where
        F: FnMut(PipelineEvent<'_>),
    {
        let stage = err
            .downcast_ref::<PipelineError>()
            .and_then(PipelineError::stage);
        debug!(stage = ?stage, err = %format!("{err:#}"), "pipeline aborted");
        self.log.record_error(format!("{err:#}. Aborting."));
        match self.store.persist(&self.log) {
            Ok(path) => {
                on_event(PipelineEvent::LogSaved { path: &path });
                err
            }
            Err(save_err) => {
                debug!(err = %format!("{save_err:#}"), "failed to save run log after abort");
                err.context(format!("run log not saved: {save_err:#}"))
            }
        }
    }
}
