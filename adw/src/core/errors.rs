//! Pipeline-fatal error kinds.
//!
//! Every variant aborts the run at the stage that detected it. There is no
//! retry and no partial continuation; the caller flushes the run log and
//! exits non-zero.

use thiserror::Error;

use crate::core::types::ArtifactKey;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// The external executable could not be started at all.
    #[error("{stage}: external tool could not be launched ({message})")]
    ExternalToolMissing { stage: String, message: String },

    /// The process ran and did not exit with status 0.
    #[error("{stage} failed ({})", describe_exit(.exit_code))]
    StepFailed {
        stage: String,
        exit_code: Option<i32>,
    },

    /// A required value was not found in an otherwise successful step's output.
    #[error("could not find {artifact} in {stage} output")]
    ArtifactNotFound { stage: String, artifact: ArtifactKey },

    /// Commit/PR flows refuse to run on the trunk or a detached HEAD.
    #[error("cannot run on branch '{branch}' (trunk is '{trunk}'); create a feature/chore/bug branch first")]
    InvalidBranch { branch: String, trunk: String },
}

impl PipelineError {
    /// Name of the stage that failed, when the error is tied to one.
    pub fn stage(&self) -> Option<&str> {
        match self {
            PipelineError::ExternalToolMissing { stage, .. }
            | PipelineError::StepFailed { stage, .. }
            | PipelineError::ArtifactNotFound { stage, .. } => Some(stage),
            PipelineError::InvalidBranch { .. } => None,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated without exit code".to_string(),
    }
}
