//! Developer-workflow orchestrator.
//!
//! Each workflow (bug, chore, feature, build, commit, pull request) drives an
//! assistant CLI and the git/GitHub CLIs through a fixed sequence of steps,
//! threading values extracted from one step's output into the next and
//! persisting a run log whether the run completes or aborts.
//!
//! - **[`core`]**: Pure, deterministic logic (branch policy, artifact
//!   extraction, run log model, error taxonomy). No I/O.
//! - **[`io`]**: Side-effecting operations (process execution, step builders
//!   for external CLIs, config, templates, log storage).
//!
//! [`pipeline`] runs a stage list against a [`io::process::StepRunner`];
//! [`workflows`] defines the stage lists.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod pipeline;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod workflows;
