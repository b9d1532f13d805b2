//! I/O helpers for workflow commands: processes, external CLIs, config,
//! templates and log storage.

pub mod assistant;
pub mod config;
pub mod git;
pub mod github;
pub mod log_store;
pub mod process;
pub mod specs;
pub mod templates;
