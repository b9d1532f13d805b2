//! Test-only helpers: a scripted step runner, deterministic timestamps and
//! throwaway working directories.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use tempfile::TempDir;

use crate::core::types::{Step, StepResult};
use crate::io::config::{AdwConfig, CONFIG_RELATIVE_PATH, write_config};
use crate::io::process::StepRunner;

/// Replays queued results in order and records every step it was asked to run.
///
/// Running more steps than were scripted is a test bug and panics.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    results: RefCell<VecDeque<StepResult>>,
    invoked: RefCell<Vec<Step>>,
}

impl ScriptedRunner {
    pub fn new(results: Vec<StepResult>) -> Self {
        Self {
            results: RefCell::new(results.into()),
            invoked: RefCell::new(Vec::new()),
        }
    }

    /// `count` steps that all exit 0 with empty output.
    pub fn succeeding(count: usize) -> Self {
        Self::new(vec![StepResult::exited(0, ""); count])
    }

    /// Number of steps run so far.
    pub fn calls(&self) -> usize {
        self.invoked.borrow().len()
    }

    pub fn invoked(&self) -> Vec<Step> {
        self.invoked.borrow().clone()
    }
}

impl StepRunner for ScriptedRunner {
    fn run(&self, step: &Step) -> StepResult {
        self.invoked.borrow_mut().push(step.clone());
        self.results
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted result for step {:?}", step.command))
    }
}

/// Fixed run start: 2026-10-18 09:05:30.
pub fn fixed_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 18)
        .and_then(|d| d.and_hms_opt(9, 5, 30))
        .expect("valid timestamp")
}

/// Temporary working directory carrying an `.adw/config.toml`.
pub struct TempWorkdir {
    dir: TempDir,
    config: AdwConfig,
}

impl TempWorkdir {
    pub fn new(config: AdwConfig) -> Result<Self> {
        let dir = tempfile::tempdir().context("create temp workdir")?;
        write_config(&dir.path().join(CONFIG_RELATIVE_PATH), &config)?;
        Ok(Self { dir, config })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config(&self) -> &AdwConfig {
        &self.config
    }

    /// Run logs written so far, sorted by file name.
    pub fn logs(&self) -> Result<Vec<PathBuf>> {
        let dir = self.path().join(&self.config.log_dir);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut logs = Vec::new();
        for entry in fs::read_dir(&dir).with_context(|| format!("read {}", dir.display()))? {
            let path = entry.context("read log entry")?.path();
            if path.extension().is_some_and(|ext| ext == "md") {
                logs.push(path);
            }
        }
        logs.sort();
        Ok(logs)
    }
}
