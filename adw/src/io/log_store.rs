//! Durable storage for run logs.
//!
//! Each run gets a fresh file named after its start time. The file is created
//! with create-new semantics, so two runs starting in the same second never
//! share a log: the later one takes the next numeric suffix.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, instrument};

use crate::core::run_log::RunLog;

const MAX_SUFFIX: u32 = 999;

/// Writes rendered run logs into one directory.
#[derive(Debug, Clone)]
pub struct LogStore {
    dir: PathBuf,
    prefix: String,
}

impl LogStore {
    /// `prefix` names the workflow (e.g. `build` gives `build_log_<ts>.md`).
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    /// Base file name (without collision suffix) for `log`.
    pub fn file_name(&self, log: &RunLog) -> String {
        format!(
            "{}_log_{}.md",
            self.prefix,
            log.started_at().format("%Y%m%d_%H%M%S")
        )
    }

    /// Render and write `log` to a new file, returning its path.
    #[instrument(skip_all, fields(dir = %self.dir.display()))]
    pub fn persist(&self, log: &RunLog) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("create log dir {}", self.dir.display()))?;

        let base = self.file_name(log);
        let stem = base.trim_end_matches(".md");
        let rendered = log.render();

        for suffix in 1..=MAX_SUFFIX {
            let name = if suffix == 1 {
                base.clone()
            } else {
                format!("{stem}-{suffix}.md")
            };
            let path = self.dir.join(&name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(rendered.as_bytes())
                        .with_context(|| format!("write run log {}", path.display()))?;
                    info!(path = %path.display(), "run log saved");
                    return Ok(path);
                }
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    debug!(path = %path.display(), "run log name taken");
                }
                Err(err) => {
                    return Err(err).with_context(|| format!("create run log {}", path.display()));
                }
            }
        }

        Err(anyhow!(
            "unable to pick a unique run log name from '{base}' (too many runs in one second)"
        ))
    }
}
