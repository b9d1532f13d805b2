//! Lookup of the spec file that belongs to a branch.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use crate::core::branch::slug;

/// Stems written by the run-log store (`<prefix>_log_<YYYYmmdd_HHMMSS>[-N]`).
static RUN_LOG_STEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z]+_log_\d{8}_\d{6}(-\d+)?$").expect("run log stem pattern should be valid")
});

/// Find a `*.md` spec in `specs_dir` whose name mentions the branch slug.
///
/// Names are compared lower-cased with dashes read as spaces, so
/// `feature/dark-mode` matches `007-Dark-Mode-Toggle.md`. Candidates are
/// checked in file-name order. Run logs sharing the directory are never
/// candidates. A missing directory means no spec.
pub fn find_related_spec(specs_dir: &Path, branch: &str) -> Result<Option<PathBuf>> {
    if !specs_dir.is_dir() {
        debug!(dir = %specs_dir.display(), "specs dir missing");
        return Ok(None);
    }

    let needle = slug(branch).replace('-', " ").to_lowercase();
    if needle.trim().is_empty() {
        return Ok(None);
    }

    let mut candidates = Vec::new();
    for entry in
        fs::read_dir(specs_dir).with_context(|| format!("read {}", specs_dir.display()))?
    {
        let entry = entry.context("read specs entry")?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "md") && !is_run_log(&path)
        {
            candidates.push(path);
        }
    }
    candidates.sort();

    let found = candidates.into_iter().find(|path| {
        path.file_stem()
            .map(|stem| stem.to_string_lossy().to_lowercase().replace('-', " "))
            .is_some_and(|stem| stem.contains(&needle))
    });
    debug!(branch, found = ?found, "related spec lookup");
    Ok(found)
}

fn is_run_log(path: &Path) -> bool {
    path.file_stem()
        .is_some_and(|stem| RUN_LOG_STEM.is_match(&stem.to_string_lossy()))
}

/// Display `path` relative to `base` when it lives underneath it.
pub fn display_relative(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string()
}
