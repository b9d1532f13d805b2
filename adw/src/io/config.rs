//! Workflow configuration stored under `.adw/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::io::process::DEFAULT_OUTPUT_LIMIT_BYTES;

/// Config path relative to the working directory.
pub const CONFIG_RELATIVE_PATH: &str = ".adw/config.toml";

/// Workflow configuration (TOML).
///
/// Missing fields default to the conventions the workflows were built around.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AdwConfig {
    /// Protected branch that commit/PR flows refuse to run on.
    pub trunk_branch: String,

    /// Remote that `commit` pushes to.
    pub remote: String,

    /// Directory (relative to the working dir) holding generated specs.
    pub specs_dir: PathBuf,

    /// Directory (relative to the working dir) receiving run logs.
    pub log_dir: PathBuf,

    /// Per-stream capture bound for step output.
    pub output_limit_bytes: usize,

    pub assistant: AssistantConfig,

    pub attribution: AttributionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AssistantConfig {
    /// Program and leading arguments; the prompt is appended as one argument.
    pub command: Vec<String>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            command: vec!["claude".to_string(), "-p".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AttributionConfig {
    /// Footer appended to commit messages and pull-request bodies.
    pub footer: String,
    /// `Co-Authored-By` trailer value for commits. Empty disables the trailer.
    pub co_author: String,
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            footer: "🤖 Generated with [Claude Code](https://claude.com/claude-code)".to_string(),
            co_author: "Claude <noreply@anthropic.com>".to_string(),
        }
    }
}

impl Default for AdwConfig {
    fn default() -> Self {
        Self {
            trunk_branch: "master".to_string(),
            remote: "origin".to_string(),
            specs_dir: PathBuf::from("specs"),
            log_dir: PathBuf::from("specs"),
            output_limit_bytes: DEFAULT_OUTPUT_LIMIT_BYTES,
            assistant: AssistantConfig::default(),
            attribution: AttributionConfig::default(),
        }
    }
}

impl AdwConfig {
    pub fn validate(&self) -> Result<()> {
        if self.trunk_branch.trim().is_empty() {
            return Err(anyhow!("trunk_branch must not be empty"));
        }
        if self.remote.trim().is_empty() {
            return Err(anyhow!("remote must not be empty"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        if self.log_dir.as_os_str().is_empty() {
            return Err(anyhow!("log_dir must not be empty"));
        }
        if self.specs_dir.as_os_str().is_empty() {
            return Err(anyhow!("specs_dir must not be empty"));
        }
        if self.assistant.command.is_empty() || self.assistant.command[0].trim().is_empty() {
            return Err(anyhow!("assistant.command must be a non-empty array"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `AdwConfig::default()`.
pub fn load_config(path: &Path) -> Result<AdwConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "config missing, using defaults");
        let cfg = AdwConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: AdwConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    debug!(path = %path.display(), "config loaded");
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &AdwConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, AdwConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join(CONFIG_RELATIVE_PATH);
        let cfg = AdwConfig {
            trunk_branch: "main".to_string(),
            ..AdwConfig::default()
        };
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            "trunk_branch = \"main\"\n\n[assistant]\ncommand = [\"my-assistant\"]\n",
        )
        .expect("write");

        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.trunk_branch, "main");
        assert_eq!(cfg.assistant.command, vec!["my-assistant".to_string()]);
        assert_eq!(cfg.remote, "origin");
        assert_eq!(cfg.log_dir, PathBuf::from("specs"));
    }

    #[test]
    fn rejects_empty_assistant_command() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "[assistant]\ncommand = []\n").expect("write");

        let err = load_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("assistant.command"));
    }

    #[test]
    fn rejects_unparseable_toml() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "trunk_branch = [").expect("write");

        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("parse"));
    }
}
