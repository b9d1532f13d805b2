//! Artifact extraction from free-form step output.
//!
//! Upstream tools print natural-language text, so a required value (the spec
//! file a planning stage wrote, a pull-request URL) is recovered by trying an
//! ordered list of patterns. The first pattern that matches anywhere wins and
//! its first capture group is returned.
//!
//! A structured trailer line takes precedence when present:
//!
//! ```text
//! ADW_RESULT: {"spec_file": "specs/007-dark-mode.md"}
//! ```
//!
//! Missing or malformed trailers fall through to the pattern chain unchanged.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

use crate::core::types::ArtifactKey;

const TRAILER_PREFIX: &str = "ADW_RESULT:";

/// Spec file written by the planning stage, highest priority first.
pub static SPEC_FILE: LazyLock<PatternSet> = LazyLock::new(|| {
    PatternSet::new(
        ArtifactKey::SpecFile,
        &[
            r"##\s+Feature Plan Created:\s+`(specs/[^`]+\.md)`",
            r"Created spec file:\s+`(specs/[^`]+\.md)`",
            r"Spec file created:\s+(specs/[^\s]+\.md)",
            r"(specs/\d+-[^`\s]+\.md)",
        ],
    )
});

/// URL printed by `gh pr create`.
pub static PULL_REQUEST_URL: LazyLock<PatternSet> = LazyLock::new(|| {
    PatternSet::new(
        ArtifactKey::PullRequestUrl,
        &[r"(https://github\.com/[^\s]+)"],
    )
});

/// Return the first capture of the first pattern that matches `text`.
///
/// Patterns without a capture group yield the whole match.
pub fn extract(text: &str, patterns: &[Regex]) -> Option<String> {
    for (index, pattern) in patterns.iter().enumerate() {
        let Some(caps) = pattern.captures(text) else {
            trace!(index, "pattern did not match");
            continue;
        };
        let found = caps.get(1).or_else(|| caps.get(0))?;
        debug!(index, value = found.as_str(), "pattern matched");
        return Some(found.as_str().to_string());
    }
    None
}

/// Read `key` from the last well-formed `ADW_RESULT:` trailer in `text`.
pub fn trailer_value(text: &str, key: &str) -> Option<String> {
    text.lines()
        .rev()
        .filter_map(|line| line.trim().strip_prefix(TRAILER_PREFIX))
        .find_map(|payload| {
            match serde_json::from_str::<BTreeMap<String, serde_json::Value>>(payload.trim()) {
                Ok(map) => Some(map),
                Err(err) => {
                    debug!(err = %err, "ignoring malformed result trailer");
                    None
                }
            }
        })
        .and_then(|map| map.get(key)?.as_str().map(str::to_string))
        .filter(|value| !value.trim().is_empty())
}

/// Ordered patterns for one artifact, with the structured fast path.
#[derive(Debug)]
pub struct PatternSet {
    key: ArtifactKey,
    patterns: Vec<Regex>,
}

impl PatternSet {
    /// Compile `patterns` in priority order.
    ///
    /// Panics on an invalid pattern; sets are built from literals.
    pub fn new(key: ArtifactKey, patterns: &[&str]) -> Self {
        let patterns = patterns
            .iter()
            .map(|raw| Regex::new(raw).expect("artifact pattern should be valid"))
            .collect();
        Self { key, patterns }
    }

    pub fn key(&self) -> ArtifactKey {
        self.key
    }

    /// Trailer value if present, otherwise the pattern chain.
    pub fn find(&self, text: &str) -> Option<String> {
        if let Some(value) = trailer_value(text, self.key.trailer_key()) {
            debug!(artifact = %self.key, "artifact taken from result trailer");
            return Some(value);
        }
        extract(text, &self.patterns)
    }
}
