//! Branch naming conventions and the trunk guard.
//!
//! Branches follow `<category>/<slug>`. Commit and pull-request flows refuse to
//! run on the trunk branch or on a detached HEAD (empty branch name).

use crate::core::types::{BranchCategory, BranchDescriptor};

const CATEGORIES: [BranchCategory; 3] = [
    BranchCategory::Feature,
    BranchCategory::Chore,
    BranchCategory::Bug,
];

/// Classify a branch by its exact, case-sensitive `<category>/` prefix.
pub fn classify(branch: &str) -> BranchCategory {
    CATEGORIES
        .into_iter()
        .find(|category| {
            category
                .prefix()
                .is_some_and(|prefix| branch.starts_with(prefix))
        })
        .unwrap_or(BranchCategory::Other)
}

/// Branch name with a recognised category prefix removed.
pub fn slug(branch: &str) -> &str {
    classify(branch)
        .prefix()
        .and_then(|prefix| branch.strip_prefix(prefix))
        .unwrap_or(branch)
}

/// Human-readable title: prefix stripped, `-`/`_` as spaces, each word title-cased.
pub fn derive_title(branch: &str) -> String {
    let spaced = slug(branch).replace(['-', '_'], " ");
    title_case(&spaced)
}

fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for ch in text.chars() {
        if ch.is_whitespace() {
            at_word_start = true;
            out.push(ch);
        } else if at_word_start {
            out.extend(ch.to_uppercase());
            at_word_start = false;
        } else {
            out.extend(ch.to_lowercase());
        }
    }
    out
}

/// Raised when a branch may not be used for commit/PR operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidBranch {
    pub branch: String,
}

/// Guards destructive flows against the protected trunk branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchPolicy {
    trunk: String,
}

impl BranchPolicy {
    pub fn new(trunk: impl Into<String>) -> Self {
        Self {
            trunk: trunk.into(),
        }
    }

    pub fn trunk(&self) -> &str {
        &self.trunk
    }

    /// Fails when `branch` is empty or equals the trunk.
    pub fn guard(&self, branch: &str) -> Result<(), InvalidBranch> {
        if branch.is_empty() || branch == self.trunk {
            return Err(InvalidBranch {
                branch: branch.to_string(),
            });
        }
        Ok(())
    }

    /// Guard `branch` and describe it.
    pub fn describe(&self, branch: &str) -> Result<BranchDescriptor, InvalidBranch> {
        self.guard(branch)?;
        Ok(BranchDescriptor {
            raw_name: branch.to_string(),
            category: classify(branch),
            derived_title: derive_title(branch),
        })
    }
}
