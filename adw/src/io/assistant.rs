//! Assistant CLI step builders.
//!
//! The assistant is driven through slash commands passed as a single prompt
//! argument after the configured command prefix (`claude -p` by default).

use std::path::PathBuf;

use crate::core::types::{BranchCategory, Step};

#[derive(Debug, Clone)]
pub struct Assistant {
    command: Vec<String>,
    workdir: PathBuf,
}

impl Assistant {
    pub fn new(command: Vec<String>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            command,
            workdir: workdir.into(),
        }
    }

    /// `/create-branch <category> <description>`.
    pub fn create_branch(&self, category: BranchCategory, description: &str) -> Step {
        let noun = match category {
            BranchCategory::Bug => "bug fix",
            other => other.as_str(),
        };
        self.prompt(
            &format!("Creating {noun} branch..."),
            &format!("/create-branch {category} {description}"),
        )
    }

    pub fn bug(&self, description: &str) -> Step {
        self.prompt(
            "Running bug planning and fix...",
            &format!("/bug {description}"),
        )
    }

    pub fn chore(&self, description: &str) -> Step {
        self.prompt("Running chore...", &format!("/chore {description}"))
    }

    pub fn plan_feature(&self, description: &str) -> Step {
        self.prompt(
            "Running feature planning...",
            &format!("/feature {description}"),
        )
    }

    /// `/implement <spec file>`, using the path exactly as extracted.
    pub fn implement(&self, spec_file: &str) -> Step {
        self.prompt(
            "Running feature implementation...",
            &format!("/implement {spec_file}"),
        )
    }

    fn prompt(&self, description: &str, prompt: &str) -> Step {
        let mut command = self.command.clone();
        command.push(prompt.to_string());
        Step::new(description, command, &self.workdir)
    }
}
