//! In-memory record of one pipeline run.
//!
//! The log is append-only while the run is in flight and rendered to markdown
//! exactly once, at the terminal state. Storage lives in
//! [`crate::io::log_store`].

use chrono::NaiveDateTime;

use crate::core::types::{ArtifactKey, StepResult, StepStatus};

const RULE_WIDTH: usize = 80;

/// One entry of the log, in append order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSection {
    /// A step that ran, with its raw output.
    Step {
        number: usize,
        heading: String,
        output: String,
        status: StepStatus,
    },
    /// A value extracted for later stages.
    Artifact { key: ArtifactKey, value: String },
    /// The reason a run aborted.
    Error { message: String },
    /// Closing summary of a successful run.
    Summary { lines: Vec<(String, String)> },
}

impl LogSection {
    /// Markdown heading for the section, if it has one.
    pub fn heading(&self) -> Option<String> {
        match self {
            LogSection::Step {
                number, heading, ..
            } => Some(format!("Step {number}: {heading}")),
            LogSection::Summary { .. } => Some("Summary".to_string()),
            LogSection::Artifact { .. } | LogSection::Error { .. } => None,
        }
    }
}

/// Append-only run record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLog {
    title: String,
    subject_label: String,
    subject: String,
    started_at: NaiveDateTime,
    sections: Vec<LogSection>,
}

impl RunLog {
    pub fn new(
        title: impl Into<String>,
        subject_label: impl Into<String>,
        subject: impl Into<String>,
        started_at: NaiveDateTime,
    ) -> Self {
        Self {
            title: title.into(),
            subject_label: subject_label.into(),
            subject: subject.into(),
            started_at,
            sections: Vec::new(),
        }
    }

    pub fn started_at(&self) -> NaiveDateTime {
        self.started_at
    }

    pub fn sections(&self) -> &[LogSection] {
        &self.sections
    }

    /// Number of step sections recorded so far.
    pub fn step_count(&self) -> usize {
        self.sections
            .iter()
            .filter(|section| matches!(section, LogSection::Step { .. }))
            .count()
    }

    pub fn record_step(&mut self, heading: &str, result: &StepResult) {
        let number = self.step_count() + 1;
        self.sections.push(LogSection::Step {
            number,
            heading: heading.to_string(),
            output: result.output.clone(),
            status: result.status,
        });
    }

    pub fn record_artifact(&mut self, key: ArtifactKey, value: &str) {
        self.sections.push(LogSection::Artifact {
            key,
            value: value.to_string(),
        });
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.sections.push(LogSection::Error {
            message: message.into(),
        });
    }

    /// Close a successful run with the subject, recorded artifacts and `Completed`.
    pub fn record_summary(&mut self) {
        let mut lines = vec![(self.subject_label.clone(), self.subject.clone())];
        for section in &self.sections {
            if let LogSection::Artifact { key, value } = section {
                lines.push((key.label().to_string(), value.clone()));
            }
        }
        lines.push(("Status".to_string(), "Completed".to_string()));
        self.sections.push(LogSection::Summary { lines });
    }

    /// Render the markdown document (lines joined by `\n`).
    pub fn render(&self) -> String {
        let mut lines: Vec<String> = vec![
            format!("# {}", self.title),
            format!("**{}:** {}", self.subject_label, self.subject),
            format!(
                "**Timestamp:** {}",
                self.started_at.format("%Y-%m-%d %H:%M:%S")
            ),
            format!("\n{}\n", "=".repeat(RULE_WIDTH)),
        ];

        for section in &self.sections {
            match section {
                LogSection::Step { output, status, .. } => {
                    let heading = section.heading().unwrap_or_default();
                    lines.push(format!("## {heading}\n"));
                    lines.push(format!("```\n{output}\n```"));
                    lines.push(format!("**Outcome:** {}\n", describe_status(*status)));
                }
                LogSection::Artifact { key, value } => {
                    lines.push(format!("\n**{}:** `{value}`\n", key.label()));
                }
                LogSection::Error { message } => {
                    lines.push(format!("\n**ERROR:** {message}\n"));
                }
                LogSection::Summary { lines: items } => {
                    lines.push("\n## Summary\n".to_string());
                    for (label, value) in items {
                        lines.push(format!("- {label}: {value}"));
                    }
                }
            }
        }

        lines.join("\n")
    }
}

fn describe_status(status: StepStatus) -> String {
    match status {
        StepStatus::Exited(0) => "succeeded".to_string(),
        StepStatus::Exited(code) => format!("failed (exit code {code})"),
        StepStatus::Terminated => "failed (exit code unavailable)".to_string(),
        StepStatus::NotLaunched => "not launched".to_string(),
    }
}
