//! Message templates for commits and pull requests.

use anyhow::Result;
use minijinja::{Environment, context};
use tracing::debug;

use crate::core::types::BranchCategory;

const PR_BODY_TEMPLATE: &str = include_str!("templates/pr_body.md");
const COMMIT_MESSAGE_TEMPLATE: &str = include_str!("templates/commit_message.txt");

/// Inputs for the pull-request body.
#[derive(Debug, Clone, Default)]
pub struct PrBodyInputs<'a> {
    pub category: Option<BranchCategory>,
    /// `- <subject>` lines since trunk; blank means the section is omitted.
    pub commits: Option<&'a str>,
    /// Related spec path, relative to the working directory.
    pub spec: Option<&'a str>,
    pub footer: &'a str,
}

/// Template engine wrapper around minijinja.
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.add_template("pr_body", PR_BODY_TEMPLATE)
            .expect("pr body template should be valid");
        env.add_template("commit_message", COMMIT_MESSAGE_TEMPLATE)
            .expect("commit message template should be valid");
        Self { env }
    }

    pub fn render_pr_body(&self, input: &PrBodyInputs<'_>) -> Result<String> {
        let category = input.category.unwrap_or(BranchCategory::Other);
        let template = self.env.get_template("pr_body")?;
        let rendered = template.render(context! {
            category => category.as_str(),
            commits => input.commits.map(str::trim).filter(|s| !s.is_empty()),
            spec => input.spec,
            footer => input.footer.trim(),
        })?;
        debug!(bytes = rendered.len(), "rendered pr body");
        Ok(rendered.trim_end().to_string())
    }

    /// Message, blank line, footer, then an optional `Co-Authored-By` trailer.
    pub fn render_commit_message(
        &self,
        message: &str,
        footer: &str,
        co_author: &str,
    ) -> Result<String> {
        let template = self.env.get_template("commit_message")?;
        let rendered = template.render(context! {
            message => message.trim(),
            footer => footer.trim(),
            co_author => Some(co_author.trim()).filter(|s| !s.is_empty()),
        })?;
        Ok(rendered.trim_end().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOOTER: &str = "Generated by adw";

    #[test]
    fn pr_body_with_all_sections() {
        let body = Templates::new()
            .render_pr_body(&PrBodyInputs {
                category: Some(BranchCategory::Feature),
                commits: Some("- Add toggle\n- Wire theme context\n"),
                spec: Some("specs/007-dark-mode.md"),
                footer: FOOTER,
            })
            .expect("render");

        let expected = [
            "## Summary",
            "",
            "This feature branch includes the following changes:",
            "",
            "### Commits",
            "- Add toggle",
            "- Wire theme context",
            "",
            "### Related Spec",
            "See `specs/007-dark-mode.md` for detailed planning.",
            "",
            "## Test Plan",
            "- [ ] Tested locally",
            "- [ ] Linting passed",
            "- [ ] Build succeeded",
            "",
            FOOTER,
        ]
        .join("\n");
        assert_eq!(body, expected);
    }

    #[test]
    fn pr_body_omits_empty_optional_sections() {
        let body = Templates::new()
            .render_pr_body(&PrBodyInputs {
                category: Some(BranchCategory::Bug),
                commits: Some("  \n"),
                spec: None,
                footer: FOOTER,
            })
            .expect("render");

        assert!(body.starts_with(
            "## Summary\n\nThis bug branch includes the following changes:\n\n## Test Plan\n"
        ));
        assert!(!body.contains("### Commits"));
        assert!(!body.contains("### Related Spec"));
        assert!(body.ends_with(FOOTER));
    }

    #[test]
    fn commit_message_with_trailer() {
        let msg = Templates::new()
            .render_commit_message("Add annotator", FOOTER, "Bot <bot@example.com>")
            .expect("render");
        assert_eq!(
            msg,
            "Add annotator\n\nGenerated by adw\n\nCo-Authored-By: Bot <bot@example.com>"
        );
    }

    #[test]
    fn commit_message_without_trailer() {
        let msg = Templates::new()
            .render_commit_message("Add annotator", FOOTER, "")
            .expect("render");
        assert_eq!(msg, "Add annotator\n\nGenerated by adw");
    }
}
