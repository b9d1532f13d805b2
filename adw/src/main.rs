//! Developer-workflow orchestrator CLI.
//!
//! Each subcommand runs one fixed workflow in the working directory and
//! writes a run log under the configured log directory, success or not.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use adw::core::types::StepStatus;
use adw::exit_codes;
use adw::io::config::{AdwConfig, CONFIG_RELATIVE_PATH, load_config, write_config};
use adw::io::process::ProcessStepRunner;
use adw::logging;
use adw::pipeline::PipelineEvent;
use adw::workflows::{Workflow, WorkflowKind, Workflows};
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::debug;

const BANNER_WIDTH: usize = 80;

#[derive(Parser)]
#[command(
    name = "adw",
    version,
    about = "Drive the assistant, git and gh through fixed developer workflows"
)]
struct Cli {
    /// Working copy to operate in (defaults to the current directory).
    #[arg(long, global = true, env = "ADW_WORKDIR")]
    workdir: Option<PathBuf>,

    /// Config file (defaults to `<workdir>/.adw/config.toml`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug diagnostics on stderr (ignored when `RUST_LOG` is set).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default `.adw/config.toml`.
    Init {
        /// Overwrite an existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Create a bug branch, then plan and fix the bug.
    Bug {
        #[arg(required = true, num_args = 1..)]
        description: Vec<String>,
    },
    /// Run a chore.
    Chore {
        #[arg(required = true, num_args = 1..)]
        description: Vec<String>,
    },
    /// Plan a feature and report the spec file it produced.
    Feature {
        #[arg(required = true, num_args = 1..)]
        description: Vec<String>,
    },
    /// Create a feature branch, plan the feature, then implement the plan.
    Build {
        #[arg(required = true, num_args = 1..)]
        description: Vec<String>,
    },
    /// Stage everything, commit with attribution and push the current branch.
    Commit {
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },
    /// Open a pull request for the current branch.
    Pr {
        /// Open as a draft.
        #[arg(long)]
        draft: bool,
        /// Title (defaults to one derived from the branch name).
        #[arg(num_args = 0..)]
        title: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let code = match run(cli) {
        Ok(()) => exit_codes::OK,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_codes::FAILED
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<()> {
    let workdir = resolve_workdir(cli.workdir.as_deref())?;
    let config_path = cli
        .config
        .unwrap_or_else(|| workdir.join(CONFIG_RELATIVE_PATH));

    if let Command::Init { force } = cli.command {
        return cmd_init(&config_path, force);
    }

    let config = load_config(&config_path)?;
    debug!(workdir = %workdir.display(), config = %config_path.display(), "resolved setup");
    let flows = Workflows::new(&config, &workdir);

    let workflow = select_workflow(&flows, &cli.command).context("command runs no workflow")?;
    run_workflow(&flows, &config, workflow)
}

/// Stage list for a workflow subcommand; `None` for `init`.
fn select_workflow<'f>(flows: &'f Workflows<'_>, command: &Command) -> Option<Workflow<'f>> {
    let workflow = match command {
        Command::Init { .. } => return None,
        Command::Bug { description } => flows.bug(&join_words(description)),
        Command::Chore { description } => flows.chore(&join_words(description)),
        Command::Feature { description } => flows.feature(&join_words(description)),
        Command::Build { description } => flows.build_feature(&join_words(description)),
        Command::Commit { message } => flows.commit(&join_words(message)),
        Command::Pr { draft, title } => flows.pull_request(Some(join_words(title).as_str()), *draft),
    };
    Some(workflow)
}

fn run_workflow(flows: &Workflows<'_>, config: &AdwConfig, workflow: Workflow<'_>) -> Result<()> {
    let kind = workflow.kind();
    println!("{}: {}", kind.subject_label(), workflow.subject());

    let runner = ProcessStepRunner::new(config.output_limit_bytes);
    let started_at = chrono::Local::now().naive_local();
    let report = flows.run(&runner, workflow, started_at, print_event)?;

    println!("\n{}", "=".repeat(BANNER_WIDTH));
    println!("{}", completion_message(kind));
    for (key, value) in report.context.artifacts() {
        if !value.contains('\n') {
            println!("{}: {value}", key.label());
        }
    }
    println!("Log saved to: {}", report.log_path.display());
    println!("{}", "=".repeat(BANNER_WIDTH));
    Ok(())
}

fn print_event(event: PipelineEvent<'_>) {
    match event {
        PipelineEvent::StageStarted {
            number,
            total,
            step,
            ..
        } => {
            println!("\n{}", "=".repeat(BANNER_WIDTH));
            println!("Step {number}/{total}: {}", step.description);
            println!("{}\n", "=".repeat(BANNER_WIDTH));
        }
        PipelineEvent::StageFinished { heading, result, .. } => {
            print!("{}", result.output);
            if !result.output.is_empty() && !result.output.ends_with('\n') {
                println!();
            }
            if !result.succeeded() {
                let outcome = match result.status {
                    StepStatus::Exited(code) => format!("exit code {code}"),
                    StepStatus::Terminated => "terminated".to_string(),
                    StepStatus::NotLaunched => "not launched".to_string(),
                };
                eprintln!("\n{heading} failed ({outcome})");
            }
        }
        PipelineEvent::ArtifactFound { key, value } => {
            println!("\nFound {}: {value}", key.label());
        }
        PipelineEvent::LogSaved { path } => {
            debug!(path = %path.display(), "run log saved");
        }
    }
}

fn completion_message(kind: WorkflowKind) -> &'static str {
    match kind {
        WorkflowKind::Bug => "Bug fix completed successfully!",
        WorkflowKind::Chore => "Chore completed successfully!",
        WorkflowKind::Feature => "Feature plan created successfully!",
        WorkflowKind::Build => "Feature build completed successfully!",
        WorkflowKind::Commit => "Changes committed and pushed successfully!",
        WorkflowKind::PullRequest => "Pull request created successfully!",
    }
}

fn cmd_init(config_path: &Path, force: bool) -> Result<()> {
    if !force && config_path.exists() {
        bail!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        );
    }
    write_config(config_path, &AdwConfig::default())?;
    println!("Wrote {}", config_path.display());
    Ok(())
}

/// Canonical working directory; every step runs here.
fn resolve_workdir(requested: Option<&Path>) -> Result<PathBuf> {
    let dir = match requested {
        Some(dir) => dir.to_path_buf(),
        None => env::current_dir().context("read current directory")?,
    };
    let canonical =
        fs::canonicalize(&dir).with_context(|| format!("resolve workdir {}", dir.display()))?;
    if !canonical.is_dir() {
        bail!("workdir {} is not a directory", canonical.display());
    }
    Ok(canonical)
}

/// Free-text arguments joined with single spaces.
fn join_words(words: &[String]) -> String {
    words.join(" ")
}
