//! Workflow runs against a scripted step runner.

use std::fs;

use adw::core::errors::PipelineError;
use adw::core::types::{ArtifactKey, StepResult};
use adw::io::config::AdwConfig;
use adw::test_support::{ScriptedRunner, TempWorkdir, fixed_start};
use adw::workflows::Workflows;

fn config() -> AdwConfig {
    let mut cfg = AdwConfig::default();
    cfg.assistant.command = vec!["assistant".to_string()];
    cfg
}

#[test]
fn build_feature_implements_the_extracted_spec() {
    let workdir = TempWorkdir::new(config()).expect("workdir");
    let flows = Workflows::new(workdir.config(), workdir.path());
    let runner = ScriptedRunner::new(vec![
        StepResult::exited(0, "Switched to a new branch 'feature/dark-mode'"),
        StepResult::exited(
            0,
            "Plan written.\n## Feature Plan Created: `specs/007-dark-mode.md`\n",
        ),
        StepResult::exited(0, "Implemented."),
    ]);

    let report = flows
        .run(&runner, flows.build_feature("add dark mode"), fixed_start(), |_| {})
        .expect("build succeeds");

    assert_eq!(runner.calls(), 3);
    assert_eq!(
        runner.invoked()[2].command,
        vec!["assistant", "/implement specs/007-dark-mode.md"]
    );
    assert_eq!(
        report.context.get(ArtifactKey::SpecFile),
        Some("specs/007-dark-mode.md")
    );

    let logs = workdir.logs().expect("logs");
    assert_eq!(logs, vec![report.log_path.clone()]);
    let log = fs::read_to_string(&report.log_path).expect("read log");
    assert!(log.starts_with("# Feature Build Log\n**Feature Description:** add dark mode\n"));
    assert!(log.contains("## Step 3: Feature Implementation"));
    assert!(log.contains("**Spec File:** `specs/007-dark-mode.md`"));
    assert!(log.ends_with("- Status: Completed"));
}

#[test]
fn failed_branch_creation_stops_before_planning() {
    let workdir = TempWorkdir::new(config()).expect("workdir");
    let flows = Workflows::new(workdir.config(), workdir.path());
    let runner = ScriptedRunner::new(vec![
        StepResult::exited(1, "fatal: a branch named 'feature/x' already exists"),
        StepResult::exited(0, "never"),
        StepResult::exited(0, "never"),
    ]);

    let err = flows
        .run(&runner, flows.build_feature("x"), fixed_start(), |_| {})
        .expect_err("build aborts");

    assert_eq!(runner.calls(), 1);
    assert_eq!(
        err.downcast_ref::<PipelineError>(),
        Some(&PipelineError::StepFailed {
            stage: "Git Branch Creation".to_string(),
            exit_code: Some(1),
        })
    );

    let logs = workdir.logs().expect("logs");
    assert_eq!(logs.len(), 1);
    let log = fs::read_to_string(&logs[0]).expect("read log");
    assert_eq!(log.matches("## Step ").count(), 1);
    assert!(log.contains("**Outcome:** failed (exit code 1)"));
    assert!(log.contains("**ERROR:** Git Branch Creation failed (exit code 1). Aborting."));
    assert!(!log.contains("## Summary"));
}

#[test]
fn abort_midway_keeps_earlier_sections() {
    let workdir = TempWorkdir::new(config()).expect("workdir");
    let flows = Workflows::new(workdir.config(), workdir.path());
    let runner = ScriptedRunner::new(vec![
        StepResult::exited(0, "branch created"),
        StepResult::exited(0, "I could not decide on a plan."),
        StepResult::exited(0, "never"),
    ]);

    let err = flows
        .run(&runner, flows.build_feature("x"), fixed_start(), |_| {})
        .expect_err("build aborts");

    assert_eq!(runner.calls(), 2);
    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::ArtifactNotFound {
            artifact: ArtifactKey::SpecFile,
            ..
        })
    ));

    let logs = workdir.logs().expect("logs");
    let log = fs::read_to_string(&logs[0]).expect("read log");
    assert!(log.contains("## Step 1: Git Branch Creation"));
    assert!(log.contains("## Step 2: Feature Planning"));
    assert!(!log.contains("## Step 3"));
    assert!(log.contains("**ERROR:** could not find Spec File in Feature Planning output. Aborting."));
}

#[test]
fn commit_refuses_trunk() {
    let workdir = TempWorkdir::new(config()).expect("workdir");
    let flows = Workflows::new(workdir.config(), workdir.path());
    let runner = ScriptedRunner::new(vec![StepResult::exited(0, "master\n")]);

    let err = flows
        .run(&runner, flows.commit("wip"), fixed_start(), |_| {})
        .expect_err("commit refused");

    assert_eq!(runner.calls(), 1);
    assert_eq!(
        err.downcast_ref::<PipelineError>(),
        Some(&PipelineError::InvalidBranch {
            branch: "master".to_string(),
            trunk: "master".to_string(),
        })
    );
    assert_eq!(workdir.logs().expect("logs").len(), 1);
}

#[test]
fn detached_head_is_refused_for_pull_requests() {
    let workdir = TempWorkdir::new(config()).expect("workdir");
    let flows = Workflows::new(workdir.config(), workdir.path());
    let runner = ScriptedRunner::new(vec![StepResult::exited(0, "\n")]);

    let err = flows
        .run(&runner, flows.pull_request(None, false), fixed_start(), |_| {})
        .expect_err("pr refused");

    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::InvalidBranch { branch, .. }) if branch.is_empty()
    ));
}

#[test]
fn custom_trunk_is_honoured() {
    let mut cfg = config();
    cfg.trunk_branch = "main".to_string();
    let workdir = TempWorkdir::new(cfg).expect("workdir");
    let flows = Workflows::new(workdir.config(), workdir.path());
    let runner = ScriptedRunner::new(vec![
        StepResult::exited(0, "master\n"),
        StepResult::exited(0, ""),
        StepResult::exited(0, ""),
        StepResult::exited(0, ""),
        StepResult::exited(0, ""),
    ]);

    flows
        .run(&runner, flows.commit("wip"), fixed_start(), |_| {})
        .expect("master is an ordinary branch when trunk is main");
    assert_eq!(runner.calls(), 5);
}

#[test]
fn runs_in_the_same_second_get_distinct_logs() {
    let workdir = TempWorkdir::new(config()).expect("workdir");
    let flows = Workflows::new(workdir.config(), workdir.path());

    for _ in 0..2 {
        let runner = ScriptedRunner::succeeding(1);
        flows
            .run(&runner, flows.chore("bump deps"), fixed_start(), |_| {})
            .expect("chore");
    }

    let names: Vec<String> = workdir
        .logs()
        .expect("logs")
        .iter()
        .filter_map(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    assert_eq!(
        names,
        vec!["chore_log_20261018_090530-2.md", "chore_log_20261018_090530.md"]
    );
}

#[test]
fn structured_trailer_takes_precedence() {
    let workdir = TempWorkdir::new(config()).expect("workdir");
    let flows = Workflows::new(workdir.config(), workdir.path());
    let runner = ScriptedRunner::new(vec![StepResult::exited(
        0,
        "mentions specs/001-old.md\nADW_RESULT: {\"spec_file\": \"specs/002-new.md\"}\n",
    )]);

    let report = flows
        .run(&runner, flows.feature("x"), fixed_start(), |_| {})
        .expect("feature");
    assert_eq!(
        report.context.get(ArtifactKey::SpecFile),
        Some("specs/002-new.md")
    );
}
