//! End-to-end runs of the `adw` binary against real processes.
#![cfg(unix)]

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use adw::io::config::{AdwConfig, CONFIG_RELATIVE_PATH, load_config};
use adw::test_support::TempWorkdir;

fn adw(workdir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_adw"))
        .arg("--workdir")
        .arg(workdir)
        .args(args)
        .env_remove("ADW_WORKDIR")
        .env_remove("RUST_LOG")
        .output()
        .expect("run adw")
}

fn with_assistant(command: &[&str]) -> TempWorkdir {
    let mut cfg = AdwConfig::default();
    cfg.assistant.command = command.iter().map(|s| s.to_string()).collect();
    TempWorkdir::new(cfg).expect("workdir")
}

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|out| out.status.success())
}

#[test]
fn chore_success_exits_zero_and_saves_log() {
    let workdir = with_assistant(&["echo"]);
    let out = adw(workdir.path(), &["chore", "bump", "deps"]);

    assert_eq!(out.status.code(), Some(0), "{out:?}");
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("/chore bump deps"));
    assert!(stdout.contains("Chore completed successfully!"));

    let logs = workdir.logs().expect("logs");
    assert_eq!(logs.len(), 1);
    let log = fs::read_to_string(&logs[0]).expect("read log");
    assert!(log.starts_with("# Chore Log\n**Chore Description:** bump deps"));
    assert!(log.contains("- Status: Completed"));
}

#[test]
fn failing_branch_creation_exits_one() {
    let workdir = with_assistant(&["false"]);
    let out = adw(workdir.path(), &["build", "add", "dark", "mode"]);

    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Git Branch Creation failed (exit code 1)"));

    let logs = workdir.logs().expect("logs");
    assert_eq!(logs.len(), 1);
    let name = logs[0].file_name().expect("name").to_string_lossy().into_owned();
    assert!(name.starts_with("build_log_"));
    let log = fs::read_to_string(&logs[0]).expect("read log");
    assert_eq!(log.matches("## Step ").count(), 1);
}

#[test]
fn missing_assistant_is_reported_as_not_launched() {
    let workdir = with_assistant(&["adw-test-no-such-assistant"]);
    let out = adw(workdir.path(), &["bug", "login", "crash"]);

    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert_eq!(stderr.matches("external tool could not be launched").count(), 1);
    assert!(!stderr.contains("ERROR"), "{stderr}");
    assert!(!stderr.contains("WARN"), "{stderr}");
    let log = fs::read_to_string(&workdir.logs().expect("logs")[0]).expect("read log");
    assert!(log.contains("**Outcome:** not launched"));
}

#[test]
fn draft_flag_may_follow_title_words() {
    if !git_available() {
        return;
    }
    let workdir = with_assistant(&["true"]);
    let init = Command::new("git")
        .args(["init", "--initial-branch=master"])
        .current_dir(workdir.path())
        .output()
        .expect("git init");
    assert!(init.status.success(), "{init:?}");

    let out = adw(workdir.path(), &["pr", "Fix", "preview", "--draft"]);

    assert_eq!(out.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Pull Request Title: Fix preview\n"), "{stdout}");
}

#[test]
fn feature_plan_reports_spec_file() {
    let workdir = with_assistant(&["echo", "Created spec file: `specs/003-export.md`"]);
    let out = adw(workdir.path(), &["feature", "export", "csv"]);

    assert_eq!(out.status.code(), Some(0), "{out:?}");
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Found Spec File: specs/003-export.md"));
}

#[test]
fn commit_on_trunk_is_refused() {
    if !git_available() {
        return;
    }
    let workdir = with_assistant(&["true"]);
    let init = Command::new("git")
        .args(["init", "--initial-branch=master"])
        .current_dir(workdir.path())
        .output()
        .expect("git init");
    assert!(init.status.success(), "{init:?}");

    let out = adw(workdir.path(), &["commit", "wip"]);

    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("cannot run on branch 'master'"));
    let log = fs::read_to_string(&workdir.logs().expect("logs")[0]).expect("read log");
    assert!(log.starts_with("# Commit Log"));
    assert!(!log.contains("## Step 2"));
}

#[test]
fn init_writes_default_config_once() {
    let temp = tempfile::tempdir().expect("tempdir");

    let out = adw(temp.path(), &["init"]);
    assert_eq!(out.status.code(), Some(0), "{out:?}");
    let cfg = load_config(&temp.path().join(CONFIG_RELATIVE_PATH)).expect("load");
    assert_eq!(cfg, AdwConfig::default());

    let again = adw(temp.path(), &["init"]);
    assert_eq!(again.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&again.stderr).contains("already exists"));

    let forced = adw(temp.path(), &["init", "--force"]);
    assert_eq!(forced.status.code(), Some(0));
}

#[test]
fn missing_description_is_a_usage_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let out = adw(temp.path(), &["bug"]);
    assert_eq!(out.status.code(), Some(2));
}
