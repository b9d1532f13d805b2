//! Step runner backed by child processes.
//!
//! The runner is a pure capture boundary: it prints nothing, enforces no
//! timeout (a hung tool blocks the pipeline), and folds launch failures into
//! the returned [`StepResult`] instead of erroring.

use std::io::{self, Read};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument};

use crate::core::types::{Step, StepResult, StepStatus};

pub const DEFAULT_OUTPUT_LIMIT_BYTES: usize = 10_000_000;

/// Abstraction over how steps are executed.
///
/// The pipeline only talks to this trait; tests substitute scripted runners.
pub trait StepRunner {
    fn run(&self, step: &Step) -> StepResult;
}

/// Runs each step as a child process in the step's working directory.
#[derive(Debug, Clone)]
pub struct ProcessStepRunner {
    output_limit_bytes: usize,
}

impl Default for ProcessStepRunner {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_LIMIT_BYTES)
    }
}

impl ProcessStepRunner {
    /// `output_limit_bytes` bounds how much of each stream is kept in memory.
    pub fn new(output_limit_bytes: usize) -> Self {
        Self { output_limit_bytes }
    }
}

impl StepRunner for ProcessStepRunner {
    #[instrument(skip_all, fields(program = step.program(), workdir = %step.workdir.display()))]
    fn run(&self, step: &Step) -> StepResult {
        if step.command.is_empty() {
            return StepResult::not_launched("Error: Command not found - empty command");
        }

        let mut cmd = Command::new(step.program());
        cmd.args(step.args()).current_dir(&step.workdir);

        debug!("spawning child process");
        let child = match spawn_piped(cmd) {
            Ok(child) => child,
            Err(err) => {
                debug!(err = %err, "failed to launch command");
                return StepResult::not_launched(launch_failure_message(step, &err));
            }
        };

        match capture(child, self.output_limit_bytes) {
            Ok(captured) => captured.into_result(),
            Err(err) => {
                debug!(err = %format!("{err:#}"), "failed to capture command output");
                StepResult {
                    output: format!("Error: failed to capture output of {} - {err:#}", step.program()),
                    status: StepStatus::Terminated,
                }
            }
        }
    }
}

fn spawn_piped(mut cmd: Command) -> io::Result<std::process::Child> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
}

fn launch_failure_message(step: &Step, err: &io::Error) -> String {
    if err.kind() == io::ErrorKind::NotFound {
        format!("Error: Command not found - {}: {err}", step.program())
    } else {
        format!("Error: could not launch {} - {err}", step.program())
    }
}

/// Raw output of a finished child.
#[derive(Debug)]
struct Captured {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    stdout_truncated: usize,
    stderr_truncated: usize,
}

impl Captured {
    /// Merge streams (stdout first, then stderr) into a step result.
    fn into_result(self) -> StepResult {
        let mut output = String::from_utf8_lossy(&self.stdout).into_owned();
        output.push_str(&truncated_notice("stdout", self.stdout_truncated));
        output.push_str(&String::from_utf8_lossy(&self.stderr));
        output.push_str(&truncated_notice("stderr", self.stderr_truncated));

        let status = match self.status.code() {
            Some(code) => StepStatus::Exited(code),
            None => StepStatus::Terminated,
        };
        StepResult { output, status }
    }
}

fn truncated_notice(stream: &str, truncated: usize) -> String {
    if truncated > 0 {
        format!("\n[{stream} truncated {truncated} bytes]\n")
    } else {
        String::new()
    }
}

/// Drain both pipes concurrently so a chatty child cannot deadlock, then wait.
fn capture(mut child: std::process::Child, limit: usize) -> Result<Captured> {
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;

    let stdout_handle = thread::spawn(move || read_stream_limited(stdout, limit));
    let stderr_handle = thread::spawn(move || read_stream_limited(stderr, limit));

    let status = child.wait().context("wait for command")?;

    let (stdout, stdout_truncated) = join_output(stdout_handle).context("join stdout")?;
    let (stderr, stderr_truncated) = join_output(stderr_handle).context("join stderr")?;

    if stdout_truncated > 0 || stderr_truncated > 0 {
        debug!(stdout_truncated, stderr_truncated, "output truncated");
    }

    debug!(exit_code = ?status.code(), "command finished");
    Ok(Captured {
        status,
        stdout,
        stderr,
        stdout_truncated,
        stderr_truncated,
    })
}

fn join_output(handle: thread::JoinHandle<Result<(Vec<u8>, usize)>>) -> Result<(Vec<u8>, usize)> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("output reader thread panicked")),
    }
}

fn read_stream_limited<R: Read>(mut reader: R, limit: usize) -> Result<(Vec<u8>, usize)> {
    let mut buf = Vec::new();
    let mut truncated = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            break;
        }
        let remaining = limit.saturating_sub(buf.len());
        if remaining > 0 {
            let keep = n.min(remaining);
            buf.extend_from_slice(&chunk[..keep]);
            truncated += n.saturating_sub(keep);
        } else {
            truncated += n;
        }
    }

    Ok((buf, truncated))
}
