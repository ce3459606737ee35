// src/exec/shell_runner.rs

//! Production process runner.

use std::collections::BTreeMap;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, ChildStdout};
use tracing::{debug, warn};

use super::backend::{ProcessOutput, ProcessRunner, RunFuture, RunnerError};
use super::invocation::Invocation;

const READ_CHUNK: usize = 8 * 1024;

/// Runs commands as real OS processes.
///
/// - stdout and stderr are drained concurrently into a single buffer while
///   the child runs, so a chatty child never blocks on a full pipe.
/// - The per-command environment is layered over the inherited one.
/// - With a timeout set, a child that outlives it is killed and reported as
///   [`RunnerError::TimedOut`].
#[derive(Debug, Clone, Default)]
pub struct ShellRunner {
    timeout: Option<Duration>,
}

impl ShellRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    async fn execute(
        &self,
        command: &str,
        env: &BTreeMap<String, String>,
    ) -> Result<ProcessOutput, RunnerError> {
        let invocation = Invocation::for_command(command);
        debug!(cmd = %command, ?invocation, "launching process");

        let mut cmd = invocation.into_command();
        cmd.envs(env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| RunnerError::Spawn { source })?;

        let stdout = child.stdout.take().ok_or_else(|| missing_pipe("stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| missing_pipe("stderr"))?;

        let mut combined = Vec::new();
        let finished = {
            let work = drain_and_wait(&mut child, stdout, stderr, &mut combined);
            match self.timeout {
                Some(limit) => tokio::time::timeout(limit, work).await.ok(),
                None => Some(work.await),
            }
        };

        let Some(waited) = finished else {
            // Only reachable with a timeout configured.
            let limit = self.timeout.unwrap_or_default();
            if let Err(e) = child.kill().await {
                warn!(cmd = %command, error = %e, "failed to kill timed-out process");
            }
            return Err(RunnerError::TimedOut {
                limit,
                output: String::from_utf8_lossy(&combined).into_owned(),
            });
        };

        let status = waited.map_err(|source| RunnerError::Io { source })?;
        into_output(status, &combined)
    }
}

impl ProcessRunner for ShellRunner {
    fn run<'a>(&'a self, command: &'a str, env: &'a BTreeMap<String, String>) -> RunFuture<'a> {
        Box::pin(self.execute(command, env))
    }
}

async fn drain_and_wait(
    child: &mut Child,
    stdout: ChildStdout,
    stderr: ChildStderr,
    combined: &mut Vec<u8>,
) -> std::io::Result<ExitStatus> {
    pump_output(stdout, stderr, combined).await?;
    child.wait().await
}

/// Drain both pipes until they close, appending chunks in arrival order.
async fn pump_output(
    mut stdout: ChildStdout,
    mut stderr: ChildStderr,
    combined: &mut Vec<u8>,
) -> std::io::Result<()> {
    let mut out_buf = [0u8; READ_CHUNK];
    let mut err_buf = [0u8; READ_CHUNK];
    let mut out_open = true;
    let mut err_open = true;

    while out_open || err_open {
        tokio::select! {
            read = stdout.read(&mut out_buf), if out_open => {
                let n = read?;
                if n == 0 {
                    out_open = false;
                } else {
                    combined.extend_from_slice(&out_buf[..n]);
                }
            }
            read = stderr.read(&mut err_buf), if err_open => {
                let n = read?;
                if n == 0 {
                    err_open = false;
                } else {
                    combined.extend_from_slice(&err_buf[..n]);
                }
            }
        }
    }

    Ok(())
}

fn into_output(status: ExitStatus, combined: &[u8]) -> Result<ProcessOutput, RunnerError> {
    let output = String::from_utf8_lossy(combined).into_owned();
    match exit_code(&status) {
        Some(code) => Ok(ProcessOutput::new(output, code)),
        None => Err(RunnerError::Signaled {
            signal: signal_of(&status).unwrap_or_default(),
            output,
        }),
    }
}

fn missing_pipe(name: &str) -> RunnerError {
    RunnerError::Io {
        source: std::io::Error::other(format!("child {name} was not piped")),
    }
}

// Windows reports a full u32; widen it unsigned so it can never be negative.
#[cfg(windows)]
fn exit_code(status: &ExitStatus) -> Option<i64> {
    status.code().map(|c| i64::from(c as u32))
}

#[cfg(not(windows))]
fn exit_code(status: &ExitStatus) -> Option<i64> {
    status.code().map(i64::from)
}

#[cfg(unix)]
fn signal_of(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn signal_of(_status: &ExitStatus) -> Option<i32> {
    None
}
