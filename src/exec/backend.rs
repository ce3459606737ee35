// src/exec/backend.rs

//! Pluggable process runner abstraction.
//!
//! Workers talk to a `ProcessRunner` instead of spawning processes directly.
//! This makes it easy to swap in a fake runner in tests while keeping the
//! production implementation in [`super::shell_runner`].

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;

/// Boxed future returned by [`ProcessRunner::run`].
pub type RunFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ProcessOutput, RunnerError>> + Send + 'a>>;

/// What a process that ran to completion left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Everything written to stdout and stderr, in arrival order.
    pub output: String,
    /// Exit status as reported by the operating system.
    pub status: i64,
}

impl ProcessOutput {
    pub fn new(output: impl Into<String>, status: i64) -> Self {
        Self {
            output: output.into(),
            status,
        }
    }

    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Why a command could not be turned into a normal exit status.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("failed to launch process: {source}")]
    Spawn {
        #[source]
        source: std::io::Error,
    },

    #[error("i/o error while running process: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },

    #[error("process terminated by signal {signal}")]
    Signaled { signal: i32, output: String },

    #[error("process timed out after {limit:?} and was killed")]
    TimedOut { limit: Duration, output: String },
}

impl RunnerError {
    /// Output captured before the failure, empty if the process never ran.
    pub fn captured_output(&self) -> &str {
        match self {
            RunnerError::Signaled { output, .. } | RunnerError::TimedOut { output, .. } => output,
            RunnerError::Spawn { .. } | RunnerError::Io { .. } => "",
        }
    }
}

/// Trait abstracting how a single command line is executed.
///
/// Production code uses [`super::ShellRunner`]; tests can provide their own
/// implementation that doesn't spawn real processes.
pub trait ProcessRunner: Send + Sync {
    /// Run `command` with `env` merged over the inherited environment and
    /// wait for it to finish.
    ///
    /// A normal exit (whatever the status) is `Ok`; `Err` is reserved for
    /// processes that could not be launched or did not exit normally.
    fn run<'a>(&'a self, command: &'a str, env: &'a BTreeMap<String, String>) -> RunFuture<'a>;
}
