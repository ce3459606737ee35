// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running one command line as a
//! child process, using `tokio::process::Command`, and handing back the
//! combined output and exit status.
//!
//! - [`backend`] provides the `ProcessRunner` trait the worker pool talks to,
//!   plus the `ProcessOutput` / `RunnerError` result types. Tests can replace
//!   the runner with a fake implementation.
//! - [`invocation`] decides whether a command line is executed directly or
//!   through the platform shell.
//! - [`shell_runner`] is the production `ShellRunner`.

pub mod backend;
pub mod invocation;
pub mod shell_runner;

pub use backend::{ProcessOutput, ProcessRunner, RunFuture, RunnerError};
pub use invocation::Invocation;
pub use shell_runner::ShellRunner;
