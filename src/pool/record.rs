// src/pool/record.rs

use std::sync::Arc;

use crate::exec::{ProcessOutput, RunnerError};
use crate::pool::command::CommandSpec;

/// Status reported for a command that could not be executed at all.
///
/// Real exit statuses are never negative, so this can't collide with one.
pub const SENTINEL_STATUS: i64 = -1;

/// How one command execution ended.
#[derive(Debug)]
pub enum Outcome {
    /// The process ran and exited on its own, with any status.
    Exited(ProcessOutput),
    /// The process could not be launched or did not exit normally.
    Failed(RunnerError),
}

impl Outcome {
    /// Exit status, or [`SENTINEL_STATUS`] for a failed execution.
    pub fn status(&self) -> i64 {
        match self {
            Outcome::Exited(out) => out.status,
            Outcome::Failed(_) => SENTINEL_STATUS,
        }
    }

    pub fn output(&self) -> &str {
        match self {
            Outcome::Exited(out) => &out.output,
            Outcome::Failed(err) => err.captured_output(),
        }
    }

    pub fn failure(&self) -> Option<&RunnerError> {
        match self {
            Outcome::Exited(_) => None,
            Outcome::Failed(err) => Some(err),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Exited(out) if out.success())
    }
}

impl From<Result<ProcessOutput, RunnerError>> for Outcome {
    fn from(result: Result<ProcessOutput, RunnerError>) -> Self {
        match result {
            Ok(out) => Outcome::Exited(out),
            Err(err) => Outcome::Failed(err),
        }
    }
}

/// What observers see for one command.
///
/// Before-callbacks get a record without an outcome; after-callbacks get the
/// same record once the command has finished.
#[derive(Debug)]
pub struct ExecutionRecord<D = ()> {
    worker: usize,
    command: Arc<CommandSpec<D>>,
    outcome: Option<Outcome>,
}

impl<D> ExecutionRecord<D> {
    pub(crate) fn new(worker: usize, command: Arc<CommandSpec<D>>) -> Self {
        Self {
            worker,
            command,
            outcome: None,
        }
    }

    pub(crate) fn complete(&mut self, outcome: Outcome) {
        self.outcome = Some(outcome);
    }

    /// 1-based index of the worker that owns this command.
    pub fn worker(&self) -> usize {
        self.worker
    }

    pub fn command(&self) -> &CommandSpec<D> {
        &self.command
    }

    pub fn command_line(&self) -> &str {
        self.command.command()
    }

    pub fn data(&self) -> Option<&D> {
        self.command.data()
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn output(&self) -> Option<&str> {
        self.outcome.as_ref().map(Outcome::output)
    }

    pub fn status(&self) -> Option<i64> {
        self.outcome.as_ref().map(Outcome::status)
    }

    pub fn failure(&self) -> Option<&RunnerError> {
        self.outcome.as_ref().and_then(Outcome::failure)
    }
}
