// src/pool/worker.rs

//! One worker: runs its bucket strictly in order, one command at a time.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::errors::{Result, ShellpoolError};
use crate::exec::ProcessRunner;
use crate::pool::callbacks::{CallbackPhase, CallbackRegistry};
use crate::pool::command::CommandSpec;
use crate::pool::record::{ExecutionRecord, Outcome};

/// Counters logged when a worker finishes its bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WorkerSummary {
    pub worker: usize,
    pub executed: usize,
    pub unsuccessful: usize,
}

pub(crate) struct Worker<D> {
    index: usize,
    bucket: Vec<Arc<CommandSpec<D>>>,
    callbacks: Arc<CallbackRegistry<D>>,
    runner: Arc<dyn ProcessRunner>,
}

impl<D: Send + Sync + 'static> Worker<D> {
    pub(crate) fn new(
        index: usize,
        bucket: Vec<Arc<CommandSpec<D>>>,
        callbacks: Arc<CallbackRegistry<D>>,
        runner: Arc<dyn ProcessRunner>,
    ) -> Self {
        Self {
            index,
            bucket,
            callbacks,
            runner,
        }
    }

    /// Execute every command in the bucket.
    ///
    /// For each command: before-callbacks, the process, then after-callbacks.
    /// Execution failures are recorded in the outcome; only a failing
    /// callback ends the loop early.
    pub(crate) async fn run(self) -> Result<WorkerSummary> {
        let Worker {
            index,
            bucket,
            callbacks,
            runner,
        } = self;

        info!(worker = index, commands = bucket.len(), "worker started");

        let mut summary = WorkerSummary {
            worker: index,
            executed: 0,
            unsuccessful: 0,
        };

        for spec in bucket {
            let mut record = ExecutionRecord::new(index, Arc::clone(&spec));
            dispatch(&callbacks, CallbackPhase::Before, &record)?;

            debug!(worker = index, cmd = %spec.command(), "running command");
            let outcome = Outcome::from(runner.run(spec.command(), spec.env()).await);

            match &outcome {
                Outcome::Exited(out) => {
                    debug!(
                        worker = index,
                        cmd = %spec.command(),
                        status = out.status,
                        "command exited"
                    );
                }
                Outcome::Failed(err) => {
                    warn!(
                        worker = index,
                        cmd = %spec.command(),
                        error = %err,
                        "command could not be executed"
                    );
                }
            }

            summary.executed += 1;
            if !outcome.is_success() {
                summary.unsuccessful += 1;
            }

            record.complete(outcome);
            dispatch(&callbacks, CallbackPhase::After, &record)?;
        }

        info!(
            worker = index,
            executed = summary.executed,
            unsuccessful = summary.unsuccessful,
            "worker finished"
        );
        Ok(summary)
    }
}

fn dispatch<D>(
    callbacks: &CallbackRegistry<D>,
    phase: CallbackPhase,
    record: &ExecutionRecord<D>,
) -> Result<()> {
    callbacks
        .dispatch(phase, record)
        .map_err(|source| ShellpoolError::Callback {
            worker: record.worker(),
            phase,
            command: record.command_line().to_string(),
            source,
        })
}
