// src/pool/coordinator.rs

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

use crate::errors::{Result, ShellpoolError};
use crate::exec::{ProcessRunner, ShellRunner};
use crate::pool::callbacks::{CallbackRegistry, CallbackResult};
use crate::pool::command::{CommandInput, CommandSpec};
use crate::pool::partition::partition;
use crate::pool::record::ExecutionRecord;
use crate::pool::worker::{Worker, WorkerSummary};

pub const DEFAULT_WORKER_COUNT: usize = 3;

/// Runs a fixed list of commands on at most `worker_count` concurrent
/// workers.
///
/// Commands are split round-robin by input position before anything runs;
/// there is no shared queue and no rebalancing. Each worker is a tokio task
/// that runs its share sequentially.
///
/// ```no_run
/// # async fn demo() -> shellpool::errors::Result<()> {
/// use shellpool::pool::{CommandSpec, WorkerPool};
///
/// let mut pool: WorkerPool = WorkerPool::new(2)?;
/// pool.add_command("echo A");
/// pool.add_command(CommandSpec::new("echo $NAME").with_env("NAME", "B"));
/// pool.register_after(|record| {
///     println!("{} -> {:?}", record.command_line(), record.status());
///     Ok(())
/// });
/// pool.run().await?;
/// # Ok(())
/// # }
/// ```
pub struct WorkerPool<D = ()> {
    worker_count: NonZeroUsize,
    commands: Vec<CommandInput<D>>,
    callbacks: CallbackRegistry<D>,
    runner: Arc<dyn ProcessRunner>,
}

impl<D> fmt::Debug for WorkerPool<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerPool")
            .field("worker_count", &self.worker_count)
            .field("commands", &self.commands.len())
            .field("callbacks", &self.callbacks)
            .finish_non_exhaustive()
    }
}

impl<D> Default for WorkerPool<D> {
    fn default() -> Self {
        Self {
            worker_count: NonZeroUsize::new(DEFAULT_WORKER_COUNT).unwrap_or(NonZeroUsize::MIN),
            commands: Vec::new(),
            callbacks: CallbackRegistry::new(),
            runner: Arc::new(ShellRunner::new()),
        }
    }
}

impl<D: Send + Sync + 'static> WorkerPool<D> {
    pub fn new(worker_count: usize) -> Result<Self> {
        let mut pool = Self::default();
        pool.set_worker_count(worker_count)?;
        Ok(pool)
    }

    /// Replace the process backend (the default is [`ShellRunner`]).
    pub fn with_runner(mut self, runner: Arc<dyn ProcessRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count.get()
    }

    pub fn set_worker_count(&mut self, worker_count: usize) -> Result<()> {
        self.worker_count = NonZeroUsize::new(worker_count)
            .ok_or(ShellpoolError::InvalidWorkerCount(worker_count))?;
        Ok(())
    }

    pub fn add_command(&mut self, command: impl Into<CommandInput<D>>) {
        self.commands.push(command.into());
    }

    pub fn extend_commands<C>(&mut self, commands: impl IntoIterator<Item = C>)
    where
        C: Into<CommandInput<D>>,
    {
        self.commands.extend(commands.into_iter().map(Into::into));
    }

    pub fn commands(&self) -> &[CommandInput<D>] {
        &self.commands
    }

    pub fn callbacks(&self) -> &CallbackRegistry<D> {
        &self.callbacks
    }

    /// Observer called before each command is launched.
    pub fn register_before<F>(&mut self, callback: F)
    where
        F: Fn(&ExecutionRecord<D>) -> CallbackResult + Send + Sync + 'static,
    {
        self.callbacks.register_before(callback);
    }

    /// Observer called after each command has finished, with its outcome.
    pub fn register_after<F>(&mut self, callback: F)
    where
        F: Fn(&ExecutionRecord<D>) -> CallbackResult + Send + Sync + 'static,
    {
        self.callbacks.register_after(callback);
    }

    /// Normalise the command list and return the buckets a run would execute.
    ///
    /// Bucket `i` belongs to worker `i + 1`. Workers beyond the returned
    /// buckets would be idle and are not listed.
    pub fn plan(&mut self) -> Vec<Vec<Arc<CommandSpec<D>>>> {
        let specs: Vec<_> = self.commands.iter_mut().map(CommandInput::normalize).collect();
        partition(specs, self.worker_count)
    }

    /// Execute every command and wait for all workers to finish.
    ///
    /// `Ok(())` means every worker got through its bucket; it says nothing
    /// about exit statuses, which are only visible to after-callbacks.
    /// If a callback fails (or panics) its worker stops early; the remaining
    /// workers still run to completion and the first such failure, in worker
    /// order, is returned once everything has been joined.
    ///
    /// Calling `run` again executes the whole list again. Dropping the
    /// returned future before it completes aborts the workers.
    pub async fn run(&mut self) -> Result<()> {
        let buckets = self.plan();
        let total: usize = buckets.iter().map(Vec::len).sum();
        if total == 0 {
            debug!("no commands to run");
            return Ok(());
        }

        info!(
            commands = total,
            workers = self.worker_count.get(),
            "starting run"
        );

        // Snapshot: callbacks are fixed for the duration of the run.
        let callbacks = Arc::new(self.callbacks.clone());

        let mut workers = SpawnedWorkers::default();
        for (i, bucket) in buckets.into_iter().enumerate() {
            if bucket.is_empty() {
                continue;
            }
            let index = i + 1;
            let worker = Worker::new(
                index,
                bucket,
                Arc::clone(&callbacks),
                Arc::clone(&self.runner),
            );
            workers.handles.push((index, tokio::spawn(worker.run())));
        }

        debug!(spawned = workers.handles.len(), "workers launched");

        let mut first_failure = None;
        for (worker, handle) in workers.handles.iter_mut() {
            let worker = *worker;
            let failure = match handle.await {
                Ok(Ok(summary)) => {
                    debug!(
                        worker = summary.worker,
                        executed = summary.executed,
                        unsuccessful = summary.unsuccessful,
                        "worker joined"
                    );
                    continue;
                }
                Ok(Err(err)) => err,
                Err(join_err) => ShellpoolError::WorkerPanicked {
                    worker,
                    message: panic_message(join_err),
                },
            };
            warn!(worker, error = %failure, "worker stopped early");
            first_failure.get_or_insert(failure);
        }

        info!("run finished");
        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Worker tasks of one run. Dropping this (for example when the `run`
/// future is cancelled) aborts every task that is still going, which in turn
/// drops and kills any child process it was waiting on.
#[derive(Default)]
struct SpawnedWorkers {
    handles: Vec<(usize, JoinHandle<Result<WorkerSummary>>)>,
}

impl Drop for SpawnedWorkers {
    fn drop(&mut self) {
        for (_, handle) in &self.handles {
            handle.abort();
        }
    }
}

fn panic_message(err: JoinError) -> String {
    match err.try_into_panic() {
        Ok(payload) => payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string()),
        Err(err) => err.to_string(),
    }
}
