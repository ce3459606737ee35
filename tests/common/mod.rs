#![allow(dead_code)]

use std::sync::Arc;

use shellpool::pool::{ExecutionRecord, WorkerPool};
use shellpool_test_utils::fake_runner::FakeRunner;
use shellpool_test_utils::{push_event, EventLog};

pub use shellpool_test_utils::{event_log, events, init_tracing, with_timeout};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Pool with `workers` workers backed by `runner`.
pub fn fake_pool(workers: usize, runner: FakeRunner) -> WorkerPool {
    WorkerPool::new(workers)
        .expect("valid worker count")
        .with_runner(Arc::new(runner))
}

/// Register before/after callbacks that log `before:<cmd>@<worker>` and
/// `after:<cmd>@<worker>=<status>` to `log`.
pub fn log_callbacks(pool: &mut WorkerPool, log: &EventLog) {
    let before_log = log.clone();
    pool.register_before(move |record: &ExecutionRecord| {
        push_event(
            &before_log,
            format!("before:{}@{}", record.command_line(), record.worker()),
        );
        Ok(())
    });

    let after_log = log.clone();
    pool.register_after(move |record: &ExecutionRecord| {
        push_event(
            &after_log,
            format!(
                "after:{}@{}={}",
                record.command_line(),
                record.worker(),
                record.status().unwrap_or(i64::MIN)
            ),
        );
        Ok(())
    });
}

/// Events of one kind (`before`, `run`, `after`) in log order.
pub fn only(events: &[String], kind: &str) -> Vec<String> {
    let prefix = format!("{kind}:");
    events
        .iter()
        .filter(|e| e.starts_with(&prefix))
        .cloned()
        .collect()
}
