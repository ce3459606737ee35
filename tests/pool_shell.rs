// tests/pool_shell.rs

//! End-to-end runs against real processes.

#![cfg(unix)]

mod common;
use crate::common::{init_tracing, with_timeout, TestResult};

use std::sync::{Arc, Mutex};

use shellpool::pool::{CommandSpec, ExecutionRecord, WorkerPool, SENTINEL_STATUS};

type Seen = Arc<Mutex<Vec<(usize, String, String, i64)>>>;

fn collect_after(pool: &mut WorkerPool) -> Seen {
    let seen: Seen = Arc::default();
    let sink = Arc::clone(&seen);
    pool.register_after(move |record: &ExecutionRecord| {
        sink.lock().unwrap().push((
            record.worker(),
            record.command_line().to_string(),
            record.output().unwrap_or_default().to_string(),
            record.status().unwrap_or(i64::MIN),
        ));
        Ok(())
    });
    seen
}

#[tokio::test]
async fn echo_commands_split_across_two_workers() -> TestResult {
    init_tracing();

    let mut pool: WorkerPool = WorkerPool::new(2)?;
    pool.extend_commands(["echo A", "echo B", "echo C", "echo D"]);
    let seen = collect_after(&mut pool);

    with_timeout(pool.run()).await?;

    let seen = seen.lock().unwrap();
    let for_worker = |w: usize| -> Vec<(String, String, i64)> {
        seen.iter()
            .filter(|(worker, ..)| *worker == w)
            .map(|(_, cmd, out, status)| (cmd.clone(), out.clone(), *status))
            .collect()
    };

    assert_eq!(
        for_worker(1),
        vec![
            ("echo A".to_string(), "A\n".to_string(), 0),
            ("echo C".to_string(), "C\n".to_string(), 0),
        ]
    );
    assert_eq!(
        for_worker(2),
        vec![
            ("echo B".to_string(), "B\n".to_string(), 0),
            ("echo D".to_string(), "D\n".to_string(), 0),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn true_then_false_on_one_worker() -> TestResult {
    init_tracing();

    let mut pool: WorkerPool = WorkerPool::new(1)?;
    pool.extend_commands(["true", "false"]);
    let seen = collect_after(&mut pool);

    with_timeout(pool.run()).await?;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!((seen[0].0, seen[0].1.as_str(), seen[0].3), (1, "true", 0));
    assert_eq!((seen[1].0, seen[1].1.as_str()), (1, "false"));
    assert_ne!(seen[1].3, 0);
    assert_ne!(seen[1].3, SENTINEL_STATUS);
    Ok(())
}

#[tokio::test]
async fn missing_executable_gets_sentinel_and_failure_detail() -> TestResult {
    init_tracing();

    let mut pool: WorkerPool = WorkerPool::new(1)?;
    pool.extend_commands(["shellpool-no-such-program", "echo still-running"]);

    let befores = Arc::new(Mutex::new(0usize));
    {
        let befores = Arc::clone(&befores);
        pool.register_before(move |_: &ExecutionRecord| {
            *befores.lock().unwrap() += 1;
            Ok(())
        });
    }
    let details: Arc<Mutex<Vec<Option<String>>>> = Arc::default();
    {
        let details = Arc::clone(&details);
        pool.register_after(move |record: &ExecutionRecord| {
            details
                .lock()
                .unwrap()
                .push(record.failure().map(|e| e.to_string()));
            Ok(())
        });
    }
    let seen = collect_after(&mut pool);

    with_timeout(pool.run()).await?;

    assert_eq!(*befores.lock().unwrap(), 2);

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].1, "shellpool-no-such-program");
    assert_eq!(seen[0].3, SENTINEL_STATUS);
    assert_eq!(seen[1].2, "still-running\n");
    assert_eq!(seen[1].3, 0);

    let details = details.lock().unwrap();
    assert!(details[0].as_deref().is_some_and(|d| d.contains("failed to launch")));
    assert!(details[1].is_none());
    Ok(())
}

#[tokio::test]
async fn spec_environment_reaches_the_process() -> TestResult {
    init_tracing();

    let mut pool: WorkerPool = WorkerPool::new(3)?;
    pool.add_command(CommandSpec::new("echo $SHELLPOOL_WHO").with_env("SHELLPOOL_WHO", "worker-pool"));
    let seen = collect_after(&mut pool);

    with_timeout(pool.run()).await?;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].2, "worker-pool\n");
    Ok(())
}
