// tests/pool_fake_runner.rs

mod common;
use crate::common::{event_log, events, fake_pool, init_tracing, log_callbacks, only, with_timeout, TestResult};

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use shellpool::errors::ShellpoolError;
use shellpool::pool::{CommandSpec, ExecutionRecord, WorkerPool, SENTINEL_STATUS};
use shellpool_test_utils::fake_runner::{FakeResponse, FakeRunner};

fn position(events: &[String], event: &str) -> usize {
    events
        .iter()
        .position(|e| e == event)
        .unwrap_or_else(|| panic!("missing event {event:?} in {events:?}"))
}

#[tokio::test]
async fn each_command_is_wrapped_by_its_callbacks_on_its_own_worker() -> TestResult {
    init_tracing();

    let log = event_log();
    let mut pool = fake_pool(2, FakeRunner::new(log.clone()));
    pool.extend_commands(["echo A", "echo B", "echo C", "echo D"]);
    log_callbacks(&mut pool, &log);

    with_timeout(pool.run()).await?;

    let events = events(&log);
    assert_eq!(events.len(), 12, "{events:?}");

    for (cmd, worker) in [("echo A", 1), ("echo B", 2), ("echo C", 1), ("echo D", 2)] {
        let before = position(&events, &format!("before:{cmd}@{worker}"));
        let run = position(&events, &format!("run:{cmd}"));
        let after = position(&events, &format!("after:{cmd}@{worker}=0"));
        assert!(before < run && run < after, "{cmd}: {events:?}");
    }

    // Within a worker, the next command starts only after the previous one's
    // after-callbacks.
    assert!(position(&events, "after:echo A@1=0") < position(&events, "before:echo C@1"));
    assert!(position(&events, "after:echo B@2=0") < position(&events, "before:echo D@2"));
    Ok(())
}

#[tokio::test]
async fn records_carry_output_status_and_worker_index() -> TestResult {
    init_tracing();

    let seen: Arc<Mutex<HashMap<String, (usize, String, i64)>>> = Arc::default();
    let mut pool = fake_pool(2, FakeRunner::new(event_log()));
    pool.extend_commands(["echo A", "echo B", "echo C", "echo D"]);
    {
        let seen = Arc::clone(&seen);
        pool.register_after(move |record: &ExecutionRecord| {
            let previous = seen.lock().unwrap().insert(
                record.command_line().to_string(),
                (
                    record.worker(),
                    record.output().unwrap_or_default().to_string(),
                    record.status().unwrap_or(i64::MIN),
                ),
            );
            assert!(previous.is_none(), "record produced twice");
            Ok(())
        });
    }

    with_timeout(pool.run()).await?;

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 4);
    assert_eq!(seen["echo A"], (1, "echo A\n".to_string(), 0));
    assert_eq!(seen["echo B"], (2, "echo B\n".to_string(), 0));
    assert_eq!(seen["echo C"], (1, "echo C\n".to_string(), 0));
    assert_eq!(seen["echo D"], (2, "echo D\n".to_string(), 0));
    Ok(())
}

#[tokio::test]
async fn empty_command_list_returns_without_callbacks() -> TestResult {
    init_tracing();

    let log = event_log();
    let mut pool = fake_pool(3, FakeRunner::new(log.clone()));
    log_callbacks(&mut pool, &log);

    with_timeout(pool.run()).await?;

    assert!(events(&log).is_empty());
    Ok(())
}

#[tokio::test]
async fn surplus_workers_spawn_nothing() -> TestResult {
    init_tracing();

    let log = event_log();
    let runner = FakeRunner::new(log.clone()).with_delay(Duration::from_millis(100));
    let max_in_flight = runner.max_in_flight();
    let mut pool = fake_pool(5, runner);
    pool.extend_commands(["a", "b", "c"]);

    let workers: Arc<Mutex<BTreeSet<usize>>> = Arc::default();
    {
        let workers = Arc::clone(&workers);
        pool.register_before(move |record: &ExecutionRecord| {
            workers.lock().unwrap().insert(record.worker());
            Ok(())
        });
    }

    with_timeout(pool.run()).await?;

    assert_eq!(
        workers.lock().unwrap().iter().copied().collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
    assert_eq!(max_in_flight.load(Ordering::SeqCst), 3);
    Ok(())
}

#[tokio::test]
async fn never_more_commands_in_flight_than_workers() -> TestResult {
    init_tracing();

    let runner = FakeRunner::new(event_log()).with_delay(Duration::from_millis(50));
    let max_in_flight = runner.max_in_flight();
    let mut pool = fake_pool(2, runner);
    pool.extend_commands(["1", "2", "3", "4", "5", "6"]);

    with_timeout(pool.run()).await?;

    assert_eq!(max_in_flight.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn single_worker_runs_sequentially_in_input_order() -> TestResult {
    init_tracing();

    let log = event_log();
    let runner = FakeRunner::new(log.clone()).exit("false", "", 1);
    let mut pool = fake_pool(1, runner);
    pool.extend_commands(["true", "false"]);
    log_callbacks(&mut pool, &log);

    with_timeout(pool.run()).await?;

    assert_eq!(
        events(&log),
        vec![
            "before:true@1",
            "run:true",
            "after:true@1=0",
            "before:false@1",
            "run:false",
            "after:false@1=1",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn callbacks_run_in_registration_order() -> TestResult {
    init_tracing();

    let log = event_log();
    let mut pool = fake_pool(1, FakeRunner::new(log.clone()));
    pool.add_command("only");

    for name in ["first", "second", "third"] {
        let before_log = log.clone();
        pool.register_before(move |_: &ExecutionRecord| {
            before_log.lock().unwrap().push(format!("before-{name}"));
            Ok(())
        });
        let after_log = log.clone();
        pool.register_after(move |_: &ExecutionRecord| {
            after_log.lock().unwrap().push(format!("after-{name}"));
            Ok(())
        });
    }
    assert_eq!(pool.callbacks().before_len(), 3);
    assert_eq!(pool.callbacks().after_len(), 3);

    with_timeout(pool.run()).await?;

    assert_eq!(
        events(&log),
        vec![
            "before-first",
            "before-second",
            "before-third",
            "run:only",
            "after-first",
            "after-second",
            "after-third",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn launch_failure_reports_sentinel_status_and_detail() -> TestResult {
    init_tracing();

    let log = event_log();
    let runner = FakeRunner::new(log.clone())
        .respond("no-such-binary", FakeResponse::LaunchFailure("not found".into()));
    let mut pool = fake_pool(1, runner);
    pool.extend_commands(["no-such-binary", "after-it"]);
    log_callbacks(&mut pool, &log);

    let failure: Arc<Mutex<Option<String>>> = Arc::default();
    {
        let failure = Arc::clone(&failure);
        pool.register_after(move |record: &ExecutionRecord| {
            if let Some(err) = record.failure() {
                *failure.lock().unwrap() = Some(err.to_string());
            }
            Ok(())
        });
    }

    with_timeout(pool.run()).await?;

    let events = events(&log);
    assert_eq!(
        only(&events, "after"),
        vec![
            format!("after:no-such-binary@1={SENTINEL_STATUS}"),
            "after:after-it@1=0".to_string(),
        ]
    );
    assert_eq!(only(&events, "before").len(), 2);

    let detail = failure.lock().unwrap().clone().expect("failure detail");
    assert!(detail.contains("failed to launch"), "{detail}");
    assert!(detail.contains("not found"), "{detail}");
    Ok(())
}

#[tokio::test]
async fn timed_out_command_is_a_failure_with_sentinel() -> TestResult {
    init_tracing();

    let runner = FakeRunner::new(event_log())
        .respond("slow", FakeResponse::TimedOut(Duration::from_secs(1)));
    let mut pool = fake_pool(1, runner);
    pool.add_command("slow");

    let statuses: Arc<Mutex<Vec<(i64, bool)>>> = Arc::default();
    {
        let statuses = Arc::clone(&statuses);
        pool.register_after(move |record: &ExecutionRecord| {
            let is_failure = record.failure().is_some();
            statuses
                .lock()
                .unwrap()
                .push((record.status().unwrap_or_default(), is_failure));
            Ok(())
        });
    }

    with_timeout(pool.run()).await?;

    assert_eq!(*statuses.lock().unwrap(), vec![(SENTINEL_STATUS, true)]);
    Ok(())
}

#[tokio::test]
async fn payload_and_env_pass_through_untouched() -> TestResult {
    init_tracing();

    let runner = Arc::new(FakeRunner::new(event_log()));
    let mut pool: WorkerPool<(u32, &'static str)> = WorkerPool::new(2)?.with_runner(runner.clone());
    pool.add_command(
        CommandSpec::new("deploy")
            .with_env("STAGE", "prod")
            .with_data((7u32, "ticket-7")),
    );
    pool.add_command("plain");

    let payloads: Arc<Mutex<Vec<Option<(u32, &'static str)>>>> = Arc::default();
    {
        let payloads = Arc::clone(&payloads);
        pool.register_after(move |record| {
            payloads.lock().unwrap().push(record.data().copied());
            Ok(())
        });
    }

    with_timeout(pool.run()).await?;

    let mut payloads = payloads.lock().unwrap().clone();
    payloads.sort();
    assert_eq!(payloads, vec![None, Some((7, "ticket-7"))]);

    let envs = runner.seen_envs();
    let deploy_env = envs
        .iter()
        .find(|(cmd, _)| cmd == "deploy")
        .map(|(_, env)| env.clone())
        .expect("deploy ran");
    assert_eq!(deploy_env.get("STAGE").map(String::as_str), Some("prod"));
    assert!(envs.iter().any(|(cmd, env)| cmd == "plain" && env.is_empty()));
    Ok(())
}

#[tokio::test]
async fn running_twice_executes_everything_twice() -> TestResult {
    init_tracing();

    let log = event_log();
    let mut pool = fake_pool(2, FakeRunner::new(log.clone()));
    pool.extend_commands(["x", "y", "z"]);

    with_timeout(pool.run()).await?;
    with_timeout(pool.run()).await?;

    let runs = only(&events(&log), "run");
    assert_eq!(runs.len(), 6);
    for cmd in ["run:x", "run:y", "run:z"] {
        assert_eq!(runs.iter().filter(|e| *e == cmd).count(), 2);
    }
    Ok(())
}

#[tokio::test]
async fn worker_count_far_above_command_count_runs_normally() -> TestResult {
    init_tracing();

    let log = event_log();
    let mut pool = fake_pool(usize::MAX, FakeRunner::new(log.clone()));
    log_callbacks(&mut pool, &log);
    pool.add_command("true");

    with_timeout(pool.run()).await?;

    assert_eq!(only(&events(&log), "after"), vec!["after:true@1=0"]);
    Ok(())
}

#[tokio::test]
async fn cancelling_run_stops_its_workers() -> TestResult {
    init_tracing();

    let log = event_log();
    let runner = FakeRunner::new(log.clone()).with_delay(Duration::from_millis(200));
    let mut pool = fake_pool(1, runner);
    log_callbacks(&mut pool, &log);
    pool.extend_commands(["slow", "next"]);

    let cancelled = tokio::time::timeout(Duration::from_millis(50), pool.run()).await;
    assert!(cancelled.is_err(), "run should still be busy with `slow`");
    drop(pool);

    tokio::time::sleep(Duration::from_millis(500)).await;

    let events = events(&log);
    assert_eq!(only(&events, "before"), vec!["before:slow@1"]);
    assert!(only(&events, "after").is_empty(), "{events:?}");
    assert!(!events.iter().any(|e| e == "run:next"), "{events:?}");
    Ok(())
}

#[test]
fn zero_workers_is_rejected() {
    let err = WorkerPool::<()>::new(0).unwrap_err();
    assert!(matches!(err, ShellpoolError::InvalidWorkerCount(0)));

    let mut pool: WorkerPool = WorkerPool::default();
    assert_eq!(pool.worker_count(), 3);
    assert!(pool.set_worker_count(0).is_err());
    assert_eq!(pool.worker_count(), 3);
}
