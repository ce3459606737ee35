// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod pool;
pub mod types;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, RawConfigFile, default_config_path, load_from_path};
use crate::exec::ShellRunner;
use crate::pool::{ExecutionRecord, Outcome, SENTINEL_STATUS, WorkerPool};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (plus CLI overrides)
/// - the worker pool and its shell runner
/// - reporting callbacks that print each finished command
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_config(&args)?;

    let workers = args.workers.unwrap_or(cfg.workers);
    let timeout = args.timeout.or(cfg.timeout);
    let runner = ShellRunner::new().with_timeout(timeout);

    let mut pool: WorkerPool<toml::Value> =
        WorkerPool::new(workers)?.with_runner(Arc::new(runner));
    pool.extend_commands(cfg.commands);
    pool.extend_commands(args.commands);

    if args.dry_run {
        print_dry_run(&mut pool, timeout);
        return Ok(());
    }

    let total = pool.commands().len();
    if total == 0 {
        warn!("no commands configured; nothing to do");
        return Ok(());
    }

    let unsuccessful = Arc::new(AtomicUsize::new(0));

    pool.register_before(|record| {
        debug!(
            worker = record.worker(),
            cmd = %record.command_line(),
            "command starting"
        );
        Ok(())
    });

    {
        let unsuccessful = Arc::clone(&unsuccessful);
        pool.register_after(move |record| {
            if !record.outcome().is_some_and(Outcome::is_success) {
                unsuccessful.fetch_add(1, Ordering::Relaxed);
            }
            print_record(record)?;
            Ok(())
        });
    }

    pool.run().await?;

    let failed = unsuccessful.load(Ordering::Relaxed);
    if failed > 0 {
        bail!("{failed} of {total} commands did not succeed");
    }

    info!(commands = total, "all commands succeeded");
    Ok(())
}

/// Pick the config source:
/// - `--config PATH` if given,
/// - otherwise `Shellpool.toml`, unless commands were passed on the command
///   line, in which case defaults are used.
///
/// `--unknown-fields` replaces `[pool].unknown_fields` before validation.
fn load_config(args: &CliArgs) -> Result<ConfigFile> {
    let path = match (&args.config, args.commands.is_empty()) {
        (Some(path), _) => Some(PathBuf::from(path)),
        (None, true) => Some(default_config_path()),
        (None, false) => None,
    };

    let mut raw = match &path {
        Some(path) => load_from_path(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => RawConfigFile::default(),
    };
    if let Some(policy) = args.unknown_fields {
        raw.pool.unknown_fields = policy;
    }

    ConfigFile::try_from(raw).with_context(|| match &path {
        Some(path) => format!("validating config from {}", path.display()),
        None => "validating default config".to_string(),
    })
}

/// Print one finished command; output blocks from different workers never
/// interleave because stdout stays locked for the whole block.
fn print_record(record: &ExecutionRecord<toml::Value>) -> std::io::Result<()> {
    let mut out = std::io::stdout().lock();

    match record.outcome() {
        Some(Outcome::Exited(process)) => writeln!(
            out,
            "[worker {}] $ {} (exit {})",
            record.worker(),
            record.command_line(),
            process.status
        )?,
        Some(Outcome::Failed(err)) => writeln!(
            out,
            "[worker {}] $ {} (failed: {err}; status {SENTINEL_STATUS})",
            record.worker(),
            record.command_line()
        )?,
        None => return Ok(()),
    }

    let output = record.output().unwrap_or_default();
    if !output.is_empty() {
        out.write_all(output.as_bytes())?;
        if !output.ends_with('\n') {
            writeln!(out)?;
        }
    }
    out.flush()
}

/// Simple dry-run output: print each worker's bucket.
fn print_dry_run(pool: &mut WorkerPool<toml::Value>, timeout: Option<Duration>) {
    let buckets = pool.plan();

    println!("shellpool dry-run");
    println!("  workers = {}", pool.worker_count());
    if let Some(limit) = timeout {
        println!("  timeout = {limit:?}");
    }
    let idle = pool.worker_count() - buckets.len();
    if idle > 0 {
        println!("  idle workers = {idle}");
    }
    println!();

    for (i, bucket) in buckets.iter().enumerate() {
        println!("worker {} ({} commands):", i + 1, bucket.len());
        for spec in bucket {
            println!("  - {}", spec.command());
            if !spec.env().is_empty() {
                println!("      env: {:?}", spec.env());
            }
            if let Some(data) = spec.data() {
                println!("      data: {data}");
            }
        }
    }

    debug!("dry-run complete (no execution)");
}
