use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use shellpool::exec::{ProcessOutput, ProcessRunner, RunFuture, RunnerError};

use crate::{push_event, EventLog};

/// Scripted reply for one command line.
#[derive(Debug, Clone)]
pub enum FakeResponse {
    Exit { output: String, status: i64 },
    LaunchFailure(String),
    TimedOut(Duration),
}

/// A fake runner that:
/// - logs `run:<command>` to the shared event log when a command "starts"
/// - replies from a script, or with `<command>\n` and status 0 by default
/// - tracks how many commands were in flight at once.
pub struct FakeRunner {
    log: EventLog,
    responses: HashMap<String, FakeResponse>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: Arc<AtomicUsize>,
    envs: std::sync::Mutex<Vec<(String, BTreeMap<String, String>)>>,
}

impl FakeRunner {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            responses: HashMap::new(),
            delay: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            envs: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn respond(mut self, command: &str, response: FakeResponse) -> Self {
        self.responses.insert(command.to_string(), response);
        self
    }

    pub fn exit(self, command: &str, output: &str, status: i64) -> Self {
        self.respond(
            command,
            FakeResponse::Exit {
                output: output.to_string(),
                status,
            },
        )
    }

    /// Sleep this long inside every command, so workers overlap.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Handle to the highest number of concurrently running commands seen.
    pub fn max_in_flight(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.max_in_flight)
    }

    /// Environment overlays seen, in launch order.
    pub fn seen_envs(&self) -> Vec<(String, BTreeMap<String, String>)> {
        self.envs.lock().unwrap().clone()
    }

    fn reply(&self, command: &str) -> Result<ProcessOutput, RunnerError> {
        match self.responses.get(command) {
            Some(FakeResponse::Exit { output, status }) => {
                Ok(ProcessOutput::new(output.clone(), *status))
            }
            Some(FakeResponse::LaunchFailure(msg)) => Err(RunnerError::Spawn {
                source: std::io::Error::new(std::io::ErrorKind::NotFound, msg.clone()),
            }),
            Some(FakeResponse::TimedOut(limit)) => Err(RunnerError::TimedOut {
                limit: *limit,
                output: String::new(),
            }),
            None => Ok(ProcessOutput::new(format!("{command}\n"), 0)),
        }
    }
}

impl ProcessRunner for FakeRunner {
    fn run<'a>(&'a self, command: &'a str, env: &'a BTreeMap<String, String>) -> RunFuture<'a> {
        Box::pin(async move {
            push_event(&self.log, format!("run:{command}"));
            self.envs
                .lock()
                .unwrap()
                .push((command.to_string(), env.clone()));

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.reply(command)
        })
    }
}
