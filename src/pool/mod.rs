// src/pool/mod.rs

//! Static worker pool.
//!
//! Responsibilities:
//! - Describe commands and normalise bare command lines (`command.rs`).
//! - Split the command list into per-worker buckets (`partition.rs`).
//! - Hold the ordered before/after observers (`callbacks.rs`).
//! - Carry per-command identity and outcome to observers (`record.rs`).
//! - Run one bucket sequentially (`worker.rs`).
//! - Launch every worker and wait for all of them (`coordinator.rs`).

pub mod callbacks;
pub mod command;
pub mod coordinator;
pub mod partition;
pub mod record;
mod worker;

pub use callbacks::{Callback, CallbackPhase, CallbackRegistry, CallbackResult};
pub use command::{CommandInput, CommandSpec};
pub use coordinator::{DEFAULT_WORKER_COUNT, WorkerPool};
pub use partition::partition;
pub use record::{ExecutionRecord, Outcome, SENTINEL_STATUS};
