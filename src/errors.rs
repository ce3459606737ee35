// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::pool::CallbackPhase;

#[derive(Error, Debug)]
pub enum ShellpoolError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("worker count must be >= 1 (got {0})")]
    InvalidWorkerCount(usize),

    /// A before/after callback returned an error. The worker that ran it
    /// stopped without executing the rest of its bucket.
    #[error("{phase} callback failed on worker {worker} for command `{command}`: {source}")]
    Callback {
        worker: usize,
        phase: CallbackPhase,
        command: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("worker {worker} panicked: {message}")]
    WorkerPanicked { worker: usize, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ShellpoolError>;
