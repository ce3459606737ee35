// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::pool::{CommandSpec, DEFAULT_WORKER_COUNT};
use crate::types::UnknownFieldPolicy;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// commands = [
///   "echo A",
///   { cmd = "echo $GREETING", env = { GREETING = "hi" }, data = 7 },
/// ]
///
/// [pool]
/// workers = 2
/// timeout = "30s"
/// unknown_fields = "reject"
///
/// [default]
/// env = { CI = "1" }
/// ```
///
/// `commands` must come before the first `[section]` header, as TOML
/// requires for top-level keys. All sections are optional.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    /// Bare command lines or inline tables, in execution order.
    #[serde(default)]
    pub commands: Vec<toml::Value>,

    #[serde(default)]
    pub pool: PoolSection,

    #[serde(default)]
    pub default: DefaultSection,
}

/// `[pool]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoolSection {
    /// Number of workers; must be >= 1.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Optional per-command deadline, e.g. `"250ms"`, `"30s"`, `"5m"`.
    #[serde(default)]
    pub timeout: Option<String>,

    /// How unrecognised keys in command tables are treated.
    #[serde(default)]
    pub unknown_fields: UnknownFieldPolicy,
}

fn default_workers() -> usize {
    DEFAULT_WORKER_COUNT
}

impl Default for PoolSection {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            timeout: None,
            unknown_fields: UnknownFieldPolicy::default(),
        }
    }
}

/// `[default]` section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct DefaultSection {
    /// Environment applied to every command; per-command `env` wins.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// Validated configuration, ready to feed a [`crate::pool::WorkerPool`].
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub workers: usize,
    pub timeout: Option<Duration>,
    pub commands: Vec<CommandSpec<toml::Value>>,
}
