// src/config/validate.rs

use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, ShellpoolError};
use crate::pool::CommandSpec;
use crate::types::UnknownFieldPolicy;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = ShellpoolError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        if raw.pool.workers == 0 {
            return Err(ShellpoolError::ConfigError(
                "[pool].workers must be >= 1 (got 0)".to_string(),
            ));
        }

        let timeout = raw
            .pool
            .timeout
            .as_deref()
            .map(|s| {
                parse_duration(s)
                    .map_err(|e| ShellpoolError::ConfigError(format!("[pool].timeout: {e}")))
            })
            .transpose()?;

        let commands = raw
            .commands
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                command_from_entry(entry, raw.pool.unknown_fields, &raw.default.env).map_err(
                    |e| match e {
                        ShellpoolError::ConfigError(msg) => {
                            ShellpoolError::ConfigError(format!("commands[{i}]: {msg}"))
                        }
                        other => other,
                    },
                )
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ConfigFile {
            workers: raw.pool.workers,
            timeout,
            commands,
        })
    }
}

fn command_from_entry(
    entry: &toml::Value,
    policy: UnknownFieldPolicy,
    base_env: &BTreeMap<String, String>,
) -> Result<CommandSpec<toml::Value>> {
    let spec = match entry {
        toml::Value::String(line) => CommandSpec::from(line.as_str()),
        toml::Value::Table(options) => CommandSpec::from_options(options, policy)?,
        other => {
            return Err(ShellpoolError::ConfigError(format!(
                "expected a command string or table (got {})",
                other.type_str()
            )));
        }
    };
    Ok(spec.with_env_defaults(base_env))
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };

    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration too large: '{s}'"))
}
