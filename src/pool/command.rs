// src/pool/command.rs

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::warn;

use crate::errors::{Result, ShellpoolError};
use crate::types::UnknownFieldPolicy;

/// One command to execute: the command line, an environment overlay and an
/// optional caller payload.
///
/// The payload is never inspected by the pool; it is handed back through
/// [`crate::pool::ExecutionRecord::data`] so callers can correlate results.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSpec<D = ()> {
    command: String,
    env: BTreeMap<String, String>,
    data: Option<D>,
}

impl CommandSpec {
    /// Command with an empty environment overlay and no payload.
    ///
    /// Use [`CommandSpec::with_data`] to attach a payload of any type.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            env: BTreeMap::new(),
            data: None,
        }
    }
}

impl<D> CommandSpec<D> {
    /// Set one environment variable; a later call for the same key wins.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_envs<K, V>(mut self, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Fill in variables from `base` that this command doesn't set itself.
    pub fn with_env_defaults(mut self, base: &BTreeMap<String, String>) -> Self {
        for (key, value) in base {
            self.env
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        self
    }

    pub fn with_data<E>(self, data: E) -> CommandSpec<E> {
        CommandSpec {
            command: self.command,
            env: self.env,
            data: Some(data),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn data(&self) -> Option<&D> {
        self.data.as_ref()
    }
}

impl<D> From<&str> for CommandSpec<D> {
    fn from(command: &str) -> Self {
        Self::from(command.to_string())
    }
}

impl<D> From<String> for CommandSpec<D> {
    fn from(command: String) -> Self {
        Self {
            command,
            env: BTreeMap::new(),
            data: None,
        }
    }
}

impl CommandSpec<toml::Value> {
    /// Build a command from a loosely-typed option table, e.g. an inline
    /// table from a config file.
    ///
    /// Recognised keys: `cmd`/`command`, `env`/`environment`, `data`/`payload`.
    /// Anything else is handled according to `policy`.
    pub fn from_options(options: &toml::Table, policy: UnknownFieldPolicy) -> Result<Self> {
        let mut command = None;
        let mut env = None;
        let mut data = None;

        for (key, value) in options.iter() {
            match key.as_str() {
                "cmd" | "command" => {
                    let text = value.as_str().ok_or_else(|| {
                        ShellpoolError::ConfigError(format!(
                            "command field `{key}` must be a string (got {})",
                            value.type_str()
                        ))
                    })?;
                    set_once(&mut command, key, text.to_string())?;
                }
                "env" | "environment" => {
                    set_once(&mut env, key, env_from_value(key, value)?)?;
                }
                "data" | "payload" => {
                    set_once(&mut data, key, value.clone())?;
                }
                other => match policy {
                    UnknownFieldPolicy::Reject => {
                        return Err(ShellpoolError::ConfigError(format!(
                            "unknown command field `{other}`"
                        )));
                    }
                    UnknownFieldPolicy::Ignore => {
                        warn!(field = %other, "ignoring unknown command field");
                    }
                },
            }
        }

        let (_, command) = command.ok_or_else(|| {
            ShellpoolError::ConfigError("command entry is missing `cmd`".to_string())
        })?;

        Ok(Self {
            command,
            env: env.map(|(_, env)| env).unwrap_or_default(),
            data: data.map(|(_, data)| data),
        })
    }
}

/// Store `value` under `key`, failing if an alias of the same field was
/// already given.
fn set_once<'k, T>(slot: &mut Option<(&'k str, T)>, key: &'k str, value: T) -> Result<()> {
    if let Some((first, _)) = slot {
        return Err(ShellpoolError::ConfigError(format!(
            "command fields `{first}` and `{key}` set the same option"
        )));
    }
    *slot = Some((key, value));
    Ok(())
}

fn env_from_value(key: &str, value: &toml::Value) -> Result<BTreeMap<String, String>> {
    let table = value.as_table().ok_or_else(|| {
        ShellpoolError::ConfigError(format!(
            "command field `{key}` must be a table (got {})",
            value.type_str()
        ))
    })?;

    table
        .iter()
        .map(|(name, v)| {
            let text = match v {
                toml::Value::String(s) => s.clone(),
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                other => {
                    return Err(ShellpoolError::ConfigError(format!(
                        "environment variable `{name}` must be a string, integer or boolean (got {})",
                        other.type_str()
                    )));
                }
            };
            Ok((name.clone(), text))
        })
        .collect()
}

/// A command as handed to the pool: either a bare command line or a full
/// [`CommandSpec`].
///
/// Bare lines are turned into specs by [`CommandInput::normalize`] right
/// before a run partitions its work.
#[derive(Debug)]
pub enum CommandInput<D = ()> {
    Bare(String),
    Spec(Arc<CommandSpec<D>>),
}

impl<D> CommandInput<D> {
    /// Replace a bare line with its spec in place and return the spec.
    pub fn normalize(&mut self) -> Arc<CommandSpec<D>> {
        let spec = match self {
            CommandInput::Spec(spec) => return Arc::clone(spec),
            CommandInput::Bare(line) => Arc::new(CommandSpec::from(std::mem::take(line))),
        };
        *self = CommandInput::Spec(Arc::clone(&spec));
        spec
    }

    pub fn command(&self) -> &str {
        match self {
            CommandInput::Bare(line) => line,
            CommandInput::Spec(spec) => spec.command(),
        }
    }

    pub fn is_bare(&self) -> bool {
        matches!(self, CommandInput::Bare(_))
    }
}

impl<D> From<&str> for CommandInput<D> {
    fn from(line: &str) -> Self {
        CommandInput::Bare(line.to_string())
    }
}

impl<D> From<String> for CommandInput<D> {
    fn from(line: String) -> Self {
        CommandInput::Bare(line)
    }
}

impl<D> From<CommandSpec<D>> for CommandInput<D> {
    fn from(spec: CommandSpec<D>) -> Self {
        CommandInput::Spec(Arc::new(spec))
    }
}

impl<D> From<Arc<CommandSpec<D>>> for CommandInput<D> {
    fn from(spec: Arc<CommandSpec<D>>) -> Self {
        CommandInput::Spec(spec)
    }
}
