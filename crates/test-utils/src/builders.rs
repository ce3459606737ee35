#![allow(dead_code)]

use std::collections::BTreeMap;

/// Builder for config TOML text, to simplify config test setup.
pub struct ConfigTomlBuilder {
    commands: Vec<String>,
    pool: Vec<String>,
    default_env: BTreeMap<String, String>,
}

impl ConfigTomlBuilder {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            pool: Vec::new(),
            default_env: BTreeMap::new(),
        }
    }

    /// A bare command line entry.
    pub fn command(mut self, line: &str) -> Self {
        self.commands.push(toml_string(line));
        self
    }

    /// An inline-table entry, given as raw TOML (e.g. `{ cmd = "true" }`).
    pub fn command_table(mut self, inline_table: &str) -> Self {
        self.commands.push(inline_table.to_string());
        self
    }

    pub fn workers(mut self, n: usize) -> Self {
        self.pool.push(format!("workers = {n}"));
        self
    }

    pub fn timeout(mut self, duration: &str) -> Self {
        self.pool.push(format!("timeout = {}", toml_string(duration)));
        self
    }

    pub fn unknown_fields(mut self, policy: &str) -> Self {
        self.pool.push(format!("unknown_fields = {}", toml_string(policy)));
        self
    }

    pub fn default_env(mut self, key: &str, value: &str) -> Self {
        self.default_env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> String {
        let mut out = String::new();
        out.push_str("commands = [\n");
        for entry in &self.commands {
            out.push_str(&format!("  {entry},\n"));
        }
        out.push_str("]\n");

        if !self.pool.is_empty() {
            out.push_str("\n[pool]\n");
            for line in &self.pool {
                out.push_str(line);
                out.push('\n');
            }
        }

        if !self.default_env.is_empty() {
            out.push_str("\n[default.env]\n");
            for (k, v) in &self.default_env {
                out.push_str(&format!("{k} = {}\n", toml_string(v)));
            }
        }

        out
    }
}

impl Default for ConfigTomlBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn toml_string(s: &str) -> String {
    toml::Value::String(s.to_string()).to_string()
}
