use std::str::FromStr;
use serde::Deserialize;

/// What to do with unrecognised fields when building a command from a
/// loosely-typed option table.
///
/// - `Reject`: fail with a configuration error naming the field (default).
/// - `Ignore`: skip the field and log a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownFieldPolicy {
    Reject,
    Ignore,
}

impl Default for UnknownFieldPolicy {
    fn default() -> Self {
        UnknownFieldPolicy::Reject
    }
}

impl FromStr for UnknownFieldPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reject" => Ok(UnknownFieldPolicy::Reject),
            "ignore" => Ok(UnknownFieldPolicy::Ignore),
            other => Err(format!(
                "invalid unknown_fields policy: {other} (expected \"reject\" or \"ignore\")"
            )),
        }
    }
}
