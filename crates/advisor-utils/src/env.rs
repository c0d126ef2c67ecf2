//! Typed environment-variable lookup

use std::str::FromStr;
use thiserror::Error;

/// An environment variable was set but could not be parsed
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid value for {name}: {value:?} ({reason})")]
pub struct EnvError {
    /// Variable name
    pub name: String,
    /// Raw value found
    pub value: String,
    /// Parser message
    pub reason: String,
}

/// Value of `name`, trimmed; `None` when unset or blank
pub fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Value of `name`, or `default` when unset or blank
pub fn env_or(name: &str, default: &str) -> String {
    env_string(name).unwrap_or_else(|| default.to_string())
}

/// Parse `name` into `T`; `Ok(None)` when unset or blank
pub fn env_parse<T>(name: &str) -> Result<Option<T>, EnvError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_string(name)
        .map(|value| {
            value.parse::<T>().map_err(|e| EnvError {
                name: name.to_string(),
                value: value.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()
}
