//! Utility functions and helpers

use std::fmt::Display;
use std::str::FromStr;

use crate::error::{AppError, Result};

/// Reads `key` from the environment and parses it, falling back to `default`
/// when the variable is unset or blank.
pub(crate) fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env_opt(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| AppError::Config(format!("{}={:?}: {}", key, raw, e))),
        None => Ok(default),
    }
}

/// Reads `key` from the environment, treating blank values as unset.
pub(crate) fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
