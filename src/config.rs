//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::UNLIMITED_ITEM_BYTES;
use crate::error::{CacheError, Result};

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Total byte budget for cached values
    pub capacity_bytes: u64,
    /// Lifetime of each entry after insertion, in milliseconds
    pub ttl_ms: u64,
    /// Per-entry cap in bytes; negative means unlimited
    pub max_item_bytes: i64,
    /// Background cleanup interval in milliseconds; 0 disables the sweep
    pub cleanup_interval_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY_BYTES` - Total byte budget (default: 64 MiB)
    /// - `CACHE_TTL_MS` - Entry lifetime in milliseconds (default: 300000)
    /// - `CACHE_MAX_ITEM_BYTES` - Per-entry cap, negative for none (default: -1)
    /// - `CACHE_CLEANUP_INTERVAL_MS` - Sweep frequency, 0 for none (default: 0)
    ///
    /// Unset variables take their default; set but unparseable ones are
    /// reported as errors.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var_os(name).map(|raw| raw.to_string_lossy().into_owned()))
    }

    /// Creates a Config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            capacity_bytes: read_var(&lookup, "CACHE_CAPACITY_BYTES", defaults.capacity_bytes)?,
            ttl_ms: read_var(&lookup, "CACHE_TTL_MS", defaults.ttl_ms)?,
            max_item_bytes: read_var(&lookup, "CACHE_MAX_ITEM_BYTES", defaults.max_item_bytes)?,
            cleanup_interval_ms: read_var(
                &lookup,
                "CACHE_CLEANUP_INTERVAL_MS",
                defaults.cleanup_interval_ms,
            )?,
        })
    }

    /// Returns the background cleanup interval, if the sweep is enabled.
    pub fn cleanup_interval(&self) -> Option<Duration> {
        (self.cleanup_interval_ms > 0).then(|| Duration::from_millis(self.cleanup_interval_ms))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity_bytes: 64 * 1024 * 1024,
            ttl_ms: 300_000,
            max_item_bytes: UNLIMITED_ITEM_BYTES,
            cleanup_interval_ms: 0,
        }
    }
}

fn read_var<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|err: T::Err| CacheError::InvalidConfig {
            name,
            reason: err.to_string(),
            value: raw,
        }),
        None => Ok(default),
    }
}
