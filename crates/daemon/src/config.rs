// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use isxops_engine::ManagerConfig;
use isxops_queue::QueueConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {detail}")]
    Invalid { var: &'static str, detail: String },
}

/// Daemon configuration, read once at process startup from `ISXOPS_*`
/// environment variables (unset variables fall back to the documented
/// defaults).
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub queue: QueueConfig,
    pub request_timeout: Duration,
    pub log_path: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let bind_addr = env_parsed("ISXOPS_BIND_ADDR", "0.0.0.0:8080")?;
        let workers = env_parsed("ISXOPS_WORKERS", 4usize)?;
        let capacity = env_parsed("ISXOPS_QUEUE_CAPACITY", 256usize)?;
        let retention = env_duration("ISXOPS_JOB_RETENTION", Duration::from_secs(600))?;
        let fan_out = env_parsed("ISXOPS_FAN_OUT", 4usize)?;
        let cancel_grace = env_duration("ISXOPS_CANCEL_GRACE", Duration::from_secs(5))?;
        let request_timeout = env_duration("ISXOPS_REQUEST_TIMEOUT", Duration::from_secs(30))?;
        let log_path = std::env::var("ISXOPS_LOG_PATH").ok().map(PathBuf::from);

        Ok(Self {
            bind_addr,
            queue: QueueConfig {
                workers,
                capacity,
                retention,
                manager: ManagerConfig {
                    fan_out,
                    cancel_grace,
                },
            },
            request_timeout,
            log_path,
        })
    }
}

/// Default per-step timeout applied when a `StepDefinition` does not
/// override it, from `ISXOPS_DEFAULT_STEP_TIMEOUT`.
pub fn default_step_timeout() -> Result<Duration, ConfigError> {
    env_duration("ISXOPS_DEFAULT_STEP_TIMEOUT", Duration::from_secs(300))
}

/// Default retry count applied when a request does not override it per
/// step, from `ISXOPS_DEFAULT_RETRIES`.
pub fn default_retries() -> Result<u32, ConfigError> {
    env_parsed("ISXOPS_DEFAULT_RETRIES", 2u32)
}

/// Broadcaster per-subscriber channel capacity, from `ISXOPS_SUBSCRIBER_BUFFER`.
pub fn subscriber_buffer() -> Result<usize, ConfigError> {
    env_parsed("ISXOPS_SUBSCRIBER_BUFFER", 128usize)
}

/// Consecutive drops before a subscriber is closed, from
/// `ISXOPS_SUBSCRIBER_DROP_THRESHOLD`.
pub fn subscriber_drop_threshold() -> Result<u32, ConfigError> {
    env_parsed("ISXOPS_SUBSCRIBER_DROP_THRESHOLD", 32u32)
}

fn env_parsed<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(var) {
        Err(_) => Ok(default),
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var,
            detail: format!("cannot parse '{raw}'"),
        }),
    }
}

fn env_duration(var: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    match std::env::var(var) {
        Err(_) => Ok(default),
        Ok(raw) => humantime::parse_duration(raw.trim()).map_err(|e| ConfigError::Invalid {
            var,
            detail: format!("invalid duration '{raw}': {e}"),
        }),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
