// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent configuration loading and validation.
//!
//! Each daemon reads one YAML file whose path the shell passes via
//! `--config`. Construction validates every required key by name and is the
//! only place defaults are applied; the resulting `AgentConfig` is immutable
//! for the life of the process.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::safefile::{read_no_symlink, FileError};

/// Fallback cadence when the configured interval is absent or non-positive.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

const DEFAULT_METRICS_INTERVAL: Duration = Duration::from_secs(1);

/// Configuration errors are fatal at boot.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file: {0}")]
    File(#[from] FileError),

    #[error("config is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("missing required config key {0:?}")]
    MissingKey(&'static str),

    #[error("invalid value for config key {key:?}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

/// Log verbosity, mirrored onto the tracing env-filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warning,
    Info,
    Debug,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warning => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

/// Validated, immutable per-agent configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub version: String,
    /// Stable host identifier (UUID form).
    pub guid: String,
    /// Southbound host:port.
    pub service_url: String,
    /// Directory holding `<client>/access_token` files.
    pub access_token_path: PathBuf,
    /// Heartbeat/update cadence for the agent's main loop.
    pub interval: Duration,
    /// OTLP endpoint for the meter provider (UNIX socket path or URL).
    pub metrics_endpoint: Option<String>,
    /// Periodic metric reader cadence.
    pub metrics_interval: Duration,
    /// Path of the local readiness-service socket.
    pub status_endpoint: Option<PathBuf>,
    pub log_level: LogLevel,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    version: Option<String>,
    #[serde(rename = "GUID")]
    guid: Option<String>,
    #[serde(rename = "serviceURL")]
    service_url: Option<String>,
    #[serde(rename = "accessTokenPath")]
    access_token_path: Option<PathBuf>,
    #[serde(rename = "heartbeatInterval")]
    heartbeat_interval: Option<i64>,
    #[serde(rename = "updateInterval")]
    update_interval: Option<i64>,
    #[serde(rename = "metricsEndpoint")]
    metrics_endpoint: Option<String>,
    #[serde(rename = "metricsInterval")]
    metrics_interval: Option<i64>,
    #[serde(rename = "statusEndpoint")]
    status_endpoint: Option<PathBuf>,
    #[serde(rename = "logLevel")]
    log_level: Option<LogLevel>,
}

impl AgentConfig {
    /// Load and validate the config at `path`.
    ///
    /// A symlink at `path` is rejected before any bytes are read.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let bytes = read_no_symlink(path)?;
        let raw: RawConfig = serde_yaml::from_slice(&bytes)?;
        Self::validate(raw)
    }

    fn validate(raw: RawConfig) -> Result<Self, ConfigError> {
        let version = raw.version.ok_or(ConfigError::MissingKey("version"))?;
        let guid = raw.guid.ok_or(ConfigError::MissingKey("GUID"))?;
        uuid::Uuid::parse_str(&guid).map_err(|e| ConfigError::InvalidValue {
            key: "GUID",
            reason: e.to_string(),
        })?;
        let service_url = raw.service_url.ok_or(ConfigError::MissingKey("serviceURL"))?;
        if service_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "serviceURL",
                reason: "empty".to_string(),
            });
        }
        let access_token_path =
            raw.access_token_path.ok_or(ConfigError::MissingKey("accessTokenPath"))?;

        // Agents configure exactly one of the two cadence keys.
        let interval = raw
            .heartbeat_interval
            .or(raw.update_interval)
            .ok_or(ConfigError::MissingKey("heartbeatInterval"))?;
        let interval = clamp_interval(interval, DEFAULT_INTERVAL);

        let metrics_interval = raw
            .metrics_interval
            .map(|secs| clamp_interval(secs, DEFAULT_METRICS_INTERVAL))
            .unwrap_or(DEFAULT_METRICS_INTERVAL);

        Ok(Self {
            version,
            guid,
            service_url,
            access_token_path,
            interval,
            metrics_endpoint: raw.metrics_endpoint,
            metrics_interval,
            status_endpoint: raw.status_endpoint,
            log_level: raw.log_level.unwrap_or(LogLevel::Info),
        })
    }
}

fn clamp_interval(secs: i64, fallback: Duration) -> Duration {
    if secs > 0 {
        Duration::from_secs(secs as u64)
    } else {
        fallback
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
