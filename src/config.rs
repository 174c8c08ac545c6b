//! Configuration management for the GitTLDR QA orchestrator
//!
//! This module handles loading, parsing, and validating configuration
//! from YAML files, with sensible defaults for every field.

use crate::error::{QaError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for the orchestrator
///
/// Holds backend connectivity, polling behavior, and stats-refresh
/// throttling settings. Every field has a default so an empty config
/// file (or `Config::default()`) yields the production defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Backend endpoint configuration
    #[serde(default)]
    pub backend: BackendConfig,

    /// Polling loop configuration
    #[serde(default)]
    pub polling: PollingConfig,

    /// Stats refresh throttling configuration
    #[serde(default)]
    pub stats_refresh: StatsRefreshConfig,
}

/// Backend connectivity configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the QA backend (submission, status, and download
    /// endpoints are joined onto this base)
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_api_base() -> String {
    "http://localhost:4000".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

/// Polling loop configuration
///
/// The backoff schedule derives all inter-poll delays from `base_delay_ms`;
/// see [`crate::orchestrator::BackoffSchedule`] for the tier multipliers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Base inter-poll delay in milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Maximum number of poll attempts before the question is marked
    /// failed
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_base_delay_ms() -> u64 {
    2000
}

fn default_max_attempts() -> u32 {
    18
}

impl PollingConfig {
    /// Returns the base delay as a [`Duration`]
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

/// Stats refresh throttling configuration
///
/// The aggregate stats recomputation is expensive, so completions only
/// request it through a throttle. The default is probabilistic
/// (10% of completions); a fixed minimum interval is available when
/// deterministic behavior is preferred.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsRefreshConfig {
    /// Throttling policy: `probabilistic`, `min-interval`, or `never`
    #[serde(default = "default_refresh_policy")]
    pub policy: String,

    /// Probability of requesting a refresh per completion
    /// (only for `probabilistic`)
    #[serde(default = "default_refresh_probability")]
    pub probability: f64,

    /// Minimum seconds between refresh requests (only for `min-interval`)
    #[serde(default = "default_min_interval")]
    pub min_interval_seconds: u64,

    /// Optional RNG seed for the probabilistic policy; tests set this to
    /// exercise both branches deterministically
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_refresh_policy() -> String {
    "probabilistic".to_string()
}

fn default_refresh_probability() -> f64 {
    0.1
}

fn default_min_interval() -> u64 {
    60
}

impl Default for StatsRefreshConfig {
    fn default() -> Self {
        Self {
            policy: default_refresh_policy(),
            probability: default_refresh_probability(),
            min_interval_seconds: default_min_interval(),
            seed: None,
        }
    }
}

impl Config {
    /// Loads configuration from a YAML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML configuration file
    ///
    /// # Returns
    ///
    /// Returns the parsed configuration
    ///
    /// # Errors
    ///
    /// Returns `QaError::Io` if the file cannot be read, or
    /// `QaError::Yaml` if it cannot be parsed
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(QaError::Io)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(QaError::Yaml)?;
        Ok(config)
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `QaError::Config` if:
    /// - `api_base` is empty or not a valid URL
    /// - `max_attempts` is zero
    /// - `base_delay_ms` is zero
    /// - the refresh policy is unknown or its probability is outside [0, 1]
    pub fn validate(&self) -> Result<()> {
        if self.backend.api_base.trim().is_empty() {
            return Err(QaError::Config("backend.api_base must not be empty".to_string()).into());
        }
        url::Url::parse(&self.backend.api_base).map_err(|e| {
            QaError::Config(format!(
                "backend.api_base is not a valid URL: {}: {}",
                self.backend.api_base, e
            ))
        })?;

        if self.polling.max_attempts == 0 {
            return Err(
                QaError::Config("polling.max_attempts must be greater than 0".to_string()).into(),
            );
        }
        if self.polling.base_delay_ms == 0 {
            return Err(
                QaError::Config("polling.base_delay_ms must be greater than 0".to_string()).into(),
            );
        }

        match self.stats_refresh.policy.as_str() {
            "probabilistic" => {
                let p = self.stats_refresh.probability;
                if !(0.0..=1.0).contains(&p) {
                    return Err(QaError::Config(format!(
                        "stats_refresh.probability must be in [0, 1], got {}",
                        p
                    ))
                    .into());
                }
            }
            "min-interval" | "never" => {}
            other => {
                return Err(QaError::Config(format!(
                    "unknown stats_refresh.policy: {}",
                    other
                ))
                .into());
            }
        }

        Ok(())
    }
}
