//! Throttling of the stats refresh side channel
//!
//! Recomputing aggregate repository stats is expensive, so question
//! completions only request a refresh through a gate. The reference
//! behavior lets roughly one in ten completions through; a fixed
//! minimum interval is available when determinism is preferred, and
//! the probabilistic gate takes an optional seed so tests can exercise
//! both outcomes.

use crate::config::StatsRefreshConfig;
use crate::error::{QaError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// Policy deciding which completions trigger a stats refresh
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RefreshPolicy {
    /// Each completion passes with the given probability
    Probabilistic {
        /// Chance in [0, 1] of requesting a refresh
        probability: f64,
    },
    /// At most one refresh per interval
    MinInterval {
        /// Minimum spacing between refresh requests
        interval: Duration,
    },
    /// Never request a refresh
    Never,
}

/// Gate consulted once per poll-mode completion
pub struct RefreshGate {
    policy: RefreshPolicy,
    rng: Mutex<StdRng>,
    last_refresh: Mutex<Option<Instant>>,
}

impl RefreshGate {
    /// Creates a gate with the given policy
    ///
    /// `seed` fixes the RNG for the probabilistic policy; pass `None`
    /// for OS-seeded behavior in production.
    pub fn new(policy: RefreshPolicy, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            policy,
            rng: Mutex::new(rng),
            last_refresh: Mutex::new(None),
        }
    }

    /// Builds a gate from configuration
    ///
    /// # Errors
    ///
    /// Returns `QaError::Config` for an unknown policy name; value
    /// ranges are checked by [`crate::config::Config::validate`].
    pub fn from_config(config: &StatsRefreshConfig) -> Result<Self> {
        let policy = match config.policy.as_str() {
            "probabilistic" => RefreshPolicy::Probabilistic {
                probability: config.probability,
            },
            "min-interval" => RefreshPolicy::MinInterval {
                interval: Duration::from_secs(config.min_interval_seconds),
            },
            "never" => RefreshPolicy::Never,
            other => {
                return Err(
                    QaError::Config(format!("unknown stats_refresh.policy: {}", other)).into(),
                )
            }
        };
        Ok(Self::new(policy, config.seed))
    }

    /// Decides whether this completion should request a refresh
    pub fn should_refresh(&self) -> bool {
        let decision = match self.policy {
            RefreshPolicy::Probabilistic { probability } => {
                self.rng.lock().unwrap().random_bool(probability.clamp(0.0, 1.0))
            }
            RefreshPolicy::MinInterval { interval } => {
                let mut last = self.last_refresh.lock().unwrap();
                let now = Instant::now();
                match *last {
                    Some(previous) if now.duration_since(previous) < interval => false,
                    _ => {
                        *last = Some(now);
                        true
                    }
                }
            }
            RefreshPolicy::Never => false,
        };
        debug!(decision, "stats refresh gate consulted");
        decision
    }
}
