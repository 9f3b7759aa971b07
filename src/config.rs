use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::confidence::TREND_POINTS;
use crate::error::{ConfigError, EngineError};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub top_k: usize,
    #[serde(with = "millis")]
    pub index_timeout: Duration,
    pub history_limit: usize,
    pub decay_rate: f64,
    /// Restrict matches to alumni of the subject's major.
    pub filter_by_major: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            index_timeout: Duration::from_millis(2000),
            history_limit: 6,
            decay_rate: 0.1,
            filter_by_major: true,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `TRAJECTORY_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = parse_var(&lookup, "TRAJECTORY_TOP_K")? {
            config.top_k = value;
        }
        if let Some(value) = parse_var::<u64>(&lookup, "TRAJECTORY_INDEX_TIMEOUT_MS")? {
            config.index_timeout = Duration::from_millis(value);
        }
        if let Some(value) = parse_var(&lookup, "TRAJECTORY_HISTORY_LIMIT")? {
            config.history_limit = value;
        }
        if let Some(value) = parse_var(&lookup, "TRAJECTORY_DECAY_RATE")? {
            config.decay_rate = value;
        }
        if let Some(value) = parse_var(&lookup, "TRAJECTORY_FILTER_BY_MAJOR")? {
            config.filter_by_major = value;
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.top_k == 0 {
            return Err(EngineError::InvalidTopK);
        }
        if self.index_timeout.is_zero() {
            return Err(EngineError::InvalidConfig(
                "index_timeout must be positive".to_string(),
            ));
        }
        if self.history_limit < TREND_POINTS {
            return Err(EngineError::InvalidConfig(format!(
                "history_limit must be at least {TREND_POINTS} to estimate a trend, got {}",
                self.history_limit
            )));
        }
        if !self.decay_rate.is_finite() || self.decay_rate < 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "decay_rate must be a non-negative number, got {}",
                self.decay_rate
            )));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
