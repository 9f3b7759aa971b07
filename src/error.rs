use std::time::Duration;

use thiserror::Error;

/// Caller mistakes. Data problems never surface here; they degrade the result.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("top_k must be at least 1")]
    InvalidTopK,

    #[error("invalid engine config: {0}")]
    InvalidConfig(String),

    #[error("scoring task failed: {0}")]
    Task(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum IndexError {
    #[error("similarity index unavailable: {0}")]
    Unavailable(String),

    #[error("similarity index query timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum HistoryError {
    #[error("score history unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}
