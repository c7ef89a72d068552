//! Error types for level loading, configuration and policy evaluation

use thiserror::Error;

/// Why a level descriptor was rejected at load time
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LevelError {
    #[error("floor range is inverted: min {min} > max {max}")]
    InvertedFloorRange { min: f32, max: f32 },

    #[error("floor range {min}..={max} cannot be sampled: {reason}")]
    UnsampleableFloorRange { min: f32, max: f32, reason: String },

    #[error("obstacle {index} has non-positive gap height {gap_height}")]
    NonPositiveGap { index: usize, gap_height: f32 },

    #[error("obstacle {index} has a gap that closes after floor clipping ({gap_top} >= {gap_bottom})")]
    ClippedGapInverted {
        index: usize,
        gap_top: f32,
        gap_bottom: f32,
    },

    #[error("level field `{field}` is not a finite number")]
    NonFinite { field: &'static str },

    #[error("level JSON could not be parsed: {0}")]
    Parse(String),

    #[error("world settings rejected: {0}")]
    Settings(String),
}

impl From<serde_json::Error> for LevelError {
    fn from(err: serde_json::Error) -> Self {
        LevelError::Parse(err.to_string())
    }
}

impl From<ConfigError> for LevelError {
    fn from(err: ConfigError) -> Self {
        LevelError::Settings(err.to_string())
    }
}

/// Configuration load/validation failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// A decision policy failed to produce a decision
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PolicyError {
    #[error("snapshot field `{field}` is not finite")]
    NonFiniteSnapshot { field: &'static str },

    #[error("policy `{policy}` panicked: {message}")]
    Panicked { policy: String, message: String },

    #[error("policy fault: {0}")]
    Fault(String),
}
