//! Error types for configuration and browser start-up.
//!
//! Gameplay itself never fails: bad lane moves clamp and game over is a normal
//! state. Errors only exist at the edges, when a config is rejected or the host
//! page lacks something the frame loop needs.

use thiserror::Error;
use wasm_bindgen::JsValue;

/// A `RunnerConfig` field holds a value the session cannot run with.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("lane_count must be at least 1")]
    NoLanes,
    #[error("start_lane {start} is outside 0..{lanes}")]
    StartLaneOutOfRange { start: u8, lanes: u8 },
    #[error("spawn_distance must be positive and finite (got {0})")]
    NonPositiveSpawnInterval(f64),
    #[error("spawn weights must be non-negative and sum to more than zero")]
    InvalidSpawnWeights,
    #[error("{field} must be {expected} (got {value})")]
    OutOfRange {
        field: &'static str,
        expected: &'static str,
        value: f64,
    },
}

impl ConfigError {
    pub(crate) fn out_of_range(field: &'static str, expected: &'static str, value: f64) -> Self {
        ConfigError::OutOfRange { field, expected, value }
    }
}

/// Reasons the browser binding refuses to start the frame loop.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("no window")]
    NoWindow,
    #[error("no document")]
    NoDocument,
    #[error("no document body")]
    NoBody,
    #[error("canvas has no 2d rendering context")]
    NoContext,
    #[error("dom call failed: {0}")]
    Dom(String),
    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),
    #[cfg(feature = "serde_json")]
    #[error("config is not valid json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown preset '{0}'")]
    UnknownPreset(String),
}

impl From<JsValue> for StartError {
    fn from(value: JsValue) -> Self {
        StartError::Dom(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}

impl From<StartError> for JsValue {
    fn from(err: StartError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
