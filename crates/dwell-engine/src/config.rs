//! Tracker Configuration

use std::time::Duration;

use serde::Deserialize;

use crate::observer::ObserverOptions;
use crate::EngineError;

/// Environment variable overriding the tick interval (milliseconds)
pub const TICK_ENV_VAR: &str = "DWELL_TICK_MS";

/// Tracker configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Accumulation timer period
    pub tick_interval_ms: u64,
    /// Margin added around the viewport before evaluating intersections
    pub root_margin: f32,
    /// Intersection thresholds; must contain 0 and 1
    pub thresholds: Vec<f32>,
    /// Text placed before the formatted total in element labels
    pub label_prefix: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            root_margin: 0.0,
            thresholds: vec![0.0, 1.0],
            label_prefix: "In view for: ".to_string(),
        }
    }
}

impl TrackerConfig {
    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json(source: &str) -> Result<Self, EngineError> {
        let config: TrackerConfig =
            serde_json::from_str(source).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `DWELL_TICK_MS` if set
    pub fn with_env_overrides(self) -> Result<Self, EngineError> {
        let raw = std::env::var(TICK_ENV_VAR).ok();
        self.apply_tick_override(raw.as_deref())
    }

    /// Replace the tick interval with a raw millisecond value, if given
    pub fn apply_tick_override(mut self, raw: Option<&str>) -> Result<Self, EngineError> {
        let Some(raw) = raw else {
            return Ok(self);
        };
        self.tick_interval_ms = raw.trim().parse().map_err(|_| {
            EngineError::Config(format!("{TICK_ENV_VAR}={raw} is not a number"))
        })?;
        self.validate()?;
        Ok(self)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn observer_options(&self) -> ObserverOptions {
        ObserverOptions {
            root_margin: self.root_margin,
            thresholds: self.thresholds.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.tick_interval_ms == 0 {
            return Err(EngineError::Setup("tick interval must be positive".into()));
        }
        self.observer_options().validate()
    }
}
