//! Engine configuration.
//!
//! Defaults, then either a JSON document or `STOCKROOM_*` environment
//! variables layered on top.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use stockroom_inventory::PlacementStrategy;

pub const ENV_PLACEMENT_STRATEGY: &str = "STOCKROOM_PLACEMENT_STRATEGY";
pub const ENV_PLACEMENT_ATTEMPTS: &str = "STOCKROOM_PLACEMENT_ATTEMPTS";
pub const ENV_LOG: &str = "STOCKROOM_LOG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("malformed config document: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    fn invalid(key: &str, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Strategy active at startup; can be swapped at runtime.
    pub placement_strategy: PlacementStrategy,
    /// Selection attempts per `add_unit` when the chosen location is taken
    /// before it can be occupied.
    pub placement_attempts: u32,
    /// Fallback tracing filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            placement_strategy: PlacementStrategy::default(),
            placement_attempts: 3,
            log_filter: "info".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for the `STOCKROOM_*`
    /// keys. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(raw) = get(ENV_PLACEMENT_STRATEGY) {
            config.placement_strategy = raw
                .parse()
                .map_err(|e| ConfigError::invalid(ENV_PLACEMENT_STRATEGY, format!("{e}")))?;
        }
        if let Some(raw) = get(ENV_PLACEMENT_ATTEMPTS) {
            config.placement_attempts = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid(ENV_PLACEMENT_ATTEMPTS, format!("not a count: {raw:?}")))?;
        }
        if let Some(raw) = get(ENV_LOG) {
            config.log_filter = raw;
        }

        config.validate()
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.placement_attempts == 0 {
            return Err(ConfigError::invalid(
                "placement_attempts",
                "must be at least 1",
            ));
        }
        if self.log_filter.trim().is_empty() {
            return Err(ConfigError::invalid("log_filter", "must not be blank"));
        }
        debug!(
            placement_strategy = %self.placement_strategy,
            placement_attempts = self.placement_attempts,
            "engine configuration loaded"
        );
        Ok(self)
    }
}
