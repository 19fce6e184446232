//! Configuration, loaded from TOML. Every section is optional and falls back
//! to the values in [`defaults`].

pub mod defaults;
mod learner_config;
mod observability_config;
mod session_config;
mod store_config;
mod stream_config;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{QuarryError, QuarryResult};

pub use learner_config::LearnerConfig;
pub use observability_config::ObservabilityConfig;
pub use session_config::SessionConfig;
pub use store_config::StoreConfig;
pub use stream_config::StreamConfig;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuarryConfig {
    pub stream: StreamConfig,
    pub learner: LearnerConfig,
    pub session: SessionConfig,
    pub store: StoreConfig,
    pub observability: ObservabilityConfig,
}

impl QuarryConfig {
    /// Parse a TOML document. Missing sections and fields keep their defaults.
    pub fn from_toml(toml_str: &str) -> QuarryResult<Self> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| QuarryError::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: &Path) -> QuarryResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Reject values the loop cannot run with.
    pub fn validate(&self) -> QuarryResult<()> {
        if self.learner.query_batch_size == 0 {
            return Err(QuarryError::ConfigError(
                "learner.query_batch_size must be at least 1".to_string(),
            ));
        }
        if self.learner.seed_size == 0 {
            return Err(QuarryError::ConfigError(
                "learner.seed_size must be at least 1".to_string(),
            ));
        }
        if self.learner.feature_dimensions == 0 {
            return Err(QuarryError::ConfigError(
                "learner.feature_dimensions must be at least 1".to_string(),
            ));
        }
        if !(self.learner.temperature.is_finite() && self.learner.temperature > 0.0) {
            return Err(QuarryError::ConfigError(
                "learner.temperature must be a positive number".to_string(),
            ));
        }
        if self.session.collection.trim().is_empty() {
            return Err(QuarryError::ConfigError(
                "session.collection must not be empty".to_string(),
            ));
        }
        match self.store.backend.as_str() {
            "sqlite" | "memory" => Ok(()),
            other => Err(QuarryError::ConfigError(format!(
                "unknown store backend: {other}"
            ))),
        }
    }
}
