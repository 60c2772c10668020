//! Reconciler configuration.
//!
//! Every field has a default, so an empty document is a valid configuration:
//!
//! ```yaml
//! quorum:
//!   minQuorum: 3
//!   majorityDenominator: 2
//! immutableFields:
//!   bootstrapEnv: [cluster.initial_master_nodes, node.roles]
//! logging:
//!   level: info
//!   json: false
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::cluster::PlannerConfig;
use crate::error::{Error, Result};
use crate::logging::LoggingConfig;

/// Overrides `quorum.minQuorum`.
pub const MIN_QUORUM_ENV: &str = "SREC_MIN_QUORUM";

/// ReconcileConfig is the full configuration of the reconciler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReconcileConfig {
    #[serde(flatten)]
    pub planner: PlannerConfig,
    pub logging: LoggingConfig,
}

impl ReconcileConfig {
    /// Parses and validates a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: ReconcileConfig =
            serde_yaml::from_str(yaml).map_err(|e| Error::parse("configuration", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::read(path, e))?;
        Self::from_yaml(&content)
    }

    /// Applies overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`, then re-validates.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(raw) = lookup(MIN_QUORUM_ENV) {
            self.planner.quorum.min_quorum = raw.trim().parse().map_err(|_| {
                Error::invalid_config(format!("{} must be an integer, got {:?}", MIN_QUORUM_ENV, raw))
            })?;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        let quorum = &self.planner.quorum;
        if quorum.min_quorum < 1 {
            return Err(Error::invalid_config(format!(
                "quorum.minQuorum must be at least 1, got {}",
                quorum.min_quorum
            )));
        }
        if quorum.majority_denominator < 1 {
            return Err(Error::invalid_config(format!(
                "quorum.majorityDenominator must be at least 1, got {}",
                quorum.majority_denominator
            )));
        }
        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(Error::invalid_config(format!(
                "logging.level {:?} is not a log level",
                self.logging.level
            )));
        }
        Ok(())
    }
}
