//! Tally service configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;

use doctrine_types::GovernanceParams;
use doctrine_utils::LogFormat;

use crate::TallyError;

/// Configuration for a tally service.
///
/// Can be loaded from a TOML file via [`TallyConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TallyConfig {
    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// How often a finalize is retried after a write conflict.
    #[serde(default = "default_max_commit_retries")]
    pub max_commit_retries: u32,

    /// Worker threads for the expiry sweep. 0 uses the global rayon pool.
    #[serde(default)]
    pub sweep_threads: usize,

    /// Multipliers, thresholds, windows and unit minima.
    #[serde(default)]
    pub governance: GovernanceParams,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_commit_retries() -> u32 {
    5
}

// ── Impl ───────────────────────────────────────────────────────────────

impl TallyConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, TallyError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| TallyError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, TallyError> {
        let config: Self = toml::from_str(s).map_err(|e| TallyError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, TallyError> {
        toml::to_string_pretty(self).map_err(|e| TallyError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), TallyError> {
        self.governance
            .validate()
            .map_err(|e| TallyError::Config(e.to_string()))
    }

    /// Install the global tracing subscriber described by this config.
    pub fn init_logging(&self) -> bool {
        doctrine_utils::init_logging(self.log_format, &self.log_level)
    }
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            max_commit_retries: default_max_commit_retries(),
            sweep_threads: 0,
            governance: GovernanceParams::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = TallyConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = TallyConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = TallyConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.max_commit_retries, 5);
        assert_eq!(config.log_format, LogFormat::Human);
        assert_eq!(config.governance.union_multiplier, 8);
    }

    #[test]
    fn partial_governance_table_overrides() {
        let toml = r#"
            log_format = "json"
            max_commit_retries = 2

            [governance]
            normal_threshold_pct = 60
            allow_unaffiliated_votes = true
        "#;
        let config = TallyConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.max_commit_retries, 2);
        assert_eq!(config.governance.normal_threshold_pct, 60);
        assert!(config.governance.allow_unaffiliated_votes);
        assert_eq!(config.governance.foundation_threshold_pct, 85); // default
    }

    #[test]
    fn invalid_values_are_config_errors() {
        let over = TallyConfig::from_toml_str("[governance]\nfoundation_threshold_pct = 101");
        assert!(matches!(over, Err(TallyError::Config(_))));
        let zero = TallyConfig::from_toml_str("[governance]\nteam_multiplier = 0");
        assert!(matches!(zero, Err(TallyError::Config(_))));
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = TallyConfig::from_toml_file("/nonexistent/doctrine.toml");
        assert!(matches!(result, Err(TallyError::Config(_))));
    }
}
