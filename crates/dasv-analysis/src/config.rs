//! Configuration for the Analysis Engine

use dasv_domain::{SampleMinimums, SCENARIO_SUM_TOLERANCE};
use serde::{Deserialize, Serialize};

/// Configuration for sample gating, scenario validation and risk reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Allowed deviation of scenario probabilities from 1.0
    pub scenario_tolerance: f64,

    /// Number of top risk contributors to report
    pub risk_top_n: usize,

    /// Minimum counts for basic and significant statistics
    pub sample_minimums: SampleMinimums,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_minimums: SampleMinimums::default(),
            scenario_tolerance: SCENARIO_SUM_TOLERANCE,
            risk_top_n: 2,
        }
    }
}

impl AnalysisConfig {
    /// Strict preset: larger samples required, tighter scenario tolerance
    pub fn strict() -> Self {
        Self {
            sample_minimums: SampleMinimums {
                basic: 10,
                significant: 30,
            },
            scenario_tolerance: 0.001,
            risk_top_n: 3,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.sample_minimums.validate().map_err(|e| e.to_string())?;
        if !(0.0..0.5).contains(&self.scenario_tolerance) {
            return Err(format!(
                "scenario_tolerance must be in [0.0, 0.5), got {}",
                self.scenario_tolerance
            ));
        }
        if self.risk_top_n == 0 {
            return Err("risk_top_n must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.scenario_tolerance, 0.005);
        assert_eq!(config.risk_top_n, 2);
    }

    #[test]
    fn test_strict_config_is_valid() {
        assert!(AnalysisConfig::strict().validate().is_ok());
    }

    #[test]
    fn test_invalid_minimums() {
        let mut config = AnalysisConfig::default();
        config.sample_minimums.basic = 20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = AnalysisConfig::strict();
        let parsed = AnalysisConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(config, parsed);
    }
}
