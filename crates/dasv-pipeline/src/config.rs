//! Pipeline configuration

use crate::PipelineError;
use dasv_analysis::AnalysisConfig;
use dasv_discovery::DiscoveryConfig;
use dasv_domain::{FieldKind, FieldRequest, SampleMinimums, ValidationDepth};
use dasv_gatekeeper::ValidationConfig;
use dasv_synthesizer::SynthesisConfig;
use serde::{Deserialize, Serialize};

/// The three values a caller supplies per invocation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InvocationConfig {
    /// Minimum aggregate reliability for certification
    pub confidence_threshold: f64,
    /// Sample minimums for statistical claims
    pub sample_minimums: SampleMinimums,
    /// Validation depth
    pub validation_depth: ValidationDepth,
}

impl Default for InvocationConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: ValidationDepth::Standard.default_threshold(),
            sample_minimums: SampleMinimums::default(),
            validation_depth: ValidationDepth::Standard,
        }
    }
}

/// Configuration for every phase of the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Subjects run concurrently in a batch
    pub max_concurrent_subjects: usize,

    /// Discovery settings
    pub discovery: DiscoveryConfig,

    /// Analysis settings
    pub analysis: AnalysisConfig,

    /// Synthesis settings
    pub synthesis: SynthesisConfig,

    /// Validation settings
    pub validation: ValidationConfig,

    /// Fields requested from every adapter
    pub fields: Vec<FieldRequest>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_subjects: 4,
            discovery: DiscoveryConfig::default(),
            analysis: AnalysisConfig::default(),
            synthesis: SynthesisConfig::default(),
            validation: ValidationConfig::default(),
            fields: default_fields(),
        }
    }
}

fn default_fields() -> Vec<FieldRequest> {
    vec![
        FieldRequest::new("price", FieldKind::PriceLike),
        FieldRequest::new("fair_value", FieldKind::PriceLike),
        FieldRequest::new("recommendation", FieldKind::Categorical),
        FieldRequest::new("growth.*", FieldKind::Numeric),
        FieldRequest::new("risk.*", FieldKind::Numeric),
        FieldRequest::new("scenario.*", FieldKind::Numeric),
        FieldRequest::new("disclosure.*", FieldKind::Categorical),
    ]
}

impl PipelineConfig {
    /// Build a configuration from an invocation
    ///
    /// # Errors
    /// Returns [`PipelineError::Config`] for an invalid threshold or sample minimums
    pub fn from_invocation(invocation: InvocationConfig) -> Result<Self, PipelineError> {
        let mut config = Self::default();
        config.apply_invocation(invocation);
        config.validate()?;
        Ok(config)
    }

    /// Apply invocation values on top of this configuration
    ///
    /// A depth change switches validation to that depth's preset before the
    /// threshold and minimums are applied.
    pub fn apply_invocation(&mut self, invocation: InvocationConfig) {
        if invocation.validation_depth != self.validation.depth {
            let recheck_adapter = self.validation.recheck_adapter.take();
            self.validation = ValidationConfig {
                recheck_adapter,
                ..ValidationConfig::for_depth(invocation.validation_depth)
            };
        }
        self.validation.confidence_threshold = invocation.confidence_threshold;
        self.validation.sample_minimums = invocation.sample_minimums;
        self.analysis.sample_minimums = invocation.sample_minimums;
    }

    /// Invocation values currently in effect
    pub fn invocation(&self) -> InvocationConfig {
        InvocationConfig {
            confidence_threshold: self.validation.confidence_threshold,
            sample_minimums: self.analysis.sample_minimums,
            validation_depth: self.validation.depth,
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// Returns [`PipelineError::Config`] naming the first invalid section
    pub fn validate(&self) -> Result<(), PipelineError> {
        let section = |name: &str, result: Result<(), String>| {
            result.map_err(|e| PipelineError::Config(format!("{}: {}", name, e)))
        };
        section("discovery", self.discovery.validate())?;
        section("analysis", self.analysis.validate())?;
        section("synthesis", self.synthesis.validate())?;
        section("validation", self.validation.validate())?;

        if self.analysis.sample_minimums != self.validation.sample_minimums {
            return Err(PipelineError::Config(
                "analysis and validation sample minimums differ".to_string(),
            ));
        }
        if self.max_concurrent_subjects == 0 {
            return Err(PipelineError::Config(
                "max_concurrent_subjects must be greater than 0".to_string(),
            ));
        }
        if self.fields.is_empty() {
            return Err(PipelineError::Config("no fields requested".to_string()));
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, PipelineError> {
        toml::from_str(toml_str)
            .map_err(|e| PipelineError::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, PipelineError> {
        toml::to_string_pretty(self)
            .map_err(|e| PipelineError::Config(format!("Failed to serialize to TOML: {}", e)))
    }
}
