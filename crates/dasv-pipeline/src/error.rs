//! Pipeline error types

use crate::RunStatus;
use dasv_analysis::AnalysisError;
use dasv_discovery::DiscoveryError;
use dasv_gatekeeper::GatekeeperError;
use dasv_synthesizer::SynthesisError;
use thiserror::Error;

/// Errors that stop one subject's pipeline
///
/// In a batch these are collected per subject; siblings keep running.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Invalid threshold, sample or concurrency configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Discovery could not complete
    #[error("Discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    /// Analysis could not complete
    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    /// Synthesis could not complete
    #[error("Synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    /// Validation could not complete
    #[error("Validation failed: {0}")]
    Gatekeeper(#[from] GatekeeperError),
}

impl PipelineError {
    /// Run status this error maps to
    pub fn status(&self) -> RunStatus {
        match self {
            PipelineError::Config(_)
            | PipelineError::Discovery(DiscoveryError::Config(_))
            | PipelineError::Discovery(DiscoveryError::NoAdapters)
            | PipelineError::Analysis(AnalysisError::Config(_))
            | PipelineError::Synthesis(SynthesisError::Config(_))
            | PipelineError::Gatekeeper(GatekeeperError::Config(_)) => RunStatus::ConfigError,
            _ => RunStatus::PartialFailure,
        }
    }
}
