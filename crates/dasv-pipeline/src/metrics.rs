//! Metrics collected during a pipeline run

use serde::Serialize;
use std::collections::BTreeMap;

/// Counts of subject outcomes and adapter failures for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineMetrics {
    /// Subjects certified by the gate
    pub certified: usize,

    /// Subjects that completed but were rejected
    pub rejected: usize,

    /// Subjects that could not complete
    pub failed: usize,

    /// Adapter failures (unavailable or timed out) per adapter
    pub adapter_failures: BTreeMap<String, usize>,

    /// Total runtime in milliseconds
    pub total_runtime_ms: u64,
}

impl PipelineMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a certified subject
    pub fn record_certified(&mut self) {
        self.certified += 1;
    }

    /// Record a rejected subject
    pub fn record_rejected(&mut self) {
        self.rejected += 1;
    }

    /// Record a subject that could not complete
    pub fn record_failed(&mut self) {
        self.failed += 1;
    }

    /// Record an adapter that contributed nothing to a discovery run
    pub fn record_adapter_failure(&mut self, adapter: &str) {
        *self.adapter_failures.entry(adapter.to_string()).or_insert(0) += 1;
    }

    /// Subjects processed, whatever their outcome
    pub fn total_subjects(&self) -> usize {
        self.certified + self.rejected + self.failed
    }

    /// Adapter failures across all adapters
    pub fn total_adapter_failures(&self) -> usize {
        self.adapter_failures.values().sum()
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Pipeline Metrics Summary".to_string(),
            "========================".to_string(),
            format!("Subjects: {}", self.total_subjects()),
            format!("  Certified: {}", self.certified),
            format!("  Rejected: {}", self.rejected),
            format!("  Failed: {}", self.failed),
            format!("Total runtime: {}ms", self.total_runtime_ms),
        ];

        if !self.adapter_failures.is_empty() {
            lines.push(String::new());
            lines.push("Adapter failures:".to_string());
            for (adapter, count) in &self.adapter_failures {
                lines.push(format!("  {}: {}", adapter, count));
            }
            lines.push(format!("  Total: {}", self.total_adapter_failures()));
        }

        lines.join("\n")
    }
}
