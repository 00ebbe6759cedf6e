//! Per-subject orchestration and the batch worker pool

use crate::{PipelineConfig, PipelineError, PipelineMetrics, RunStatus};
use chrono::NaiveDate;
use dasv_adapters::SourceAdapter;
use dasv_analysis::AnalysisEngine;
use dasv_discovery::{DiscoveryAggregator, SampleValidator};
use dasv_domain::{
    AnalysisRecord, DiscoveryRecord, Finding, SubjectId, ValidationState, ValidationVerdict,
};
use dasv_gatekeeper::{Evidence, Gatekeeper};
use dasv_synthesizer::Composer;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Every artifact produced for one subject
#[derive(Debug, Clone, Serialize)]
pub struct SubjectReport {
    /// Discovery artifact
    pub discovery: DiscoveryRecord,
    /// Analysis artifact
    pub analysis: AnalysisRecord,
    /// Finding artifact
    pub finding: Finding,
    /// Validation artifact
    pub verdict: ValidationVerdict,
}

impl SubjectReport {
    /// Subject the report is for
    pub fn subject_id(&self) -> &SubjectId {
        self.discovery.subject_id()
    }

    /// Whether the finding was certified
    pub fn certified(&self) -> bool {
        self.verdict.certified()
    }

    /// Final certification state
    pub fn state(&self) -> ValidationState {
        if self.certified() {
            ValidationState::Certified
        } else {
            ValidationState::Rejected
        }
    }
}

/// A subject that could not complete
#[derive(Debug, Clone)]
pub struct SubjectFailure {
    /// Subject
    pub subject: SubjectId,
    /// Why it stopped
    pub error: PipelineError,
}

/// Outcome of a batch run
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// Completed subjects, in input order
    pub reports: Vec<SubjectReport>,
    /// Subjects that could not complete, in input order
    pub failures: Vec<SubjectFailure>,
    /// Run metrics
    pub metrics: PipelineMetrics,
}

impl BatchReport {
    /// Overall run status
    pub fn status(&self) -> RunStatus {
        if !self.failures.is_empty() {
            RunStatus::PartialFailure
        } else if self.reports.iter().all(SubjectReport::certified) {
            RunStatus::SuccessCertified
        } else {
            RunStatus::SuccessRejected
        }
    }
}

/// Runs Discovery → Analysis → Synthesis → Validation
pub struct Pipeline {
    config: PipelineConfig,
    aggregator: DiscoveryAggregator,
    engine: AnalysisEngine,
    composer: Composer,
    gatekeeper: Gatekeeper,
}

impl Pipeline {
    /// Build a pipeline over the given adapters
    ///
    /// # Errors
    /// Returns an error if any phase's configuration is invalid or no
    /// adapters are given
    pub fn new(
        config: PipelineConfig,
        adapters: Vec<Arc<dyn SourceAdapter>>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let recheck = match &config.validation.recheck_adapter {
            Some(name) => Some(
                adapters
                    .iter()
                    .find(|a| a.name() == name.as_str())
                    .cloned()
                    .ok_or_else(|| {
                        PipelineError::Config(format!(
                            "validation: recheck_adapter '{}' is not a configured adapter",
                            name
                        ))
                    })?,
            ),
            None => None,
        };
        let validator = SampleValidator::new(config.analysis.sample_minimums)?;
        let aggregator = DiscoveryAggregator::new(adapters, config.discovery.clone(), validator)?;
        let engine = AnalysisEngine::new(config.analysis.clone())?;
        let composer = Composer::new(config.synthesis.clone())?;
        let mut gatekeeper = Gatekeeper::new(config.validation.clone())?;
        if let Some(adapter) = recheck {
            info!(adapter = adapter.name(), "Price re-check enabled");
            gatekeeper = gatekeeper.with_recheck(adapter);
        }

        Ok(Self {
            config,
            aggregator,
            engine,
            composer,
            gatekeeper,
        })
    }

    /// Re-fetch prices through this adapter during validation
    ///
    /// Overrides any adapter named by `validation.recheck_adapter`.
    pub fn with_recheck(mut self, adapter: Arc<dyn SourceAdapter>) -> Self {
        self.gatekeeper = self.gatekeeper.with_recheck(adapter);
        self
    }

    /// Active configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run all four phases for one subject
    ///
    /// Phases run strictly in sequence, each on the complete output of the
    /// previous one. A cancelled discovery yields an error and no artifacts.
    pub async fn run_subject(
        &self,
        subject: &SubjectId,
        as_of: NaiveDate,
        cancel: &CancellationToken,
    ) -> Result<SubjectReport, PipelineError> {
        let discovery = self
            .aggregator
            .discover(subject, as_of, &self.config.fields, cancel)
            .await?;
        let analysis = self.engine.analyze(&discovery)?;
        let finding = self.composer.compose(&discovery, &analysis)?;
        let verdict = self
            .gatekeeper
            .validate(
                &finding,
                Some(Evidence {
                    discovery: &discovery,
                    analysis: &analysis,
                }),
            )
            .await?;

        Ok(SubjectReport {
            discovery,
            analysis,
            finding,
            verdict,
        })
    }

    /// Run many subjects through a bounded worker pool
    ///
    /// At most `max_concurrent_subjects` run at once. One subject's failure
    /// never stops its siblings.
    pub async fn run_batch(
        &self,
        subjects: &[SubjectId],
        as_of: NaiveDate,
        cancel: &CancellationToken,
    ) -> BatchReport {
        let started = Instant::now();
        info!(
            subjects = subjects.len(),
            concurrency = self.config.max_concurrent_subjects,
            as_of = %as_of,
            "Starting batch"
        );

        let mut outcomes: Vec<(usize, Result<SubjectReport, PipelineError>)> =
            stream::iter(subjects.iter().enumerate())
                .map(|(index, subject)| async move {
                    (index, self.run_subject(subject, as_of, cancel).await)
                })
                .buffer_unordered(self.config.max_concurrent_subjects)
                .collect()
                .await;
        outcomes.sort_by_key(|(index, _)| *index);

        let mut metrics = PipelineMetrics::new();
        let mut reports = Vec::new();
        let mut failures = Vec::new();
        for (index, outcome) in outcomes {
            match outcome {
                Ok(report) => {
                    for (adapter, status) in report.discovery.source_health() {
                        if !status.contributed() {
                            metrics.record_adapter_failure(adapter);
                        }
                    }
                    if report.certified() {
                        metrics.record_certified();
                    } else {
                        metrics.record_rejected();
                    }
                    reports.push(report);
                }
                Err(e) => {
                    let subject = subjects[index].clone();
                    error!(subject = %subject, error = %e, "Subject failed");
                    metrics.record_failed();
                    failures.push(SubjectFailure { subject, error: e });
                }
            }
        }
        metrics.total_runtime_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let batch = BatchReport {
            reports,
            failures,
            metrics,
        };
        info!(status = %batch.status(), "Batch complete:\n{}", batch.metrics.summary());
        batch
    }
}
