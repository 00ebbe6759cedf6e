//! Run command implementation.

use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use chrono::Utc;
use dasv_adapters::Fixture;
use dasv_domain::{SampleMinimums, SubjectId, ValidationDepth};
use dasv_pipeline::{Pipeline, PipelineConfig, RunStatus};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Execute the run command.
pub async fn execute_run(
    args: RunArgs,
    config: PipelineConfig,
    formatter: &Formatter,
) -> Result<RunStatus> {
    let config = apply_overrides(config, &args)?;
    let subjects = parse_subjects(&args.subjects)?;

    let fixture = Fixture::load(&args.fixture)?;
    let rate_limited = fixture.rate_limit.is_some();
    let adapters = fixture.into_adapters();

    let as_of = args.as_of.unwrap_or_else(|| Utc::now().date_naive());
    info!(
        fixture = %args.fixture.display(),
        adapters = adapters.len(),
        rate_limited,
        recheck = config.validation.recheck_adapter.as_deref().unwrap_or("none"),
        subjects = subjects.len(),
        "Running pipeline"
    );

    let pipeline = Pipeline::new(config, adapters)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; cancelling in-flight subjects");
            on_interrupt.cancel();
        }
    });

    let batch = pipeline.run_batch(&subjects, as_of, &cancel).await;
    println!("{}", formatter.format_batch(&batch)?);
    Ok(batch.status())
}

/// Apply command-line overrides on top of the loaded configuration.
///
/// Choosing a depth without a threshold uses that depth's default threshold.
/// `--recheck` replaces any configured re-check adapter.
pub fn apply_overrides(mut config: PipelineConfig, args: &RunArgs) -> Result<PipelineConfig> {
    let mut invocation = config.invocation();

    if let Some(depth) = args.depth {
        let depth = ValidationDepth::from(depth);
        invocation.validation_depth = depth;
        invocation.confidence_threshold = depth.default_threshold();
    }
    if let Some(threshold) = args.threshold {
        invocation.confidence_threshold = threshold;
    }
    invocation.sample_minimums = SampleMinimums {
        basic: args.basic.unwrap_or(invocation.sample_minimums.basic),
        significant: args
            .significant
            .unwrap_or(invocation.sample_minimums.significant),
    };

    config.apply_invocation(invocation);
    if let Some(recheck) = &args.recheck {
        config.validation.recheck_adapter = Some(recheck.clone());
    }
    config.validate()?;
    Ok(config)
}

fn parse_subjects(raw: &[String]) -> Result<Vec<SubjectId>> {
    if raw.is_empty() {
        return Err(CliError::InvalidInput("at least one subject is required".to_string()));
    }
    raw.iter()
        .map(|s| SubjectId::new(s).map_err(|e| CliError::InvalidInput(e.to_string())))
        .collect()
}
