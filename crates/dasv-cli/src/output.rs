//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use crate::render::MarkdownRenderer;
use colored::*;
use dasv_domain::Renderer;
use dasv_pipeline::{BatchReport, RunStatus, SubjectReport};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format the outcome of a batch run.
    pub fn format_batch(&self, batch: &BatchReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => self.format_batch_json(batch),
            OutputFormat::Table => Ok(self.format_batch_table(batch)),
            OutputFormat::Markdown => Ok(self.format_batch_markdown(batch)),
        }
    }

    /// Format every artifact as JSON.
    fn format_batch_json(&self, batch: &BatchReport) -> Result<String> {
        let failures: Vec<serde_json::Value> = batch
            .failures
            .iter()
            .map(|f| {
                serde_json::json!({
                    "subject_id": f.subject,
                    "status": f.error.status(),
                    "error": f.error.to_string(),
                })
            })
            .collect();

        let output = serde_json::json!({
            "status": batch.status(),
            "subjects": batch.reports,
            "failures": failures,
            "metrics": batch.metrics,
        });
        Ok(serde_json::to_string_pretty(&output)?)
    }

    /// Format a one-row-per-subject summary table.
    fn format_batch_table(&self, batch: &BatchReport) -> String {
        let mut sections = Vec::new();

        if batch.reports.is_empty() {
            sections.push(self.colorize("No subjects completed.", "yellow"));
        } else {
            let mut builder = Builder::default();
            builder.push_record([
                "Subject",
                "As Of",
                "Discovery",
                "Analysis",
                "Synthesis",
                "Aggregate",
                "Checks (P/F/X)",
                "Verdict",
            ]);
            for report in &batch.reports {
                builder.push_record(self.summary_row(report));
            }

            let mut table = builder.build();
            table
                .with(Style::rounded())
                .with(Modify::new(Rows::first()).with(Alignment::center()));
            sections.push(table.to_string());

            for report in batch.reports.iter().filter(|r| !r.certified()) {
                let mut lines = vec![self.warning(&format!("{} rejected:", report.subject_id()))];
                for reason in report.verdict.rejection_reasons() {
                    lines.push(format!("  - {}", reason));
                }
                sections.push(lines.join("\n"));
            }
        }

        for failure in &batch.failures {
            sections.push(self.error(&format!("{}: {}", failure.subject, failure.error)));
        }

        sections.push(self.status_line(batch.status()));
        sections.join("\n\n")
    }

    fn summary_row(&self, report: &SubjectReport) -> Vec<String> {
        use dasv_domain::CheckResult;

        let verdict = &report.verdict;
        let label = if report.certified() {
            self.colorize("CERTIFIED", "green")
        } else {
            self.colorize("REJECTED", "red")
        };
        vec![
            report.subject_id().to_string(),
            report.finding.as_of_date().to_string(),
            format!("{:.2}", report.discovery.overall_confidence()),
            format!("{:.2}", report.analysis.overall_confidence()),
            format!("{:.2}", report.finding.synthesis_confidence()),
            format!("{:.2} / {:.2}", verdict.aggregate_reliability(), verdict.threshold()),
            format!(
                "{}/{}/{}",
                verdict.count(CheckResult::Pass),
                verdict.count(CheckResult::Flag),
                verdict.count(CheckResult::Fail)
            ),
            label,
        ]
    }

    /// Render each finding as a Markdown document.
    fn format_batch_markdown(&self, batch: &BatchReport) -> String {
        let renderer = MarkdownRenderer::new();
        let mut documents: Vec<String> = batch
            .reports
            .iter()
            .map(|r| renderer.render(&r.finding, &r.verdict).body)
            .collect();

        if !batch.failures.is_empty() {
            let mut failed = String::from("# Failed subjects\n\n");
            for failure in &batch.failures {
                failed.push_str(&format!("- {}: {}\n", failure.subject, failure.error));
            }
            documents.push(failed);
        }
        documents.join("\n---\n\n")
    }

    /// Format the final run status.
    pub fn status_line(&self, status: RunStatus) -> String {
        let message = format!("Run status: {} (exit {})", status, status.exit_code());
        match status {
            RunStatus::SuccessCertified => self.success(&message),
            RunStatus::SuccessRejected => self.warning(&message),
            RunStatus::PartialFailure | RunStatus::ConfigError => self.error(&message),
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}
