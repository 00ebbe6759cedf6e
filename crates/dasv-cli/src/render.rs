//! Markdown rendering of findings.

use dasv_domain::{CheckResult, Document, Finding, Renderer, ValidationVerdict};
use std::fmt::Write;

/// Renders a finding and its verdict as a Markdown report.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    /// Create a new renderer.
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for MarkdownRenderer {
    fn render(&self, finding: &Finding, verdict: &ValidationVerdict) -> Document {
        let title = format!("{} (as of {})", finding.subject_id(), finding.as_of_date());
        let status = if verdict.certified() { "Certified" } else { "Rejected" };

        // Writing to a String cannot fail
        let mut body = String::new();
        let _ = writeln!(body, "# {}\n", title);
        let _ = writeln!(body, "**Status:** {}  ", status);
        let _ = writeln!(
            body,
            "**Synthesis confidence:** {:.2}  ",
            finding.synthesis_confidence()
        );
        let _ = writeln!(
            body,
            "**Aggregate reliability:** {:.2} (threshold {:.2})",
            verdict.aggregate_reliability(),
            verdict.threshold()
        );

        if !finding.values().is_empty() {
            body.push_str("\n## Values\n\n");
            body.push_str("| Field | Value | Confidence | Source |\n");
            body.push_str("|---|---|---|---|\n");
            for (name, value) in finding.values() {
                let source = finding
                    .provenance()
                    .get(name)
                    .map(|p| format!("{}:{}", p.origin, p.field))
                    .unwrap_or_default();
                let _ = writeln!(
                    body,
                    "| {} | {} | {:.2} | {} |",
                    name,
                    format_value(&value.value),
                    value.confidence,
                    source
                );
            }
        }

        if let Some(rec) = finding.recommendation() {
            body.push_str("\n## Recommendation\n\n");
            let gap = rec
                .gap
                .map(|g| format!("{:+.1}%", g * 100.0))
                .unwrap_or_else(|| "n/a".to_string());
            let consistency = if rec.consistent { "consistent" } else { "inconsistent" };
            let _ = writeln!(
                body,
                "`{}` against a valuation gap of {} ({})",
                rec.recommendation, gap, consistency
            );
        }

        if !finding.exclusions().is_empty() {
            body.push_str("\n## Excluded analysis\n\n");
            for exclusion in finding.exclusions() {
                let _ = writeln!(body, "- {}: {}", exclusion.category, exclusion.reason);
            }
        }

        if !finding.review_flags().is_empty() {
            body.push_str("\n## Review flags\n\n");
            for flag in finding.review_flags() {
                let _ = writeln!(body, "- {} ({}): {}", flag.subject, flag.kind, flag.reason);
            }
        }

        body.push_str("\n## Validation\n\n");
        body.push_str("| Check | Result | Reason |\n");
        body.push_str("|---|---|---|\n");
        for check in verdict.checks() {
            let marker = match check.result {
                CheckResult::Pass => "pass",
                CheckResult::Flag => "**flag**",
                CheckResult::Fail => "**fail**",
            };
            let _ = writeln!(body, "| {} | {} | {} |", check.name, marker, check.reason);
        }

        Document {
            title,
            media_type: "text/markdown".to_string(),
            body,
        }
    }
}

fn format_value(value: &dasv_domain::FieldValue) -> String {
    match value.as_number() {
        Some(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", n),
        Some(n) => format!("{:.4}", n),
        None => value.to_string(),
    }
}
