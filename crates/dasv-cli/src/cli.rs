//! CLI command definitions and argument parsing.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use dasv_domain::ValidationDepth;
use std::path::PathBuf;

/// DASV - Discover, Analyze, Synthesize and Validate research subjects.
#[derive(Debug, Parser)]
#[command(name = "dasv")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "DASV_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table summary (default)
    Table,
    /// JSON artifacts
    Json,
    /// Markdown documents
    Markdown,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the pipeline over subjects from a fixture
    Run(RunArgs),

    /// Print the effective pipeline configuration as TOML
    Config,
}

/// Arguments for the run command.
#[derive(Debug, Parser)]
pub struct RunArgs {
    /// JSON fixture describing the source adapters
    #[arg(long)]
    pub fixture: PathBuf,

    /// Subject identifiers to run
    #[arg(short, long = "subject", required = true, num_args = 1..)]
    pub subjects: Vec<String>,

    /// As-of date (YYYY-MM-DD); today when omitted
    #[arg(long)]
    pub as_of: Option<NaiveDate>,

    /// Minimum aggregate reliability for certification (0.0-1.0]
    #[arg(short, long)]
    pub threshold: Option<f64>,

    /// Minimum sample for any statistical claim
    #[arg(long)]
    pub basic: Option<usize>,

    /// Minimum sample for a significant statistical claim
    #[arg(long)]
    pub significant: Option<usize>,

    /// Validation depth
    #[arg(short, long, value_enum)]
    pub depth: Option<DepthArg>,

    /// Fixture adapter used to re-fetch the price during validation
    #[arg(long, value_name = "ADAPTER")]
    pub recheck: Option<String>,
}

/// Validation depth argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DepthArg {
    /// Standard checks
    Standard,
    /// Adds disclosure expectations
    Comprehensive,
    /// Strictest thresholds and tolerances
    Institutional,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Markdown => crate::config::OutputFormat::Markdown,
        }
    }
}

impl From<DepthArg> for ValidationDepth {
    fn from(depth: DepthArg) -> Self {
        match depth {
            DepthArg::Standard => ValidationDepth::Standard,
            DepthArg::Comprehensive => ValidationDepth::Comprehensive,
            DepthArg::Institutional => ValidationDepth::Institutional,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_command() {
        let cli = Cli::parse_from([
            "dasv",
            "run",
            "--fixture",
            "sources.json",
            "--subject",
            "AAPL",
            "MSFT",
            "--as-of",
            "2024-03-01",
            "--threshold",
            "0.95",
            "--depth",
            "institutional",
        ]);
        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.subjects, vec!["AAPL", "MSFT"]);
                assert_eq!(args.as_of, NaiveDate::from_ymd_opt(2024, 3, 1));
                assert_eq!(args.threshold, Some(0.95));
                assert_eq!(args.depth, Some(DepthArg::Institutional));
                assert!(args.basic.is_none());
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_run_requires_subject() {
        let result = Cli::try_parse_from(["dasv", "run", "--fixture", "sources.json"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_format() {
        let cli = Cli::parse_from(["dasv", "config", "--format", "json"]);
        assert!(matches!(cli.command, Command::Config));
        assert_eq!(cli.format, Some(CliFormat::Json));
    }

    #[test]
    fn test_depth_conversion() {
        let depth: ValidationDepth = DepthArg::Comprehensive.into();
        assert_eq!(depth, ValidationDepth::Comprehensive);
    }
}
