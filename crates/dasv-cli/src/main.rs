//! DASV CLI - Command-line interface for the DASV research pipeline.

use clap::Parser;
use dasv_cli::commands;
use dasv_cli::{Cli, Command, Config, Formatter};
use dasv_pipeline::RunStatus;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize tracing (log to stderr)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let status = match run().await {
        Ok(status) => status,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.status()
        }
    };
    std::process::exit(status.exit_code());
}

async fn run() -> dasv_cli::Result<RunStatus> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;

    // Determine output format
    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Run(args) => commands::execute_run(args, config.pipeline, &formatter).await,
        Command::Config => {
            commands::execute_config(&config)?;
            Ok(RunStatus::SuccessCertified)
        }
    }
}
