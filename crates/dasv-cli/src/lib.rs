//! DASV CLI library.
//!
//! Configuration loading, command execution, output formatting and the
//! Markdown renderer behind the `dasv` binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod render;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;
pub use render::MarkdownRenderer;
