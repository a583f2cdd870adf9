//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// shoplens - terminal dashboard for e-commerce analytics
///
/// Fetches the aggregated analysis from the analytics service and renders
/// it as bar charts and summary text.
///
/// Examples:
///   shoplens
///   shoplens --origin http://analytics:5001 --format json
///   shoplens --input saved_payload.json --output dashboard.md
///   shoplens --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Origin of the analytics service
    ///
    /// Defaults to the value in .shoplens.toml, or http://localhost:5001.
    #[arg(long, value_name = "URL", env = "SHOPLENS_ORIGIN")]
    pub origin: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .shoplens.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Decode a saved payload file instead of fetching
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Write the dashboard to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .shoplens.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// shoplens-seed - provision the document store for web traffic analytics
///
/// Creates the administrative user, the application database and
/// collection, and the collection's indexes.
///
/// Examples:
///   shoplens-seed --emit-script init-mongo.js
///   shoplens-seed --uri mongodb://localhost:27018
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct SeedArgs {
    /// Document store connection string
    #[arg(long, value_name = "URI", env = "SHOPLENS_MONGO_URI")]
    pub uri: Option<String>,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write the provisioning plan as a mongosh script and exit
    #[arg(long, value_name = "FILE")]
    pub emit_script: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Output format for the dashboard.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(ref origin) = self.origin {
            if !origin.starts_with("http://") && !origin.starts_with("https://") {
                return Err("Origin must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref input) = self.input {
            if !input.is_file() {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is the `[general] verbose` setting; `--quiet` wins over it.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

impl SeedArgs {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
