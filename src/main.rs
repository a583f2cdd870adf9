//! shoplens - terminal dashboard for e-commerce analytics
//!
//! Fetches the aggregated analysis from the analytics service and renders
//! it as Markdown or JSON.
//!
//! Exit codes:
//!   0 - Dashboard rendered
//!   1 - Fetch failed, or a runtime error (config, output file, etc.)

use anyhow::{Context, Result};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use shoplens::cli::{Args, OutputFormat};
use shoplens::client::AnalysisClient;
use shoplens::config::{Config, CONFIG_FILE};
use shoplens::contract::check_ordering;
use shoplens::report::{self, Dashboard, DashboardMetadata, RenderOptions};
use shoplens::session::{PayloadSource, Session, SessionState};
use shoplens::views::build_views;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config first: `[general] verbose` feeds the log level
    let (mut config, origin) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(args.log_level(config.general.verbose));

    info!("shoplens v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match origin {
        ConfigOrigin::File(path) => info!("Loaded config from {}", path.display()),
        ConfigOrigin::Builtin => debug!("No config file found, using defaults"),
        ConfigOrigin::Invalid(reason) => warn!("Failed to load config: {}", reason),
    }

    match run_dashboard(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Dashboard failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .shoplens.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("{} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("Created {} with default settings.", CONFIG_FILE);
    Ok(())
}

/// Initialize logging at the given level.
///
/// Logs go to stderr so the dashboard can be piped from stdout.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run one dashboard session. Returns the exit code.
async fn run_dashboard(args: Args, config: Config) -> Result<i32> {
    let source = match args.input {
        Some(ref path) => PayloadSource::File(path.clone()),
        None => PayloadSource::Http(
            AnalysisClient::from_config(&config.endpoint)
                .context("Failed to create HTTP client")?,
        ),
    };
    let source_label = match source {
        PayloadSource::Http(ref client) => client.url().to_string(),
        PayloadSource::File(ref path) => path.display().to_string(),
    };

    let session = Session::new(source);
    session.start();

    let spinner = (!args.quiet).then(|| loading_spinner(&session.current_state()));
    let state = session.settled().await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let payload = match &state {
        SessionState::Loaded(payload) => payload.clone(),
        SessionState::Failed { message, cause } => {
            debug!("Failure cause: {}", cause);
            match config.report.format {
                OutputFormat::Json => write_output(&args, &report::generate_json_error(message)?)?,
                OutputFormat::Markdown => {
                    if let Some(text) = report::generate_status_text(&state) {
                        eprintln!("{}", text);
                    }
                }
            }
            return Ok(1);
        }
        other => anyhow::bail!("Session ended in unexpected state: {}", other.label()),
    };

    let dashboard = Dashboard {
        metadata: DashboardMetadata {
            source: source_label,
            generated_at: Utc::now(),
            warnings: check_ordering(&payload)
                .iter()
                .map(ToString::to_string)
                .collect(),
        },
        views: build_views(&payload),
    };

    let output = match config.report.format {
        OutputFormat::Json => report::generate_json_report(&dashboard)?,
        OutputFormat::Markdown => {
            report::generate_markdown_report(&dashboard, &RenderOptions::from(&config.report))
        }
    };
    write_output(&args, &output)?;

    info!("Rendered {} views", dashboard.views.len());
    Ok(0)
}

fn loading_spinner(state: &SessionState) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(report::generate_status_text(state).unwrap_or_default());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn write_output(args: &Args, content: &str) -> Result<()> {
    match args.output {
        Some(ref path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write dashboard to {}", path.display()))?;
            info!("Dashboard saved to {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

/// Where the effective configuration came from.
enum ConfigOrigin {
    File(PathBuf),
    Builtin,
    /// The default file exists but could not be loaded; defaults are used.
    Invalid(String),
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so the outcome is returned for logging later.
fn load_config(args: &Args) -> Result<(Config, ConfigOrigin)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigOrigin::File(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigOrigin::File(PathBuf::from(CONFIG_FILE)))),
        Ok(None) => Ok((Config::default(), ConfigOrigin::Builtin)),
        Err(e) => Ok((Config::default(), ConfigOrigin::Invalid(format!("{:#}", e)))),
    }
}
