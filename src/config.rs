//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.shoplens.toml` files.

use crate::cli::{Args, OutputFormat, SeedArgs};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = ".shoplens.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Analysis endpoint settings.
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,

    /// Document store provisioning settings.
    #[serde(default)]
    pub store: StoreConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Where and how to fetch the analysis payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Service origin, e.g. `http://localhost:5001`.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Path of the analysis resource.
    #[serde(default = "default_path")]
    pub path: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            path: default_path(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_origin() -> String {
    "http://localhost:5001".to_string()
}

fn default_path() -> String {
    "/api/analysis".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl EndpointConfig {
    /// Full URL of the analysis resource.
    pub fn url(&self) -> String {
        format!(
            "{}/{}",
            self.origin.trim_end_matches('/'),
            self.path.trim_start_matches('/')
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Default output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Show each series' color identifier in Markdown output.
    #[serde(default = "default_true")]
    pub include_colors: bool,

    /// Width in characters of the longest bar in Markdown output.
    #[serde(default = "default_bar_width")]
    pub bar_width: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            include_colors: true,
            bar_width: default_bar_width(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_bar_width() -> usize {
    30
}

/// Document store provisioning settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Connection string used when applying the plan.
    #[serde(default = "default_store_uri")]
    pub uri: String,

    /// Database holding the administrative user.
    #[serde(default = "default_admin_database")]
    pub admin_database: String,

    #[serde(default = "default_admin_user")]
    pub admin_user: String,

    #[serde(default = "default_admin_password")]
    pub admin_password: String,

    /// Application database.
    #[serde(default = "default_database")]
    pub database: String,

    /// Collection receiving web traffic events.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Fields indexed ascending on the collection.
    #[serde(default = "default_indexes")]
    pub indexes: Vec<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uri: default_store_uri(),
            admin_database: default_admin_database(),
            admin_user: default_admin_user(),
            admin_password: default_admin_password(),
            database: default_database(),
            collection: default_collection(),
            indexes: default_indexes(),
        }
    }
}

fn default_store_uri() -> String {
    "mongodb://localhost:27017".to_string()
}

fn default_admin_database() -> String {
    "admin".to_string()
}

fn default_admin_user() -> String {
    "admin".to_string()
}

fn default_admin_password() -> String {
    "admin".to_string()
}

fn default_database() -> String {
    "ecommerce_analytics".to_string()
}

fn default_collection() -> String {
    "web_traffic".to_string()
}

fn default_indexes() -> Vec<String> {
    vec!["timestamp", "product_id", "user_id"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with dashboard CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref origin) = args.origin {
            self.endpoint.origin = origin.clone();
        }
        if let Some(timeout) = args.timeout {
            self.endpoint.timeout_seconds = timeout;
        }
        if let Some(format) = args.format {
            self.report.format = format;
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Merge this configuration with provisioning CLI arguments.
    pub fn merge_with_seed_args(&mut self, args: &SeedArgs) {
        if let Some(ref uri) = args.uri {
            self.store.uri = uri.clone();
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
