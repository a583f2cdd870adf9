//! Markdown and JSON dashboard generation.
//!
//! This module renders view descriptors as a terminal-friendly Markdown
//! document or as JSON.

use crate::config::ReportConfig;
use crate::session::SessionState;
use crate::views::{BarChart, Section, TextPanel, View};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Metadata about one rendered dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardMetadata {
    /// URL or file the payload was loaded from.
    pub source: String,
    pub generated_at: DateTime<Utc>,
    /// Ordering anomalies reported for the payload.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// A rendered dashboard: metadata plus views.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub metadata: DashboardMetadata,
    pub views: Vec<View>,
}

/// Markdown rendering options.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub include_colors: bool,
    pub bar_width: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            include_colors: true,
            bar_width: 30,
        }
    }
}

impl From<&ReportConfig> for RenderOptions {
    fn from(config: &ReportConfig) -> Self {
        Self {
            include_colors: config.include_colors,
            bar_width: config.bar_width,
        }
    }
}

/// Render a non-loaded session state. Returns `None` for `Loaded`.
pub fn generate_status_text(state: &SessionState) -> Option<String> {
    match state {
        SessionState::Idle => Some("Not started.".to_string()),
        SessionState::Loading => Some("Loading analysis data...".to_string()),
        SessionState::Failed { message, .. } => Some(format!("Error: {}", message)),
        SessionState::Loaded(_) => None,
    }
}

/// Generate a complete Markdown dashboard.
pub fn generate_markdown_report(dashboard: &Dashboard, options: &RenderOptions) -> String {
    let mut output = String::new();

    output.push_str("# Analytics Dashboard\n\n");
    output.push_str(&generate_metadata_section(&dashboard.metadata));

    let mut current: Option<Section> = None;
    for view in &dashboard.views {
        if current != Some(view.section()) {
            output.push_str(&format!("## {}\n\n", view.section()));
            current = Some(view.section());
        }

        match view {
            View::BarChart(chart) => output.push_str(&generate_chart_block(chart, options)),
            View::Text(panel) => output.push_str(&generate_text_block(panel)),
        }
    }

    output
}

/// Generate a JSON dashboard.
pub fn generate_json_report(dashboard: &Dashboard) -> Result<String> {
    serde_json::to_string_pretty(dashboard).map_err(Into::into)
}

/// Generate the JSON error body for a failed session.
pub fn generate_json_error(message: &str) -> Result<String> {
    serde_json::to_string_pretty(&serde_json::json!({ "error": message })).map_err(Into::into)
}

fn generate_metadata_section(metadata: &DashboardMetadata) -> String {
    let mut section = String::new();

    section.push_str(&format!("- **Source:** {}\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    for warning in &metadata.warnings {
        section.push_str(&format!("- **Warning:** {}\n", warning));
    }
    section.push('\n');

    section
}

fn generate_chart_block(chart: &BarChart, options: &RenderOptions) -> String {
    let mut block = String::new();

    block.push_str(&format!("### {}\n\n", chart.title));

    if chart.categories.is_empty() {
        block.push_str("*No data.*\n\n");
        return block;
    }

    if options.include_colors {
        let legend: Vec<String> = chart
            .series
            .iter()
            .map(|s| format!("{} `{}`", s.label, s.color))
            .collect();
        block.push_str(&format!("*Legend: {}*\n\n", legend.join(" | ")));
    }

    // Header
    block.push_str(&format!("| {} |", escape_cell(&chart.category_key)));
    for series in &chart.series {
        block.push_str(&format!(" {} |", escape_cell(&series.label)));
    }
    let single = chart.series.len() == 1;
    if single {
        block.push_str(" |");
    }
    block.push('\n');

    block.push_str("|:---|");
    for _ in &chart.series {
        block.push_str("---:|");
    }
    if single {
        block.push_str(":---|");
    }
    block.push('\n');

    let max = chart
        .series
        .first()
        .map(|s| s.values.iter().cloned().fold(0.0_f64, f64::max))
        .unwrap_or(0.0);

    for (i, category) in chart.categories.iter().enumerate() {
        block.push_str(&format!("| {} |", escape_cell(category)));
        for series in &chart.series {
            let value = series.values.get(i).copied().unwrap_or(0.0);
            block.push_str(&format!(" {} |", format_value(value)));
        }
        if single {
            let value = chart.series[0].values.get(i).copied().unwrap_or(0.0);
            block.push_str(&format!(" {} |", bar(value, max, options.bar_width)));
        }
        block.push('\n');
    }
    block.push('\n');

    block
}

fn generate_text_block(panel: &TextPanel) -> String {
    let mut block = String::new();

    block.push_str(&format!("### {}\n\n", panel.title));
    for line in &panel.lines {
        block.push_str(&format!("- {}\n", line));
    }
    block.push('\n');

    block
}

/// Make server-provided text safe inside a Markdown table cell.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\r', '\n'], " ")
}

/// Whole numbers without decimals, everything else with two.
fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

fn bar(value: f64, max: f64, width: usize) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let len = ((value / max) * width as f64).round() as usize;
    "█".repeat(len.max(1))
}
