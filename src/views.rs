//! Mapping from a loaded payload to view descriptors.
//!
//! [`build_views`] is a pure function: the same payload always yields the
//! same list of views, in the same order.

use crate::contract::{AnalysisPayload, EventKind, HourlyTraffic, SessionStats};
use serde::Serialize;
use std::fmt;

/// Dashboard section a view belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Relational,
    Document,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Section::Relational => write!(f, "PostgreSQL Analysis"),
            Section::Document => write!(f, "MongoDB Analysis"),
        }
    }
}

/// One renderable panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum View {
    BarChart(BarChart),
    Text(TextPanel),
}

impl View {
    pub fn id(&self) -> &str {
        match self {
            View::BarChart(chart) => &chart.id,
            View::Text(panel) => &panel.id,
        }
    }

    pub fn section(&self) -> Section {
        match self {
            View::BarChart(chart) => chart.section,
            View::Text(panel) => panel.section,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            View::BarChart(chart) => &chart.title,
            View::Text(panel) => &panel.title,
        }
    }
}

/// A categorical bar chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    /// Wire name of the metric, e.g. `topCustomers`.
    pub id: String,
    pub section: Section,
    pub title: String,
    /// Record field used for the category axis.
    pub category_key: String,
    /// Category labels in payload order.
    pub categories: Vec<String>,
    pub series: Vec<Series>,
}

/// One value series of a bar chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    /// Record field the values come from.
    pub key: String,
    pub label: String,
    /// Color identifier, unique within the chart.
    pub color: String,
    /// One value per category.
    pub values: Vec<f64>,
}

/// Formatted summary text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextPanel {
    pub id: String,
    pub section: Section,
    pub title: String,
    pub lines: Vec<String>,
}

const PURPLE: &str = "#8884d8";
const GREEN: &str = "#82ca9d";
const YELLOW: &str = "#ffc658";
const ORANGE: &str = "#ff8042";
const BLUE: &str = "#0088fe";
const RED: &str = "#ff0000";

/// Build every view for a loaded payload.
pub fn build_views(payload: &AnalysisPayload) -> Vec<View> {
    let pg = &payload.postgres;
    let mongo = &payload.mongodb;

    vec![
        View::BarChart(single_series_chart(
            "topCustomers",
            Section::Relational,
            "Top 5 Customers by Total Order Value",
            "customer_id",
            pg.top_customers
                .iter()
                .map(|c| (c.customer_id.to_string(), c.total_value))
                .collect(),
            ("total_value", "Total Value", PURPLE),
        )),
        View::BarChart(single_series_chart(
            "categoryAnalysis",
            Section::Relational,
            "Product Category Analysis",
            "category",
            pg.category_analysis
                .iter()
                .map(|c| (c.category.clone(), c.total_sales))
                .collect(),
            ("total_sales", "Total Sales", GREEN),
        )),
        View::BarChart(single_series_chart(
            "monthlyTrend",
            Section::Relational,
            "Monthly Sales Trend",
            "month",
            pg.monthly_trend
                .iter()
                .map(|m| (m.month.clone(), m.total_sales))
                .collect(),
            ("total_sales", "Total Sales", ORANGE),
        )),
        View::BarChart(single_series_chart(
            "mostViewedProducts",
            Section::Document,
            "Most Viewed Products",
            "product_id",
            mongo
                .most_viewed_products
                .iter()
                .map(|p| (p.product_id.to_string(), p.views as f64))
                .collect(),
            ("views", "Views", YELLOW),
        )),
        View::Text(TextPanel {
            id: "userSessionAnalysis".to_string(),
            section: Section::Document,
            title: "User Session Analysis".to_string(),
            lines: session_lines(&mongo.user_session_analysis),
        }),
        View::BarChart(hourly_chart(&mongo.hourly_traffic)),
    ]
}

/// Format session averages with two decimals.
pub fn session_lines(stats: &SessionStats) -> Vec<String> {
    vec![
        format!(
            "Average Events per Session: {:.2}",
            stats.avg_events_per_session
        ),
        format!(
            "Average Unique Pages per Session: {:.2}",
            stats.avg_unique_pages_per_session
        ),
        format!(
            "Purchase Conversion Rate: {:.2}%",
            stats.purchase_conversion_rate
        ),
    ]
}

fn single_series_chart(
    id: &str,
    section: Section,
    title: &str,
    category_key: &str,
    points: Vec<(String, f64)>,
    (key, label, color): (&str, &str, &str),
) -> BarChart {
    let (categories, values) = points.into_iter().unzip();
    BarChart {
        id: id.to_string(),
        section,
        title: title.to_string(),
        category_key: category_key.to_string(),
        categories,
        series: vec![Series {
            key: key.to_string(),
            label: label.to_string(),
            color: color.to_string(),
            values,
        }],
    }
}

fn event_color(kind: EventKind) -> &'static str {
    match kind {
        EventKind::PageView => PURPLE,
        EventKind::AddToCart => GREEN,
        EventKind::CartView => YELLOW,
        EventKind::Checkout => ORANGE,
        EventKind::Purchase => BLUE,
        EventKind::RemoveFromCart => RED,
    }
}

fn hourly_chart(hours: &[HourlyTraffic]) -> BarChart {
    let series = EventKind::ALL
        .iter()
        .map(|kind| Series {
            key: kind.field().to_string(),
            label: kind.to_string(),
            color: event_color(*kind).to_string(),
            values: hours.iter().map(|h| h.count(*kind) as f64).collect(),
        })
        .collect();

    BarChart {
        id: "hourlyTraffic".to_string(),
        section: Section::Document,
        title: "Hourly Traffic Analysis".to_string(),
        category_key: "hour".to_string(),
        categories: hours.iter().map(|h| h.hour.clone()).collect(),
        series,
    }
}
