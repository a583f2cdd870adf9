//! Ordering diagnostics.
//!
//! The server is expected to send ranked lists highest first and time series
//! oldest first. These checks only report deviations; the payload is never
//! reordered.

use super::models::AnalysisPayload;
use std::fmt;

/// Maximum length of the top-customers list.
pub const TOP_CUSTOMERS_LIMIT: usize = 5;

/// A deviation from the expected ordering of a sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderingWarning {
    /// A ranked list has more entries than its contract allows.
    TooLong {
        path: &'static str,
        len: usize,
        limit: usize,
    },
    /// A ranked list is not sorted highest first at `index`.
    NotDescending { path: &'static str, index: usize },
    /// A time series label is not after the previous one at `index`.
    NotChronological { path: &'static str, index: usize },
}

impl fmt::Display for OrderingWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderingWarning::TooLong { path, len, limit } => {
                write!(f, "{} has {} entries (expected at most {})", path, len, limit)
            }
            OrderingWarning::NotDescending { path, index } => {
                write!(f, "{}[{}] is larger than the entry before it", path, index)
            }
            OrderingWarning::NotChronological { path, index } => {
                write!(f, "{}[{}] is not later than the entry before it", path, index)
            }
        }
    }
}

/// Check all ranked lists and time series in the payload.
pub fn check_ordering(payload: &AnalysisPayload) -> Vec<OrderingWarning> {
    let mut warnings = Vec::new();
    let pg = &payload.postgres;
    let mongo = &payload.mongodb;

    if pg.top_customers.len() > TOP_CUSTOMERS_LIMIT {
        warnings.push(OrderingWarning::TooLong {
            path: "postgres.topCustomers",
            len: pg.top_customers.len(),
            limit: TOP_CUSTOMERS_LIMIT,
        });
    }

    let values: Vec<f64> = pg.top_customers.iter().map(|c| c.total_value).collect();
    if let Some(index) = first_increase(&values) {
        warnings.push(OrderingWarning::NotDescending {
            path: "postgres.topCustomers",
            index,
        });
    }

    let views: Vec<f64> = mongo
        .most_viewed_products
        .iter()
        .map(|p| p.views as f64)
        .collect();
    if let Some(index) = first_increase(&views) {
        warnings.push(OrderingWarning::NotDescending {
            path: "mongodb.mostViewedProducts",
            index,
        });
    }

    // Labels are zero-padded (`2024-03`, `09:00`), so lexical order is time order.
    let months: Vec<&str> = pg.monthly_trend.iter().map(|m| m.month.as_str()).collect();
    if let Some(index) = first_non_ascending(&months) {
        warnings.push(OrderingWarning::NotChronological {
            path: "postgres.monthlyTrend",
            index,
        });
    }

    let hours: Vec<&str> = mongo.hourly_traffic.iter().map(|h| h.hour.as_str()).collect();
    if let Some(index) = first_non_ascending(&hours) {
        warnings.push(OrderingWarning::NotChronological {
            path: "mongodb.hourlyTraffic",
            index,
        });
    }

    warnings
}

fn first_increase(values: &[f64]) -> Option<usize> {
    values
        .windows(2)
        .position(|w| w[1] > w[0])
        .map(|i| i + 1)
}

fn first_non_ascending(labels: &[&str]) -> Option<usize> {
    labels
        .windows(2)
        .position(|w| w[1] <= w[0])
        .map(|i| i + 1)
}
