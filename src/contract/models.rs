//! Data models for the analytics payload.
//!
//! This module contains the record and section types of the payload served
//! by the analysis endpoint. Field names match the wire format exactly.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The complete analytics snapshot returned by one fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisPayload {
    /// Aggregates computed against the relational store.
    pub postgres: RelationalSection,
    /// Aggregates computed against the document store.
    pub mongodb: DocumentSection,
}

/// Relational-store aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationalSection {
    /// Top customers by total order value, highest first.
    pub top_customers: Vec<TopCustomer>,
    /// Sales per product category.
    pub category_analysis: Vec<CategorySales>,
    /// Sales per month, oldest first.
    pub monthly_trend: Vec<MonthlySales>,
}

/// Document-store aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSection {
    /// Products with the most page views, highest first.
    pub most_viewed_products: Vec<ProductViews>,
    /// Averages over all browsing sessions.
    pub user_session_analysis: SessionStats,
    /// Event counts per hour bucket, oldest first.
    pub hourly_traffic: Vec<HourlyTraffic>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopCustomer {
    pub customer_id: i64,
    pub total_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySales {
    pub category: String,
    pub total_sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySales {
    /// Month label, e.g. `2024-03`.
    pub month: String,
    pub total_sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductViews {
    pub product_id: i64,
    pub views: u64,
}

/// Session-level averages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub avg_events_per_session: f64,
    pub avg_unique_pages_per_session: f64,
    /// Share of sessions containing a purchase, on a 0-100 scale.
    pub purchase_conversion_rate: f64,
}

/// Event counts for one hour bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyTraffic {
    /// Hour label, e.g. `09:00`.
    pub hour: String,
    pub add_to_cart: u64,
    pub cart_view: u64,
    pub checkout: u64,
    pub page_view: u64,
    pub purchase: u64,
    pub remove_from_cart: u64,
}

/// The six tracked web event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PageView,
    AddToCart,
    CartView,
    Checkout,
    Purchase,
    RemoveFromCart,
}

impl EventKind {
    /// All event kinds in display order.
    pub const ALL: [EventKind; 6] = [
        EventKind::PageView,
        EventKind::AddToCart,
        EventKind::CartView,
        EventKind::Checkout,
        EventKind::Purchase,
        EventKind::RemoveFromCart,
    ];

    /// Wire field name of this counter.
    pub fn field(&self) -> &'static str {
        match self {
            EventKind::PageView => "page_view",
            EventKind::AddToCart => "add_to_cart",
            EventKind::CartView => "cart_view",
            EventKind::Checkout => "checkout",
            EventKind::Purchase => "purchase",
            EventKind::RemoveFromCart => "remove_from_cart",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::PageView => write!(f, "Page Views"),
            EventKind::AddToCart => write!(f, "Add to Cart"),
            EventKind::CartView => write!(f, "Cart Views"),
            EventKind::Checkout => write!(f, "Checkout"),
            EventKind::Purchase => write!(f, "Purchase"),
            EventKind::RemoveFromCart => write!(f, "Remove from Cart"),
        }
    }
}

impl HourlyTraffic {
    /// Returns the counter for one event kind.
    pub fn count(&self, kind: EventKind) -> u64 {
        match kind {
            EventKind::PageView => self.page_view,
            EventKind::AddToCart => self.add_to_cart,
            EventKind::CartView => self.cart_view,
            EventKind::Checkout => self.checkout,
            EventKind::Purchase => self.purchase,
            EventKind::RemoveFromCart => self.remove_from_cart,
        }
    }

    /// Total events recorded in this hour.
    pub fn total(&self) -> u64 {
        EventKind::ALL.iter().map(|k| self.count(*k)).sum()
    }
}
