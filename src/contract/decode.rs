//! Payload decoding and validation.
//!
//! The payload is parsed into a [`serde_json::Value`] first and then walked
//! field by field, so every failure can name the exact path of the offending
//! field (e.g. `mongodb.hourlyTraffic[3].checkout`). Unknown fields are
//! ignored.

use super::models::{
    AnalysisPayload, CategorySales, DocumentSection, HourlyTraffic, MonthlySales, ProductViews,
    RelationalSection, SessionStats, TopCustomer,
};
use serde_json::{Map, Value};
use std::fmt;

/// Path reported for failures that concern the whole document.
pub const ROOT_PATH: &str = "$";

/// Why a payload was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// The bytes are not valid JSON.
    MalformedJson,
    /// A required field is absent.
    MissingField,
    /// A field is present but has the wrong JSON type.
    TypeMismatch,
    /// A field has the right type but violates a value invariant.
    OutOfRange,
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeErrorKind::MalformedJson => write!(f, "malformed JSON"),
            DecodeErrorKind::MissingField => write!(f, "missing field"),
            DecodeErrorKind::TypeMismatch => write!(f, "type mismatch"),
            DecodeErrorKind::OutOfRange => write!(f, "value out of range"),
        }
    }
}

/// A payload that does not satisfy the contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at `{path}`: {detail}")]
pub struct DecodeError {
    pub kind: DecodeErrorKind,
    /// Dotted path of the offending field, `$` for the whole document.
    pub path: String,
    pub detail: String,
}

impl DecodeError {
    fn new(kind: DecodeErrorKind, path: &str, detail: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.to_string(),
            detail: detail.into(),
        }
    }

    fn mismatch(path: &str, expected: &str, found: &Value) -> Self {
        Self::new(
            DecodeErrorKind::TypeMismatch,
            path,
            format!("expected {}, found {}", expected, json_type(found)),
        )
    }
}

/// Decode raw response bytes into an [`AnalysisPayload`].
pub fn decode(raw: &[u8]) -> Result<AnalysisPayload, DecodeError> {
    let root: Value = serde_json::from_slice(raw).map_err(|e| {
        DecodeError::new(DecodeErrorKind::MalformedJson, ROOT_PATH, e.to_string())
    })?;
    decode_value(&root)
}

/// Decode an already-parsed JSON document.
pub fn decode_value(root: &Value) -> Result<AnalysisPayload, DecodeError> {
    let obj = as_object(root, ROOT_PATH)?;

    let (postgres, path) = field(obj, "", "postgres")?;
    let postgres = decode_relational(as_object(postgres, &path)?, &path)?;

    let (mongodb, path) = field(obj, "", "mongodb")?;
    let mongodb = decode_document(as_object(mongodb, &path)?, &path)?;

    Ok(AnalysisPayload { postgres, mongodb })
}

fn decode_relational(obj: &Map<String, Value>, path: &str) -> Result<RelationalSection, DecodeError> {
    let top_customers = list(obj, path, "topCustomers", |rec, p| {
        Ok(TopCustomer {
            customer_id: integer_field(rec, p, "customer_id")?,
            total_value: number_field(rec, p, "total_value")?,
        })
    })?;

    let category_analysis = list(obj, path, "categoryAnalysis", |rec, p| {
        Ok(CategorySales {
            category: string_field(rec, p, "category")?,
            total_sales: number_field(rec, p, "total_sales")?,
        })
    })?;

    let monthly_trend = list(obj, path, "monthlyTrend", |rec, p| {
        Ok(MonthlySales {
            month: string_field(rec, p, "month")?,
            total_sales: number_field(rec, p, "total_sales")?,
        })
    })?;

    Ok(RelationalSection {
        top_customers,
        category_analysis,
        monthly_trend,
    })
}

fn decode_document(obj: &Map<String, Value>, path: &str) -> Result<DocumentSection, DecodeError> {
    let most_viewed_products = list(obj, path, "mostViewedProducts", |rec, p| {
        Ok(ProductViews {
            product_id: integer_field(rec, p, "product_id")?,
            views: counter_field(rec, p, "views")?,
        })
    })?;

    let (stats, stats_path) = field(obj, path, "userSessionAnalysis")?;
    let user_session_analysis = decode_session_stats(as_object(stats, &stats_path)?, &stats_path)?;

    let hourly_traffic = list(obj, path, "hourlyTraffic", |rec, p| {
        Ok(HourlyTraffic {
            hour: string_field(rec, p, "hour")?,
            add_to_cart: counter_field(rec, p, "add_to_cart")?,
            cart_view: counter_field(rec, p, "cart_view")?,
            checkout: counter_field(rec, p, "checkout")?,
            page_view: counter_field(rec, p, "page_view")?,
            purchase: counter_field(rec, p, "purchase")?,
            remove_from_cart: counter_field(rec, p, "remove_from_cart")?,
        })
    })?;

    Ok(DocumentSection {
        most_viewed_products,
        user_session_analysis,
        hourly_traffic,
    })
}

fn decode_session_stats(obj: &Map<String, Value>, path: &str) -> Result<SessionStats, DecodeError> {
    let stats = SessionStats {
        avg_events_per_session: number_field(obj, path, "avgEventsPerSession")?,
        avg_unique_pages_per_session: number_field(obj, path, "avgUniquePagesPerSession")?,
        purchase_conversion_rate: number_field(obj, path, "purchaseConversionRate")?,
    };

    if !(0.0..=100.0).contains(&stats.purchase_conversion_rate) {
        return Err(DecodeError::new(
            DecodeErrorKind::OutOfRange,
            &join(path, "purchaseConversionRate"),
            format!("{} is outside 0-100", stats.purchase_conversion_rate),
        ));
    }

    Ok(stats)
}

// ---------------------------------------------------------------------------
// Field access helpers
// ---------------------------------------------------------------------------

fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn field<'a>(
    obj: &'a Map<String, Value>,
    parent: &str,
    name: &str,
) -> Result<(&'a Value, String), DecodeError> {
    let path = join(parent, name);
    match obj.get(name) {
        Some(value) => Ok((value, path)),
        None => Err(DecodeError::new(
            DecodeErrorKind::MissingField,
            &path,
            format!("`{}` is required", name),
        )),
    }
}

fn as_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, DecodeError> {
    value
        .as_object()
        .ok_or_else(|| DecodeError::mismatch(path, "object", value))
}

/// Decode a list of records, passing each element's object and path to `f`.
fn list<T, F>(obj: &Map<String, Value>, parent: &str, name: &str, f: F) -> Result<Vec<T>, DecodeError>
where
    F: Fn(&Map<String, Value>, &str) -> Result<T, DecodeError>,
{
    let (value, path) = field(obj, parent, name)?;
    let items = value
        .as_array()
        .ok_or_else(|| DecodeError::mismatch(&path, "array", value))?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let item_path = format!("{}[{}]", path, i);
            f(as_object(item, &item_path)?, &item_path)
        })
        .collect()
}

fn string_field(obj: &Map<String, Value>, parent: &str, name: &str) -> Result<String, DecodeError> {
    let (value, path) = field(obj, parent, name)?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| DecodeError::mismatch(&path, "string", value))
}

fn number_field(obj: &Map<String, Value>, parent: &str, name: &str) -> Result<f64, DecodeError> {
    let (value, path) = field(obj, parent, name)?;
    value
        .as_f64()
        .ok_or_else(|| DecodeError::mismatch(&path, "number", value))
}

/// Integers may arrive as `500` or `500.0`; any fractional part is rejected.
fn integer_field(obj: &Map<String, Value>, parent: &str, name: &str) -> Result<i64, DecodeError> {
    let (value, path) = field(obj, parent, name)?;
    if let Some(n) = value.as_i64() {
        return Ok(n);
    }
    match value.as_f64() {
        Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => Ok(f as i64),
        _ => Err(DecodeError::mismatch(&path, "integer", value)),
    }
}

/// Non-negative integer over the full `u64` range.
fn counter_field(obj: &Map<String, Value>, parent: &str, name: &str) -> Result<u64, DecodeError> {
    let (value, path) = field(obj, parent, name)?;
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }

    let negative = |shown: String| {
        DecodeError::new(
            DecodeErrorKind::OutOfRange,
            &path,
            format!("counter must be non-negative, got {}", shown),
        )
    };
    if let Some(n) = value.as_i64() {
        return Err(negative(n.to_string()));
    }
    match value.as_f64() {
        Some(f) if f.fract() == 0.0 && f < 0.0 => Err(negative(f.to_string())),
        Some(f) if f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(f as u64),
        _ => Err(DecodeError::mismatch(&path, "integer", value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scenario() -> Value {
        json!({
            "postgres": {
                "topCustomers": [{"customer_id": 1, "total_value": 500}],
                "categoryAnalysis": [],
                "monthlyTrend": []
            },
            "mongodb": {
                "mostViewedProducts": [],
                "userSessionAnalysis": {
                    "avgEventsPerSession": 3.456,
                    "avgUniquePagesPerSession": 2.1,
                    "purchaseConversionRate": 12.345
                },
                "hourlyTraffic": []
            }
        })
    }

    fn full() -> Value {
        json!({
            "postgres": {
                "topCustomers": [
                    {"customer_id": 17, "name": "Ada", "total_value": 912.5},
                    {"customer_id": 4, "total_value": 640.0}
                ],
                "categoryAnalysis": [{"category": "Books", "total_sales": 120.25}],
                "monthlyTrend": [
                    {"month": "2024-01", "total_sales": 1000.0},
                    {"month": "2024-02", "total_sales": 1250.5}
                ]
            },
            "mongodb": {
                "mostViewedProducts": [{"product_id": 3, "views": 88}],
                "userSessionAnalysis": {
                    "avgEventsPerSession": 4.0,
                    "avgUniquePagesPerSession": 2.5,
                    "purchaseConversionRate": 8.0
                },
                "hourlyTraffic": [{
                    "hour": "00:00",
                    "add_to_cart": 5, "cart_view": 4, "checkout": 2,
                    "page_view": 40, "purchase": 1, "remove_from_cart": 0
                }]
            }
        })
    }

    fn decode_json(value: &Value) -> Result<AnalysisPayload, DecodeError> {
        decode(&serde_json::to_vec(value).unwrap())
    }

    #[test]
    fn test_decode_scenario_payload() {
        let payload = decode_json(&scenario()).unwrap();
        assert_eq!(payload.postgres.top_customers.len(), 1);
        assert_eq!(payload.postgres.top_customers[0].customer_id, 1);
        assert_eq!(payload.postgres.top_customers[0].total_value, 500.0);
        assert_eq!(
            payload.mongodb.user_session_analysis.avg_events_per_session,
            3.456
        );
        assert!(payload.mongodb.hourly_traffic.is_empty());
    }

    #[test]
    fn test_round_trip() {
        let payload = decode_json(&full()).unwrap();
        let bytes = serde_json::to_vec(&payload).unwrap();
        assert_eq!(decode(&bytes).unwrap(), payload);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let mut value = full();
        value["extra"] = json!({"anything": true});
        value["postgres"]["monthlyTrend"][0]["order_count"] = json!(12);
        assert!(decode_json(&value).is_ok());
    }

    #[test]
    fn test_malformed_json() {
        let err = decode(b"{not json").unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::MalformedJson);
        assert_eq!(err.path, ROOT_PATH);
    }

    #[test]
    fn test_root_must_be_object() {
        let err = decode(b"[1, 2]").unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::TypeMismatch);
        assert_eq!(err.path, "$");
    }

    #[test]
    fn test_missing_section() {
        let mut value = full();
        value.as_object_mut().unwrap().remove("mongodb");
        let err = decode_json(&value).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::MissingField);
        assert_eq!(err.path, "mongodb");
    }

    /// Every required field, as (JSON pointer to remove, reported path).
    const REQUIRED_FIELDS: &[(&str, &str)] = &[
        ("/postgres", "postgres"),
        ("/mongodb", "mongodb"),
        ("/postgres/topCustomers", "postgres.topCustomers"),
        ("/postgres/categoryAnalysis", "postgres.categoryAnalysis"),
        ("/postgres/monthlyTrend", "postgres.monthlyTrend"),
        ("/postgres/topCustomers/0/customer_id", "postgres.topCustomers[0].customer_id"),
        ("/postgres/topCustomers/0/total_value", "postgres.topCustomers[0].total_value"),
        ("/postgres/categoryAnalysis/0/category", "postgres.categoryAnalysis[0].category"),
        ("/postgres/categoryAnalysis/0/total_sales", "postgres.categoryAnalysis[0].total_sales"),
        ("/postgres/monthlyTrend/1/month", "postgres.monthlyTrend[1].month"),
        ("/postgres/monthlyTrend/1/total_sales", "postgres.monthlyTrend[1].total_sales"),
        ("/mongodb/mostViewedProducts", "mongodb.mostViewedProducts"),
        ("/mongodb/userSessionAnalysis", "mongodb.userSessionAnalysis"),
        ("/mongodb/hourlyTraffic", "mongodb.hourlyTraffic"),
        ("/mongodb/mostViewedProducts/0/product_id", "mongodb.mostViewedProducts[0].product_id"),
        ("/mongodb/mostViewedProducts/0/views", "mongodb.mostViewedProducts[0].views"),
        ("/mongodb/userSessionAnalysis/avgEventsPerSession", "mongodb.userSessionAnalysis.avgEventsPerSession"),
        ("/mongodb/userSessionAnalysis/avgUniquePagesPerSession", "mongodb.userSessionAnalysis.avgUniquePagesPerSession"),
        ("/mongodb/userSessionAnalysis/purchaseConversionRate", "mongodb.userSessionAnalysis.purchaseConversionRate"),
        ("/mongodb/hourlyTraffic/0/hour", "mongodb.hourlyTraffic[0].hour"),
        ("/mongodb/hourlyTraffic/0/add_to_cart", "mongodb.hourlyTraffic[0].add_to_cart"),
        ("/mongodb/hourlyTraffic/0/cart_view", "mongodb.hourlyTraffic[0].cart_view"),
        ("/mongodb/hourlyTraffic/0/checkout", "mongodb.hourlyTraffic[0].checkout"),
        ("/mongodb/hourlyTraffic/0/page_view", "mongodb.hourlyTraffic[0].page_view"),
        ("/mongodb/hourlyTraffic/0/purchase", "mongodb.hourlyTraffic[0].purchase"),
        ("/mongodb/hourlyTraffic/0/remove_from_cart", "mongodb.hourlyTraffic[0].remove_from_cart"),
    ];

    fn remove_pointer(value: &mut Value, pointer: &str) {
        let (parent, key) = pointer.rsplit_once('/').unwrap();
        value
            .pointer_mut(parent)
            .unwrap()
            .as_object_mut()
            .unwrap()
            .remove(key)
            .unwrap();
    }

    #[test]
    fn test_every_required_field_reports_its_path() {
        for (pointer, expected) in REQUIRED_FIELDS {
            let mut value = full();
            remove_pointer(&mut value, pointer);
            let err = decode_json(&value).unwrap_err();
            assert_eq!(err.kind, DecodeErrorKind::MissingField, "{}", expected);
            assert_eq!(err.path, *expected);
        }
    }

    #[test]
    fn test_views_as_string_is_type_mismatch() {
        let mut value = full();
        value["mongodb"]["mostViewedProducts"][0]["views"] = json!("88");
        let err = decode_json(&value).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::TypeMismatch);
        assert_eq!(err.path, "mongodb.mostViewedProducts[0].views");
        assert!(err.detail.contains("string"));
    }

    #[test]
    fn test_null_is_type_mismatch() {
        let mut value = full();
        value["postgres"]["categoryAnalysis"][0]["category"] = Value::Null;
        let err = decode_json(&value).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::TypeMismatch);
        assert_eq!(err.path, "postgres.categoryAnalysis[0].category");
    }

    #[test]
    fn test_sequence_as_object_is_type_mismatch() {
        let mut value = full();
        value["postgres"]["topCustomers"] = json!({"customer_id": 1});
        let err = decode_json(&value).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::TypeMismatch);
        assert_eq!(err.path, "postgres.topCustomers");
    }

    #[test]
    fn test_integral_float_accepted_fraction_rejected() {
        let mut value = full();
        value["postgres"]["topCustomers"][0]["customer_id"] = json!(17.0);
        assert_eq!(
            decode_json(&value).unwrap().postgres.top_customers[0].customer_id,
            17
        );

        value["postgres"]["topCustomers"][0]["customer_id"] = json!(17.5);
        let err = decode_json(&value).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::TypeMismatch);
    }

    #[test]
    fn test_negative_counter_out_of_range() {
        let mut value = full();
        value["mongodb"]["hourlyTraffic"][0]["purchase"] = json!(-1);
        let err = decode_json(&value).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::OutOfRange);
        assert_eq!(err.path, "mongodb.hourlyTraffic[0].purchase");
    }

    #[test]
    fn test_conversion_rate_bounds() {
        let mut value = full();
        value["mongodb"]["userSessionAnalysis"]["purchaseConversionRate"] = json!(100);
        assert!(decode_json(&value).is_ok());

        value["mongodb"]["userSessionAnalysis"]["purchaseConversionRate"] = json!(100.01);
        let err = decode_json(&value).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::OutOfRange);
        assert_eq!(
            err.path,
            "mongodb.userSessionAnalysis.purchaseConversionRate"
        );
    }

    #[test]
    fn test_error_display() {
        let err = decode(b"{not json").unwrap_err();
        assert!(err.to_string().starts_with("malformed JSON at `$`"));
    }

    #[test]
    fn test_counter_above_i64_range() {
        let mut value = full();
        value["mongodb"]["mostViewedProducts"][0]["views"] = json!(u64::MAX);
        let payload = decode_json(&value).unwrap();
        assert_eq!(payload.mongodb.most_viewed_products[0].views, u64::MAX);
    }

    #[test]
    fn test_negative_integral_float_counter_out_of_range() {
        let mut value = full();
        value["mongodb"]["hourlyTraffic"][0]["checkout"] = json!(-2.0);
        let err = decode_json(&value).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::OutOfRange);
        assert_eq!(err.path, "mongodb.hourlyTraffic[0].checkout");
    }

    #[test]
    fn test_missing_average_reported_before_rate_range() {
        let mut value = full();
        value["mongodb"]["userSessionAnalysis"]["purchaseConversionRate"] = json!(150);
        remove_pointer(&mut value, "/mongodb/userSessionAnalysis/avgEventsPerSession");
        let err = decode_json(&value).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::MissingField);
        assert_eq!(err.path, "mongodb.userSessionAnalysis.avgEventsPerSession");
    }

    mod props {
        use super::super::*;
        use proptest::prelude::*;

        /// Two-decimal amounts, as the service reports money.
        fn arb_amount() -> impl Strategy<Value = f64> {
            (0i64..100_000_000).prop_map(|cents| cents as f64 / 100.0)
        }

        fn arb_label() -> impl Strategy<Value = String> {
            "\\PC{0,16}"
        }

        fn arb_relational() -> impl Strategy<Value = RelationalSection> {
            (
                prop::collection::vec(
                    (any::<i64>(), arb_amount()).prop_map(|(customer_id, total_value)| {
                        TopCustomer {
                            customer_id,
                            total_value,
                        }
                    }),
                    0..6,
                ),
                prop::collection::vec(
                    (arb_label(), arb_amount()).prop_map(|(category, total_sales)| {
                        CategorySales {
                            category,
                            total_sales,
                        }
                    }),
                    0..6,
                ),
                prop::collection::vec(
                    (arb_label(), arb_amount())
                        .prop_map(|(month, total_sales)| MonthlySales { month, total_sales }),
                    0..6,
                ),
            )
                .prop_map(|(top_customers, category_analysis, monthly_trend)| {
                    RelationalSection {
                        top_customers,
                        category_analysis,
                        monthly_trend,
                    }
                })
        }

        fn arb_hour() -> impl Strategy<Value = HourlyTraffic> {
            (
                arb_label(),
                any::<u64>(),
                any::<u64>(),
                any::<u64>(),
                any::<u64>(),
                any::<u64>(),
                any::<u64>(),
            )
                .prop_map(
                    |(hour, add_to_cart, cart_view, checkout, page_view, purchase, remove_from_cart)| {
                        HourlyTraffic {
                            hour,
                            add_to_cart,
                            cart_view,
                            checkout,
                            page_view,
                            purchase,
                            remove_from_cart,
                        }
                    },
                )
        }

        fn arb_document() -> impl Strategy<Value = DocumentSection> {
            (
                prop::collection::vec(
                    (any::<i64>(), any::<u64>())
                        .prop_map(|(product_id, views)| ProductViews { product_id, views }),
                    0..6,
                ),
                (arb_amount(), arb_amount(), 0u32..=10_000).prop_map(|(events, pages, rate)| {
                    SessionStats {
                        avg_events_per_session: events,
                        avg_unique_pages_per_session: pages,
                        purchase_conversion_rate: rate as f64 / 100.0,
                    }
                }),
                prop::collection::vec(arb_hour(), 0..6),
            )
                .prop_map(
                    |(most_viewed_products, user_session_analysis, hourly_traffic)| {
                        DocumentSection {
                            most_viewed_products,
                            user_session_analysis,
                            hourly_traffic,
                        }
                    },
                )
        }

        fn arb_payload() -> impl Strategy<Value = AnalysisPayload> {
            (arb_relational(), arb_document())
                .prop_map(|(postgres, mongodb)| AnalysisPayload { postgres, mongodb })
        }

        proptest! {
            #[test]
            fn prop_decode_inverts_serialize(payload in arb_payload()) {
                let bytes = serde_json::to_vec(&payload).unwrap();
                prop_assert_eq!(decode(&bytes), Ok(payload));
            }

            #[test]
            fn prop_decode_never_panics(raw in prop::collection::vec(any::<u8>(), 0..256)) {
                let _ = decode(&raw);
            }
        }
    }
}
