//! Dataset schema - column constants and capability detection.
//! Column and value names live here as the single source of truth.

use polars::prelude::*;
use serde::Serialize;
use thiserror::Error;

// ── Column names ────────────────────────────────────────────────────────────
pub mod columns {
    pub const NET_REVENUE: &str = "net_revenue";
    pub const GROSS_REVENUE: &str = "gross_revenue";
    pub const COUNTRY: &str = "country";
    pub const ORDER_STATUS: &str = "order_status";

    pub const ORDER_ID: &str = "order_id";
    pub const ORDER_ITEM_ID: &str = "order_item_id";
    pub const USER_ID: &str = "user_id";
    pub const CUSTOMER_TYPE: &str = "customer_type";
    pub const YEAR_MONTH: &str = "year_month";

    pub const REQUIRED: [&str; 4] = [NET_REVENUE, GROSS_REVENUE, COUNTRY, ORDER_STATUS];
}

// ── Order status values ─────────────────────────────────────────────────────
pub mod status {
    pub const RETURNED: &str = "Returned";
}

// ── Customer type labels ────────────────────────────────────────────────────
pub mod customer_type {
    pub const REPEAT: &str = "Repeat";
}

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Missing required column: {0}")]
    MissingColumn(String),
    #[error("Order key column not found: {0}")]
    OrderKeyNotFound(String),
}

/// How the order-identifying column is resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OrderKeyMode {
    /// `order_id` if present, else `order_item_id`, else none.
    #[default]
    Auto,
    /// A caller-named column; its absence is a configuration error.
    Column(String),
}

/// Which optional columns the dataset carries.
///
/// Detected once after load; every KPI operation consumes this descriptor
/// instead of re-checking column presence ad hoc.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaCapabilities {
    pub order_key: Option<String>,
    pub customer_key: Option<String>,
    pub has_customer_type: bool,
    pub time_dimension: Option<String>,
}

impl SchemaCapabilities {
    /// Validate the required columns and detect the optional ones.
    ///
    /// A missing required column (or a missing explicitly named order key)
    /// fails fast naming the column; absent optional columns only narrow
    /// the capabilities.
    pub fn detect(df: &DataFrame, order_key: &OrderKeyMode) -> Result<Self, SchemaError> {
        let names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        let has = |name: &str| names.iter().any(|n| n == name);

        for column in columns::REQUIRED {
            if !has(column) {
                return Err(SchemaError::MissingColumn(column.to_string()));
            }
        }

        let order_key = match order_key {
            OrderKeyMode::Auto => [columns::ORDER_ID, columns::ORDER_ITEM_ID]
                .into_iter()
                .find(|&candidate| has(candidate))
                .map(str::to_string),
            OrderKeyMode::Column(name) => {
                if !has(name) {
                    return Err(SchemaError::OrderKeyNotFound(name.clone()));
                }
                Some(name.clone())
            }
        };

        Ok(Self {
            order_key,
            customer_key: has(columns::USER_ID).then(|| columns::USER_ID.to_string()),
            has_customer_type: has(columns::CUSTOMER_TYPE),
            time_dimension: has(columns::YEAR_MONTH).then(|| columns::YEAR_MONTH.to_string()),
        })
    }

    pub fn has_order_key(&self) -> bool {
        self.order_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_df() -> DataFrame {
        df!(
            columns::NET_REVENUE => &[10.0],
            columns::GROSS_REVENUE => &[12.0],
            columns::COUNTRY => &["US"],
            columns::ORDER_STATUS => &["Shipped"]
        )
        .unwrap()
    }

    #[test]
    fn minimal_dataset_has_no_optional_capabilities() {
        let caps = SchemaCapabilities::detect(&minimal_df(), &OrderKeyMode::Auto).unwrap();
        assert!(!caps.has_order_key());
        assert_eq!(caps.customer_key, None);
        assert!(!caps.has_customer_type);
        assert_eq!(caps.time_dimension, None);
    }

    #[test]
    fn order_id_wins_over_order_item_id() {
        let df = df!(
            columns::ORDER_ID => &["1"],
            columns::ORDER_ITEM_ID => &["1-a"],
            columns::NET_REVENUE => &[10.0],
            columns::GROSS_REVENUE => &[12.0],
            columns::COUNTRY => &["US"],
            columns::ORDER_STATUS => &["Shipped"]
        )
        .unwrap();

        let caps = SchemaCapabilities::detect(&df, &OrderKeyMode::Auto).unwrap();
        assert_eq!(caps.order_key.as_deref(), Some(columns::ORDER_ID));
    }

    #[test]
    fn missing_required_column_is_named_in_the_error() {
        let df = df!(
            columns::NET_REVENUE => &[10.0],
            columns::GROSS_REVENUE => &[12.0],
            columns::COUNTRY => &["US"]
        )
        .unwrap();

        let err = SchemaCapabilities::detect(&df, &OrderKeyMode::Auto).unwrap_err();
        assert!(err.to_string().contains(columns::ORDER_STATUS));
    }

    #[test]
    fn explicit_order_key_must_exist() {
        let err =
            SchemaCapabilities::detect(&minimal_df(), &OrderKeyMode::Column("order_ref".into()))
                .unwrap_err();
        assert!(err.to_string().contains("order_ref"));
    }
}
