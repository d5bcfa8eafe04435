//! KPI Calculator Module
//! Handles the executive KPI computations over a (possibly filtered) view.

use polars::prelude::*;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::data::cell_to_string;
use crate::data::schema::{self, columns, SchemaCapabilities};

#[derive(Error, Debug)]
pub enum KpiError {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Handles the four executive KPI computations.
///
/// Every operation resolves arithmetic edge cases (empty view, zero
/// denominator) to a defined value instead of faulting, and consumes the
/// detected [`SchemaCapabilities`] rather than probing columns itself.
pub struct KpiCalculator;

impl KpiCalculator {
    /// Sum of `net_revenue` over the view. An empty view yields 0.
    pub fn total_net_revenue(df: &DataFrame) -> Result<f64, KpiError> {
        let revenue = df.column(columns::NET_REVENUE)?.cast(&DataType::Float64)?;
        Ok(revenue.f64()?.sum().unwrap_or(0.0))
    }

    /// Distinct order count when an order key is available; row count
    /// otherwise. Multiple line items per order never double-count.
    pub fn total_orders(df: &DataFrame, caps: &SchemaCapabilities) -> Result<usize, KpiError> {
        match &caps.order_key {
            Some(order_col) => {
                // n_unique counts null as a value; null keys identify no order.
                let orders = df.column(order_col)?.as_materialized_series();
                let nulls = usize::from(orders.null_count() > 0);
                Ok(orders.n_unique()?.saturating_sub(nulls))
            }
            None => Ok(df.height()),
        }
    }

    /// Share of repeat customers, in percent.
    ///
    /// Prefers the derived form (distinct orders per customer) when both a
    /// customer key and an order key exist, falls back to the labeled
    /// `customer_type` form, and yields 0 when neither column set is
    /// present.
    pub fn repeat_customer_rate(
        df: &DataFrame,
        caps: &SchemaCapabilities,
    ) -> Result<f64, KpiError> {
        if let (Some(user_col), Some(order_col)) = (&caps.customer_key, &caps.order_key) {
            return Self::derived_repeat_rate(df, user_col, order_col);
        }
        if caps.has_customer_type {
            return Self::labeled_repeat_rate(df, caps.customer_key.as_deref());
        }
        Ok(0.0)
    }

    /// A customer is "repeat" iff they have more than one distinct order.
    /// Grouping is over existing rows only, so customers with zero orders
    /// never appear.
    fn derived_repeat_rate(
        df: &DataFrame,
        user_col: &str,
        order_col: &str,
    ) -> Result<f64, KpiError> {
        let users = df.column(user_col)?.as_materialized_series();
        let orders = df.column(order_col)?.as_materialized_series();

        let mut orders_per_user: HashMap<String, HashSet<String>> = HashMap::new();
        for i in 0..df.height() {
            if let (Ok(user), Ok(order)) = (users.get(i), orders.get(i)) {
                if user.is_null() || order.is_null() {
                    continue;
                }
                orders_per_user
                    .entry(cell_to_string(&user))
                    .or_default()
                    .insert(cell_to_string(&order));
            }
        }

        let total = orders_per_user.len();
        if total == 0 {
            return Ok(0.0);
        }
        let repeat = orders_per_user.values().filter(|o| o.len() > 1).count();
        Ok(repeat as f64 / total as f64 * 100.0)
    }

    /// Proportion of `customer_type == "Repeat"`. With a customer key the
    /// labels are first deduplicated to one per customer (first occurrence
    /// wins) so customers are not weighted by their order-line volume.
    fn labeled_repeat_rate(df: &DataFrame, user_col: Option<&str>) -> Result<f64, KpiError> {
        let labels = df.column(columns::CUSTOMER_TYPE)?.as_materialized_series();

        match user_col {
            Some(user_col) => {
                let users = df.column(user_col)?.as_materialized_series();

                let mut label_per_user: HashMap<String, Option<String>> = HashMap::new();
                for i in 0..df.height() {
                    if let (Ok(user), Ok(label)) = (users.get(i), labels.get(i)) {
                        if user.is_null() {
                            continue;
                        }
                        let label = (!label.is_null()).then(|| cell_to_string(&label));
                        label_per_user.entry(cell_to_string(&user)).or_insert(label);
                    }
                }

                let total = label_per_user.len();
                if total == 0 {
                    return Ok(0.0);
                }
                let repeat = label_per_user
                    .values()
                    .filter(|label| label.as_deref() == Some(schema::customer_type::REPEAT))
                    .count();
                Ok(repeat as f64 / total as f64 * 100.0)
            }
            None => {
                let total = df.height();
                if total == 0 {
                    return Ok(0.0);
                }
                let mut repeat = 0usize;
                for i in 0..df.height() {
                    if let Ok(label) = labels.get(i) {
                        if !label.is_null()
                            && cell_to_string(&label) == schema::customer_type::REPEAT
                        {
                            repeat += 1;
                        }
                    }
                }
                Ok(repeat as f64 / total as f64 * 100.0)
            }
        }
    }

    /// Share of returned orders, in percent.
    ///
    /// With an order key the status is first deduplicated to one row per
    /// distinct order (first occurrence wins) so multi-line orders are
    /// counted once; without one the rate is row-level. A zero denominator
    /// yields 0 rather than NaN.
    pub fn return_rate(df: &DataFrame, caps: &SchemaCapabilities) -> Result<f64, KpiError> {
        let statuses = df.column(columns::ORDER_STATUS)?.as_materialized_series();

        match &caps.order_key {
            Some(order_col) => {
                let orders = df.column(order_col)?.as_materialized_series();

                let mut status_per_order: HashMap<String, String> = HashMap::new();
                for i in 0..df.height() {
                    if let (Ok(order), Ok(status)) = (orders.get(i), statuses.get(i)) {
                        if order.is_null() {
                            continue;
                        }
                        status_per_order
                            .entry(cell_to_string(&order))
                            .or_insert_with(|| cell_to_string(&status));
                    }
                }

                let total = status_per_order.len();
                if total == 0 {
                    return Ok(0.0);
                }
                let returned = status_per_order
                    .values()
                    .filter(|status| status.as_str() == schema::status::RETURNED)
                    .count();
                Ok(returned as f64 / total as f64 * 100.0)
            }
            None => {
                let total = df.height();
                if total == 0 {
                    return Ok(0.0);
                }
                let mut returned = 0usize;
                for i in 0..df.height() {
                    if let Ok(status) = statuses.get(i) {
                        if !status.is_null() && cell_to_string(&status) == schema::status::RETURNED
                        {
                            returned += 1;
                        }
                    }
                }
                Ok(returned as f64 / total as f64 * 100.0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::OrderKeyMode;

    fn caps_for(df: &DataFrame) -> SchemaCapabilities {
        SchemaCapabilities::detect(df, &OrderKeyMode::Auto).unwrap()
    }

    fn with_required(df: DataFrame) -> DataFrame {
        // Pads a partial fixture with the required columns so that
        // capability detection succeeds.
        let height = df.height();
        let mut df = df;
        for name in [columns::NET_REVENUE, columns::GROSS_REVENUE] {
            if df.column(name).is_err() {
                df.with_column(Column::new(name.into(), vec![1.0; height]))
                    .unwrap();
            }
        }
        if df.column(columns::COUNTRY).is_err() {
            df.with_column(Column::new(columns::COUNTRY.into(), vec!["US"; height]))
                .unwrap();
        }
        if df.column(columns::ORDER_STATUS).is_err() {
            df.with_column(Column::new(
                columns::ORDER_STATUS.into(),
                vec!["Shipped"; height],
            ))
            .unwrap();
        }
        df
    }

    #[test]
    fn net_revenue_sums_including_refunds() {
        let df = with_required(
            df!(columns::NET_REVENUE => &[10.0, -2.5, 4.0]).unwrap(),
        );
        let total = KpiCalculator::total_net_revenue(&df).unwrap();
        assert!((total - 11.5).abs() < 1e-9);
    }

    #[test]
    fn orders_are_counted_distinct_not_per_row() {
        let df = with_required(
            df!(
                columns::ORDER_ID => &["1", "1", "2"],
                "item" => &["a", "b", "c"]
            )
            .unwrap(),
        );
        let caps = caps_for(&df);
        assert_eq!(KpiCalculator::total_orders(&df, &caps).unwrap(), 2);
    }

    #[test]
    fn order_count_falls_back_to_rows_without_a_key() {
        let df = with_required(df!("item" => &["a", "b", "c"]).unwrap());
        let caps = caps_for(&df);
        assert_eq!(KpiCalculator::total_orders(&df, &caps).unwrap(), 3);
    }

    #[test]
    fn labeled_rate_is_row_level_without_a_customer_key() {
        let df = with_required(
            df!(columns::CUSTOMER_TYPE => &["Repeat", "New", "New", "Repeat"]).unwrap(),
        );
        let caps = caps_for(&df);
        let rate = KpiCalculator::repeat_customer_rate(&df, &caps).unwrap();
        assert!((rate - 50.0).abs() < 1e-9);
    }

    #[test]
    fn repeat_rate_degrades_to_zero_without_customer_columns() {
        let df = with_required(df!("item" => &["a", "b"]).unwrap());
        let caps = caps_for(&df);
        assert_eq!(
            KpiCalculator::repeat_customer_rate(&df, &caps).unwrap(),
            0.0
        );
    }

    #[test]
    fn return_rate_dedups_on_the_first_occurrence() {
        // Order 1 appears twice with conflicting statuses; the first row wins.
        let df = with_required(
            df!(
                columns::ORDER_ID => &["1", "1", "2"],
                columns::ORDER_STATUS => &["Returned", "Shipped", "Shipped"]
            )
            .unwrap(),
        );
        let caps = caps_for(&df);
        let rate = KpiCalculator::return_rate(&df, &caps).unwrap();
        assert!((rate - 50.0).abs() < 1e-9);
    }

    #[test]
    fn return_rate_on_an_empty_view_is_zero() {
        let df = with_required(
            df!(
                columns::ORDER_ID => &["1"],
                columns::ORDER_STATUS => &["Returned"]
            )
            .unwrap(),
        );
        let caps = caps_for(&df);
        let empty = df.head(Some(0));
        assert_eq!(KpiCalculator::return_rate(&empty, &caps).unwrap(), 0.0);
        assert_eq!(KpiCalculator::total_net_revenue(&empty).unwrap(), 0.0);
        assert_eq!(KpiCalculator::total_orders(&empty, &caps).unwrap(), 0);
    }
}
