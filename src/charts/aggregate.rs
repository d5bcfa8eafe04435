//! Chart Aggregation Module
//! Builds the ordered aggregate tables handed off to the rendering layer.

use polars::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

use crate::data::cell_to_string;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Row ordering contract for an aggregate table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableOrder {
    /// Stable first-appearance order of the dimension values.
    Source,
    /// Summed measure, descending.
    ValueDesc,
    /// Dimension label, ascending. Chronological for ISO-style time labels.
    LabelAsc,
}

/// One `(dimension value, summed measure)` entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRow {
    pub label: String,
    pub value: f64,
}

/// An ordered aggregate table for a single chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartTable {
    pub dimension: String,
    pub measure: String,
    pub rows: Vec<ChartRow>,
}

/// Group `df` by `dimension`, summing `measure`, in the requested row
/// order. Rows with a null dimension or a non-finite measure are skipped.
pub fn aggregate_by(
    df: &DataFrame,
    dimension: &str,
    measure: &str,
    order: TableOrder,
) -> Result<ChartTable, ChartError> {
    let dim = df.column(dimension)?.as_materialized_series();
    let values = df.column(measure)?.cast(&DataType::Float64)?;
    let values = values.f64()?;

    let mut rows: Vec<ChartRow> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for i in 0..df.height() {
        if let (Ok(label), Some(value)) = (dim.get(i), values.get(i)) {
            if label.is_null() || !value.is_finite() {
                continue;
            }
            let label = cell_to_string(&label);
            match index.get(&label) {
                Some(&pos) => rows[pos].value += value,
                None => {
                    index.insert(label.clone(), rows.len());
                    rows.push(ChartRow { label, value });
                }
            }
        }
    }

    match order {
        TableOrder::Source => {}
        TableOrder::ValueDesc => rows.sort_by(|a, b| {
            b.value
                .partial_cmp(&a.value)
                .unwrap_or(std::cmp::Ordering::Equal)
        }),
        TableOrder::LabelAsc => rows.sort_by(|a, b| a.label.cmp(&b.label)),
    }

    Ok(ChartTable {
        dimension: dimension.to_string(),
        measure: measure.to_string(),
        rows,
    })
}
