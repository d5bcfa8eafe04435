//! Charts module - chart-ready aggregate tables

mod aggregate;

pub use aggregate::{aggregate_by, ChartError, ChartRow, ChartTable, TableOrder};
