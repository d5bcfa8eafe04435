//! Revenue Pulse - E-Commerce Revenue KPI Engine
//!
//! Loads an order-level sales dataset, applies a country filter, and
//! computes the executive KPI row plus chart-ready revenue aggregates.

pub mod charts;
pub mod data;
pub mod format;
pub mod kpi;

pub use data::{DataLoader, OrderKeyMode, SchemaCapabilities};
pub use kpi::{
    CountryFilter, DashboardSnapshot, EngineError, KpiConfig, KpiEngine, RepeatRateScope,
};
