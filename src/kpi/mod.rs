//! KPI module - executive KPI computation and the dashboard snapshot

mod calculator;
mod engine;

pub use calculator::{KpiCalculator, KpiError};
pub use engine::{
    CountryFilter, DashboardSnapshot, EngineError, KpiConfig, KpiEngine, RepeatRateScope,
};
