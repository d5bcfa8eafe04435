//! KPI Engine Module
//! Owns the loaded dataset and produces dashboard snapshots for a given
//! country selection.

use polars::prelude::*;
use serde::Serialize;
use thiserror::Error;

use crate::charts::{aggregate_by, ChartError, ChartTable, TableOrder};
use crate::data::cell_to_string;
use crate::data::schema::{columns, OrderKeyMode, SchemaCapabilities, SchemaError};
use crate::kpi::calculator::{KpiCalculator, KpiError};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Kpi(#[from] KpiError),
    #[error(transparent)]
    Chart(#[from] ChartError),
}

/// Which dataset the repeat-customer rate is computed over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RepeatRateScope {
    /// The whole dataset, ignoring the country filter. Keeps loyalty
    /// metrics stable under partial market filtering.
    #[default]
    Global,
    /// The filtered view.
    Filtered,
}

/// Engine configuration, threaded in at construction.
#[derive(Debug, Clone, Default)]
pub struct KpiConfig {
    pub repeat_rate_scope: RepeatRateScope,
    pub order_key: OrderKeyMode,
}

/// Immutable country selection for a single snapshot.
#[derive(Debug, Clone)]
pub enum CountryFilter {
    All,
    Selected(Vec<String>),
}

impl CountryFilter {
    fn matches(&self, country: &str) -> bool {
        match self {
            CountryFilter::All => true,
            CountryFilter::Selected(countries) => countries.iter().any(|c| c == country),
        }
    }
}

/// The four executive KPIs plus the chart-ready aggregate tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub total_net_revenue: f64,
    pub total_orders: usize,
    pub repeat_customer_rate: f64,
    pub return_rate: f64,
    pub revenue_by_status: ChartTable,
    pub revenue_by_country: ChartTable,
    pub revenue_trend: Option<ChartTable>,
}

/// Computes dashboard snapshots over an immutable dataset.
#[derive(Debug)]
pub struct KpiEngine {
    df: DataFrame,
    capabilities: SchemaCapabilities,
    config: KpiConfig,
}

impl KpiEngine {
    /// Validate the dataset against the required schema and detect the
    /// optional capabilities. Fails fast on a missing required column;
    /// no KPI is computed in that case.
    pub fn new(df: DataFrame, config: KpiConfig) -> Result<Self, EngineError> {
        let capabilities = SchemaCapabilities::detect(&df, &config.order_key)?;
        log::debug!("schema capabilities: {:?}", capabilities);
        Ok(Self {
            df,
            capabilities,
            config,
        })
    }

    pub fn capabilities(&self) -> &SchemaCapabilities {
        &self.capabilities
    }

    /// Distinct country values, sorted for presentation. Feeds the
    /// default-all selection of the filter control.
    pub fn countries(&self) -> Result<Vec<String>, EngineError> {
        let unique = self.df.column(columns::COUNTRY)?.unique()?;
        let series = unique.as_materialized_series();
        let mut countries: Vec<String> = series
            .iter()
            .filter_map(|value| (!value.is_null()).then(|| cell_to_string(&value)))
            .collect();
        countries.sort();
        Ok(countries)
    }

    /// Derived read-only view of the rows matching the selection. The
    /// source table is never mutated.
    fn filtered_view(&self, filter: &CountryFilter) -> Result<DataFrame, EngineError> {
        if let CountryFilter::All = filter {
            return Ok(self.df.clone());
        }

        let country = self.df.column(columns::COUNTRY)?.as_materialized_series();
        let mask: BooleanChunked = (0..self.df.height())
            .map(|i| {
                country
                    .get(i)
                    .ok()
                    .map(|value| !value.is_null() && filter.matches(&cell_to_string(&value)))
            })
            .collect();

        Ok(self.df.filter(&mask)?)
    }

    /// Compute the full KPI snapshot for a country selection.
    ///
    /// Filter-scoped KPIs and all chart aggregates are computed over the
    /// derived view; the repeat-customer rate honors the configured scope.
    pub fn snapshot(&self, filter: &CountryFilter) -> Result<DashboardSnapshot, EngineError> {
        let view = self.filtered_view(filter)?;
        log::info!(
            "computing snapshot over {} of {} rows",
            view.height(),
            self.df.height()
        );

        let repeat_scope = match self.config.repeat_rate_scope {
            RepeatRateScope::Global => &self.df,
            RepeatRateScope::Filtered => &view,
        };

        let revenue_trend = match &self.capabilities.time_dimension {
            Some(time_col) => Some(aggregate_by(
                &view,
                time_col,
                columns::NET_REVENUE,
                TableOrder::LabelAsc,
            )?),
            None => None,
        };

        Ok(DashboardSnapshot {
            total_net_revenue: KpiCalculator::total_net_revenue(&view)?,
            total_orders: KpiCalculator::total_orders(&view, &self.capabilities)?,
            repeat_customer_rate: KpiCalculator::repeat_customer_rate(
                repeat_scope,
                &self.capabilities,
            )?,
            return_rate: KpiCalculator::return_rate(&view, &self.capabilities)?,
            revenue_by_status: aggregate_by(
                &view,
                columns::ORDER_STATUS,
                columns::NET_REVENUE,
                TableOrder::Source,
            )?,
            revenue_by_country: aggregate_by(
                &view,
                columns::COUNTRY,
                columns::NET_REVENUE,
                TableOrder::ValueDesc,
            )?,
            revenue_trend,
        })
    }
}
