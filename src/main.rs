//! Revenue Pulse - E-Commerce Revenue KPI CLI
//!
//! Loads an order-level CSV, applies a country filter, and prints the
//! executive KPI row plus the revenue aggregates handed off to charting.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use revenue_pulse::charts::ChartTable;
use revenue_pulse::format;
use revenue_pulse::{
    CountryFilter, DashboardSnapshot, DataLoader, KpiConfig, KpiEngine, OrderKeyMode,
    RepeatRateScope,
};

#[derive(Parser)]
#[command(name = "revenue_pulse", version, about = "E-commerce revenue KPI engine")]
struct Cli {
    /// Path to the order-level CSV dataset.
    csv: PathBuf,

    /// Countries to include (comma-separated; default: all).
    #[arg(long, value_delimiter = ',')]
    countries: Vec<String>,

    /// Dataset the repeat-customer rate is computed over.
    #[arg(long, value_enum, default_value = "global")]
    repeat_rate_scope: ScopeArg,

    /// Order-identifying column: "auto" or an explicit column name.
    #[arg(long, default_value = "auto")]
    order_key: String,

    /// Emit the snapshot as JSON instead of the text report.
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ScopeArg {
    Global,
    Filtered,
}

impl From<ScopeArg> for RepeatRateScope {
    fn from(arg: ScopeArg) -> Self {
        match arg {
            ScopeArg::Global => RepeatRateScope::Global,
            ScopeArg::Filtered => RepeatRateScope::Filtered,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let csv_path = cli.csv.to_string_lossy().to_string();
    let mut loader = DataLoader::new();
    let df = loader
        .load_csv(&csv_path)
        .with_context(|| format!("loading {}", csv_path))?
        .clone();
    log::info!(
        "Loaded {} rows, {} columns",
        loader.get_row_count(),
        loader.get_columns().len()
    );

    let config = KpiConfig {
        repeat_rate_scope: cli.repeat_rate_scope.into(),
        order_key: match cli.order_key.as_str() {
            "auto" => OrderKeyMode::Auto,
            name => OrderKeyMode::Column(name.to_string()),
        },
    };

    let engine = KpiEngine::new(df, config)?;
    log::info!("countries available: {}", engine.countries()?.join(", "));

    let filter = if cli.countries.is_empty() {
        CountryFilter::All
    } else {
        CountryFilter::Selected(cli.countries)
    };

    let snapshot = engine.snapshot(&filter)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_report(&snapshot);
    }

    Ok(())
}

fn print_report(snapshot: &DashboardSnapshot) {
    println!(
        "Total Net Revenue     {}",
        format::currency(snapshot.total_net_revenue)
    );
    println!(
        "Total Orders          {}",
        format::count(snapshot.total_orders)
    );
    println!(
        "Repeat Customer Rate  {}",
        format::percent(snapshot.repeat_customer_rate)
    );
    println!(
        "Return Rate           {}",
        format::percent(snapshot.return_rate)
    );

    print_table("Revenue by Order Status", &snapshot.revenue_by_status);
    print_table("Revenue by Country", &snapshot.revenue_by_country);
    if let Some(trend) = &snapshot.revenue_trend {
        print_table("Revenue Trend", trend);
    }
}

fn print_table(title: &str, table: &ChartTable) {
    println!();
    println!("{}", title);
    for row in &table.rows {
        println!("  {:<16} {}", row.label, format::currency(row.value));
    }
}
