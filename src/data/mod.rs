//! Data module - CSV loading and schema detection

use polars::prelude::AnyValue;

mod loader;
pub mod schema;

pub use loader::{DataLoader, LoaderError};
pub use schema::{OrderKeyMode, SchemaCapabilities, SchemaError};

/// Render a cell as a plain string key (string cells come back quoted
/// from Polars' `AnyValue` display).
pub(crate) fn cell_to_string(value: &AnyValue) -> String {
    value.to_string().trim_matches('"').to_string()
}
