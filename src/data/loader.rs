//! CSV Data Loader Module
//! Handles CSV ingestion and the memoized dataset cache using Polars.

use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Failed to read source metadata: {0}")]
    Io(#[from] std::io::Error),
    #[error("No data loaded")]
    NoData,
}

/// Modification signature of a source file. A reload only happens when
/// the signature changes.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SourceSignature {
    modified: SystemTime,
    len: u64,
}

impl SourceSignature {
    fn of(path: &Path) -> Result<Self, LoaderError> {
        let meta = fs::metadata(path)?;
        Ok(Self {
            modified: meta.modified()?,
            len: meta.len(),
        })
    }
}

/// Handles CSV file loading with Polars, caching the loaded frame per
/// source identity + modification signature.
pub struct DataLoader {
    df: Option<DataFrame>,
    file_path: Option<PathBuf>,
    signature: Option<SourceSignature>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            df: None,
            file_path: None,
            signature: None,
        }
    }

    /// Load a CSV file using Polars. Reuses the cached frame when the
    /// path and its modification signature are unchanged.
    pub fn load_csv(&mut self, file_path: &str) -> Result<&DataFrame, LoaderError> {
        let path = PathBuf::from(file_path);
        let signature = SourceSignature::of(&path)?;

        if self.df.is_some()
            && self.file_path.as_deref() == Some(path.as_path())
            && self.signature.as_ref() == Some(&signature)
        {
            log::debug!("reusing cached dataset for {}", file_path);
            return self.df.as_ref().ok_or(LoaderError::NoData);
        }

        // Use lazy evaluation for memory efficiency, then collect
        let mut df = LazyCsvReader::new(file_path)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .finish()?
            .collect()?;

        trim_column_names(&mut df)?;

        self.file_path = Some(path);
        self.signature = Some(signature);
        self.df = Some(df);
        self.df.as_ref().ok_or(LoaderError::NoData)
    }

    /// Get list of column names from loaded DataFrame.
    pub fn get_columns(&self) -> Vec<String> {
        self.df
            .as_ref()
            .map(|df| {
                df.get_column_names()
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get the number of rows in the DataFrame.
    pub fn get_row_count(&self) -> usize {
        self.df.as_ref().map(|df| df.height()).unwrap_or(0)
    }

    /// Get a reference to the loaded DataFrame.
    pub fn get_dataframe(&self) -> Option<&DataFrame> {
        self.df.as_ref()
    }
}

/// Column-name whitespace is trimmed on load so `" country "` and
/// `"country"` resolve to the same column.
fn trim_column_names(df: &mut DataFrame) -> PolarsResult<()> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    for name in names {
        let trimmed = name.trim();
        if trimmed != name {
            df.rename(&name, trimmed.into())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn loads_rows_and_trims_header_whitespace() {
        let file = write_csv(" net_revenue ,country\n10.0,US\n20.0,DE\n");
        let mut loader = DataLoader::new();

        let df = loader.load_csv(file.path().to_str().unwrap()).unwrap();

        assert_eq!(df.height(), 2);
        assert!(df.column("net_revenue").is_ok());
    }

    #[test]
    fn unchanged_source_is_served_from_cache() {
        let file = write_csv("net_revenue,country\n10.0,US\n");
        let path = file.path().to_str().unwrap().to_string();
        let mut loader = DataLoader::new();

        loader.load_csv(&path).unwrap();
        let df = loader.load_csv(&path).unwrap();

        assert_eq!(df.height(), 1);
        assert_eq!(loader.get_row_count(), 1);
    }

    #[test]
    fn changed_source_invalidates_the_cache() {
        let mut file = write_csv("net_revenue,country\n10.0,US\n");
        let path = file.path().to_str().unwrap().to_string();
        let mut loader = DataLoader::new();

        assert_eq!(loader.load_csv(&path).unwrap().height(), 1);

        // Appending changes the length component of the signature even when
        // the filesystem's mtime granularity is coarse.
        file.write_all(b"20.0,DE\n30.0,FR\n").unwrap();
        file.flush().unwrap();

        assert_eq!(loader.load_csv(&path).unwrap().height(), 3);
    }
}
