//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over where raw rows come from (local CSV
//! exports, synthetic series) so the batch runner and tests can swap sources.
//! Network acquisition is not implemented here.

use crate::domain::RawPriceRow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("malformed source for '{symbol}' at line {line}: {reason}")]
    Malformed {
        symbol: String,
        line: u64,
        reason: String,
    },

    #[error("missing column '{column}' in source for '{symbol}'")]
    MissingColumn { symbol: String, column: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result of a successful fetch for a single symbol.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub rows: Vec<RawPriceRow>,
    pub source: DataSource,
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    CsvImport,
    Synthetic,
}

/// Trait for raw price sources.
///
/// Implementations return every row they have for the symbol within
/// `[start, end]`; cleaning and alignment happen in the normalizer.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily raw rows for a symbol over a date range.
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
        -> Result<FetchResult, DataError>;
}
