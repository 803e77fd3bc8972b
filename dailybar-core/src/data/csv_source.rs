//! Local CSV source: one vendor export per symbol.
//!
//! Layout: `{dir}/{SYMBOL}.csv` with a header containing at least
//! `Date, Open, High, Low, Close, Adj Close`; `Volume` is optional. Header
//! matching ignores case, spaces and underscores. Empty, `null` and `NaN`
//! cells read as missing.

use super::provider::{DataError, DataProvider, DataSource, FetchResult};
use crate::domain::RawPriceRow;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Reads raw rows from CSV exports on disk.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    dir: PathBuf,
}

struct Columns {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    adj_close: usize,
    volume: Option<usize>,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn symbol_path(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }

    /// Parse every row of a CSV export, without date filtering.
    pub fn read_file(symbol: &str, path: &Path) -> Result<Vec<RawPriceRow>, DataError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)?;
        let columns = resolve_columns(symbol, reader.headers()?)?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let line = record.position().map_or(0, |p| p.line());
            let malformed = |reason: String| DataError::Malformed {
                symbol: symbol.to_string(),
                line,
                reason,
            };

            let date_cell = record.get(columns.date).unwrap_or("");
            let date = parse_date(date_cell)
                .ok_or_else(|| malformed(format!("invalid date '{date_cell}'")))?;
            let price = |idx: usize| -> Result<f64, DataError> {
                parse_number(record.get(idx).unwrap_or(""))
                    .map(|v| v.unwrap_or(f64::NAN))
                    .map_err(|cell| malformed(format!("invalid number '{cell}'")))
            };

            let volume = match columns.volume {
                Some(idx) => parse_number(record.get(idx).unwrap_or(""))
                    .map_err(|cell| malformed(format!("invalid volume '{cell}'")))?,
                None => None,
            };

            rows.push(RawPriceRow {
                date,
                open: price(columns.open)?,
                high: price(columns.high)?,
                low: price(columns.low)?,
                close: price(columns.close)?,
                adj_close: price(columns.adj_close)?,
                volume,
            });
        }

        Ok(rows)
    }
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let path = self.symbol_path(symbol);
        if !path.exists() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        let rows = Self::read_file(symbol, &path)?
            .into_iter()
            .filter(|r| r.date >= start && r.date <= end)
            .collect();

        Ok(FetchResult {
            symbol: symbol.to_string(),
            rows,
            source: DataSource::CsvImport,
        })
    }
}

fn header_key(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

fn resolve_columns(symbol: &str, headers: &csv::StringRecord) -> Result<Columns, DataError> {
    let keys: Vec<String> = headers.iter().map(header_key).collect();
    let find = |name: &str| keys.iter().position(|k| k == name);
    let require = |name: &str| {
        find(name).ok_or_else(|| DataError::MissingColumn {
            symbol: symbol.to_string(),
            column: name.to_string(),
        })
    };

    Ok(Columns {
        date: require("date")?,
        open: require("open")?,
        high: require("high")?,
        low: require("low")?,
        close: require("close")?,
        adj_close: require("adjclose")?,
        volume: find("volume"),
    })
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part.
fn parse_date(cell: &str) -> Option<NaiveDate> {
    let head = cell.get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// `Ok(None)` for a missing cell, `Err(cell)` for garbage.
fn parse_number(cell: &str) -> Result<Option<f64>, String> {
    match cell {
        "" => Ok(None),
        c if c.eq_ignore_ascii_case("null") || c.eq_ignore_ascii_case("nan") => Ok(None),
        c => c
            .parse::<f64>()
            .map(|v| (!v.is_nan()).then_some(v))
            .map_err(|_| c.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, symbol: &str, body: &str) {
        fs::write(dir.join(format!("{symbol}.csv")), body).unwrap();
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn reads_yahoo_export_with_missing_cells() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "SPY",
            "Date,Open,High,Low,Close,Adj Close,Volume\n\
             2020-01-02,10,11,9,10,9.5,1000\n\
             2020-01-03,null,11,9,10,9.5,\n\
             2020-01-06,10,11,9,10,9.5,NaN\n",
        );

        let provider = CsvProvider::new(dir.path());
        let result = provider.fetch("SPY", d("2020-01-01"), d("2020-12-31")).unwrap();

        assert_eq!(result.source, DataSource::CsvImport);
        assert_eq!(result.rows.len(), 3);
        assert_eq!(result.rows[0].adj_close, 9.5);
        assert_eq!(result.rows[0].volume, Some(1000.0));
        assert!(result.rows[1].open.is_nan());
        assert_eq!(result.rows[1].volume, None);
        assert_eq!(result.rows[2].volume, None);
    }

    #[test]
    fn filters_to_requested_window() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "QQQ",
            "date,open,high,low,close,adj_close,volume\n\
             2019-12-31,1,1,1,1,1,1\n\
             2020-01-02,1,1,1,1,1,1\n",
        );
        let rows = CsvProvider::new(dir.path())
            .fetch("QQQ", d("2020-01-01"), d("2020-01-31"))
            .unwrap()
            .rows;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, d("2020-01-02"));
    }

    #[test]
    fn volume_column_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "GC=F", "Date,Open,High,Low,Close,Adj Close\n2020-01-02,1,2,1,2,2\n");
        let rows = CsvProvider::new(dir.path())
            .fetch("GC=F", d("2020-01-01"), d("2020-01-31"))
            .unwrap()
            .rows;
        assert_eq!(rows[0].volume, None);
    }

    #[test]
    fn missing_adj_close_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "X", "Date,Open,High,Low,Close\n2020-01-02,1,2,1,2\n");
        let err = CsvProvider::new(dir.path())
            .fetch("X", d("2020-01-01"), d("2020-01-31"))
            .unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { ref column, .. } if column == "adjclose"));
    }

    #[test]
    fn unknown_symbol_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = CsvProvider::new(dir.path())
            .fetch("NOPE", d("2020-01-01"), d("2020-01-31"))
            .unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { .. }));
    }

    #[test]
    fn garbage_number_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "BAD",
            "Date,Open,High,Low,Close,Adj Close,Volume\n2020-01-02,abc,1,1,1,1,1\n",
        );
        let err = CsvProvider::new(dir.path())
            .fetch("BAD", d("2020-01-01"), d("2020-01-31"))
            .unwrap_err();
        match err {
            DataError::Malformed { line, reason, .. } => {
                assert_eq!(line, 2);
                assert!(reason.contains("abc"));
            }
            other => panic!("expected Malformed, got {other:?}"),
        }
    }
}
