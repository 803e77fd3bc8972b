//! Per-symbol output files for bundle ingestion.
//!
//! Layout: `{root}/daily/{SYMBOL}.{csv|parquet}`, one file per symbol, with
//! columns `date, open, high, low, close, volume, dividend, split`.
//!
//! Writes are atomic (write to .tmp, rename into place), so an interrupted
//! build never leaves a half-written file where ingestion would pick it up.

use chrono::NaiveDate;
use dailybar_core::{NormalizedRow, NormalizedSeries, NORMALIZED_COLUMNS};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("parquet error: {0}")]
    Parquet(String),

    #[error("unexpected layout in {path}: {reason}")]
    Layout { path: PathBuf, reason: String },
}

/// File format of the per-symbol output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Parquet => "parquet",
        }
    }
}

/// Writes normalized series into a bundle directory.
#[derive(Debug, Clone)]
pub struct BundleWriter {
    root: PathBuf,
    format: OutputFormat,
}

impl BundleWriter {
    /// Subdirectory holding the daily files.
    pub const DAILY_DIR: &'static str = "daily";

    pub fn new(root: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            root: root.into(),
            format,
        }
    }

    pub fn daily_dir(&self) -> PathBuf {
        self.root.join(Self::DAILY_DIR)
    }

    /// `{root}/daily/{SYMBOL}.{ext}`
    pub fn symbol_path(&self, symbol: &str) -> PathBuf {
        self.daily_dir()
            .join(format!("{symbol}.{}", self.format.extension()))
    }

    /// Write one symbol's series, replacing any previous file.
    pub fn write(&self, series: &NormalizedSeries) -> Result<PathBuf, WriteError> {
        let dir = self.daily_dir();
        fs::create_dir_all(&dir).map_err(|source| WriteError::Io {
            path: dir.clone(),
            source,
        })?;

        let path = self.symbol_path(&series.symbol);
        let tmp_path = path.with_extension(format!("{}.tmp", self.format.extension()));

        match self.format {
            OutputFormat::Csv => write_csv(&series.rows, &tmp_path)?,
            OutputFormat::Parquet => write_parquet(&series.rows, &tmp_path)?,
        }

        fs::rename(&tmp_path, &path).map_err(|source| {
            let _ = fs::remove_file(&tmp_path);
            WriteError::Io {
                path: path.clone(),
                source,
            }
        })?;

        Ok(path)
    }

    /// Read a symbol's file back in the configured format.
    pub fn read(&self, symbol: &str) -> Result<Vec<NormalizedRow>, WriteError> {
        let path = self.symbol_path(symbol);
        match self.format {
            OutputFormat::Csv => read_csv(&path),
            OutputFormat::Parquet => read_parquet(&path),
        }
    }
}

// ── CSV ─────────────────────────────────────────────────────────────

/// Serialize rows with a header in contract column order.
pub fn write_csv(rows: &[NormalizedRow], path: &Path) -> Result<(), WriteError> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(|source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

pub fn read_csv(path: &Path) -> Result<Vec<NormalizedRow>, WriteError> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers != NORMALIZED_COLUMNS {
        return Err(WriteError::Layout {
            path: path.to_path_buf(),
            reason: format!("header {headers:?} does not match {NORMALIZED_COLUMNS:?}"),
        });
    }
    reader
        .deserialize()
        .collect::<Result<Vec<NormalizedRow>, csv::Error>>()
        .map_err(WriteError::from)
}

// ── Parquet I/O helpers ─────────────────────────────────────────────

fn parquet_err(context: &str) -> impl Fn(PolarsError) -> WriteError + '_ {
    move |e| WriteError::Parquet(format!("{context}: {e}"))
}

/// Convert normalized rows to a Polars DataFrame in contract column order.
fn rows_to_dataframe(rows: &[NormalizedRow]) -> Result<DataFrame, WriteError> {
    let epoch = NaiveDate::default();
    let dates: Vec<i32> = rows
        .iter()
        .map(|r| (r.date - epoch).num_days() as i32)
        .collect();
    let column = |f: fn(&NormalizedRow) -> u32| rows.iter().map(f).collect::<Vec<u32>>();

    DataFrame::new(vec![
        Column::new("date".into(), dates)
            .cast(&DataType::Date)
            .map_err(parquet_err("date cast"))?,
        Column::new("open".into(), column(|r| r.open)),
        Column::new("high".into(), column(|r| r.high)),
        Column::new("low".into(), column(|r| r.low)),
        Column::new("close".into(), column(|r| r.close)),
        Column::new("volume".into(), column(|r| r.volume)),
        Column::new(
            "dividend".into(),
            rows.iter().map(|r| r.dividend).collect::<Vec<f64>>(),
        ),
        Column::new(
            "split".into(),
            rows.iter().map(|r| r.split).collect::<Vec<f64>>(),
        ),
    ])
    .map_err(parquet_err("dataframe creation"))
}

pub fn write_parquet(rows: &[NormalizedRow], path: &Path) -> Result<(), WriteError> {
    let mut df = rows_to_dataframe(rows)?;
    let file = fs::File::create(path).map_err(|source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    ParquetWriter::new(file)
        .finish(&mut df)
        .map_err(parquet_err("write parquet"))?;
    Ok(())
}

pub fn read_parquet(path: &Path) -> Result<Vec<NormalizedRow>, WriteError> {
    let file = fs::File::open(path).map_err(|source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(parquet_err("read parquet"))?;

    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    if names != NORMALIZED_COLUMNS {
        return Err(WriteError::Layout {
            path: path.to_path_buf(),
            reason: format!("columns {names:?} do not match {NORMALIZED_COLUMNS:?}"),
        });
    }

    let date_ca = df
        .column("date")
        .and_then(|c| c.date())
        .map_err(parquet_err("date column"))?;
    let u32_col = |name: &str| {
        df.column(name)
            .and_then(|c| c.u32())
            .map_err(|e| WriteError::Parquet(format!("{name} column: {e}")))
    };
    let f64_col = |name: &str| {
        df.column(name)
            .and_then(|c| c.f64())
            .map_err(|e| WriteError::Parquet(format!("{name} column: {e}")))
    };
    let (open, high, low, close, volume) = (
        u32_col("open")?,
        u32_col("high")?,
        u32_col("low")?,
        u32_col("close")?,
        u32_col("volume")?,
    );
    let (dividend, split) = (f64_col("dividend")?, f64_col("split")?);

    let epoch = NaiveDate::default();
    let null_at = |column: &str, i: usize| WriteError::Layout {
        path: path.to_path_buf(),
        reason: format!("null {column} at row {i}"),
    };

    (0..df.height())
        .map(|i| {
            let days = date_ca.get(i).ok_or_else(|| null_at("date", i))?;
            Ok(NormalizedRow {
                date: epoch + chrono::Duration::days(days as i64),
                open: open.get(i).ok_or_else(|| null_at("open", i))?,
                high: high.get(i).ok_or_else(|| null_at("high", i))?,
                low: low.get(i).ok_or_else(|| null_at("low", i))?,
                close: close.get(i).ok_or_else(|| null_at("close", i))?,
                volume: volume.get(i).ok_or_else(|| null_at("volume", i))?,
                dividend: dividend.get(i).ok_or_else(|| null_at("dividend", i))?,
                split: split.get(i).ok_or_else(|| null_at("split", i))?,
            })
        })
        .collect()
}
