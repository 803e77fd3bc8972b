//! Batch runner: fetch, normalize and write every configured symbol.
//!
//! Symbols are independent. A failure on one symbol is recorded in the
//! summary and never stops the others.

use crate::writer::{BundleWriter, WriteError};
use chrono::NaiveDate;
use dailybar_core::data::{DataError, DataProvider, DataSource};
use dailybar_core::{NormalizeError, NormalizeReport, Normalizer, SeriesHash};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, info_span, warn};

/// Why one symbol failed.
#[derive(Debug, Error)]
pub enum SymbolError {
    #[error("fetch failed: {0}")]
    Data(#[from] DataError),

    #[error("normalization failed: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("write failed: {0}")]
    Write(#[from] WriteError),
}

/// One symbol written to the bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolOutcome {
    pub symbol: String,
    pub source: DataSource,
    pub path: PathBuf,
    pub rows: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub hash: SeriesHash,
    pub report: NormalizeReport,
}

/// Result of a whole batch, in configured symbol order.
#[derive(Debug)]
pub struct BatchSummary {
    pub total: usize,
    pub outcomes: Vec<SymbolOutcome>,
    pub errors: Vec<(String, SymbolError)>,
}

impl BatchSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failed(&self) -> usize {
        self.errors.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Progress callback for batch runs.
///
/// Called from worker threads when the batch runs in parallel, so
/// `index` reflects configured order, not completion order.
pub trait BatchProgress: Sync {
    fn on_start(&self, symbol: &str, index: usize, total: usize);

    fn on_complete(
        &self,
        symbol: &str,
        index: usize,
        total: usize,
        result: &Result<SymbolOutcome, SymbolError>,
    );

    fn on_batch_complete(&self, summary: &BatchSummary);
}

/// Progress reporter that logs through `tracing`.
pub struct LogProgress;

impl BatchProgress for LogProgress {
    fn on_start(&self, symbol: &str, index: usize, total: usize) {
        info!("[{}/{}] normalizing {symbol}", index + 1, total);
    }

    fn on_complete(
        &self,
        symbol: &str,
        _index: usize,
        _total: usize,
        result: &Result<SymbolOutcome, SymbolError>,
    ) {
        match result {
            Ok(outcome) => {
                let r = &outcome.report;
                info!(
                    symbol,
                    rows = outcome.rows,
                    dropped = r.dropped(),
                    forward_filled = r.forward_filled,
                    anomaly_patched = r.anomaly_patched,
                    clamped = r.clamped,
                    hash = outcome.hash.short(),
                    "wrote {}",
                    outcome.path.display()
                );
            }
            Err(e) => warn!(symbol, error = %e, "symbol failed"),
        }
    }

    fn on_batch_complete(&self, summary: &BatchSummary) {
        info!(
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            total = summary.total,
            "batch complete"
        );
    }
}

/// Progress reporter that does nothing; for tests and library callers.
pub struct SilentProgress;

impl BatchProgress for SilentProgress {
    fn on_start(&self, _symbol: &str, _index: usize, _total: usize) {}

    fn on_complete(
        &self,
        _symbol: &str,
        _index: usize,
        _total: usize,
        _result: &Result<SymbolOutcome, SymbolError>,
    ) {
    }

    fn on_batch_complete(&self, _summary: &BatchSummary) {}
}

/// Runs one normalizer over many symbols.
pub struct BatchRunner<'a> {
    provider: &'a dyn DataProvider,
    normalizer: &'a Normalizer,
    writer: &'a BundleWriter,
    parallel: bool,
}

impl<'a> BatchRunner<'a> {
    pub fn new(
        provider: &'a dyn DataProvider,
        normalizer: &'a Normalizer,
        writer: &'a BundleWriter,
    ) -> Self {
        Self {
            provider,
            normalizer,
            writer,
            parallel: true,
        }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn run(&self, symbols: &[String], progress: &dyn BatchProgress) -> BatchSummary {
        let total = symbols.len();
        let task = |(index, symbol): (usize, &String)| {
            progress.on_start(symbol, index, total);
            let result = self.run_symbol(symbol);
            progress.on_complete(symbol, index, total, &result);
            (symbol.clone(), result)
        };

        let results: Vec<(String, Result<SymbolOutcome, SymbolError>)> = if self.parallel {
            symbols.par_iter().enumerate().map(task).collect()
        } else {
            symbols.iter().enumerate().map(task).collect()
        };

        let mut outcomes = Vec::new();
        let mut errors = Vec::new();
        for (symbol, result) in results {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => errors.push((symbol, e)),
            }
        }

        let summary = BatchSummary {
            total,
            outcomes,
            errors,
        };
        progress.on_batch_complete(&summary);
        summary
    }

    /// Fetch → normalize → write for a single symbol.
    fn run_symbol(&self, symbol: &str) -> Result<SymbolOutcome, SymbolError> {
        let _span = info_span!("symbol", symbol).entered();
        let calendar = self.normalizer.calendar();

        let fetched = self
            .provider
            .fetch(symbol, calendar.first(), calendar.last())?;
        let series = self.normalizer.normalize(symbol, fetched.rows)?;
        let path = self.writer.write(&series)?;

        Ok(SymbolOutcome {
            symbol: symbol.to_string(),
            source: fetched.source,
            path,
            rows: series.rows.len(),
            first_date: calendar.first(),
            last_date: calendar.last(),
            hash: series.content_hash(),
            report: series.report,
        })
    }
}

/// Run a batch in parallel with the given progress reporter.
pub fn run_batch(
    provider: &dyn DataProvider,
    normalizer: &Normalizer,
    writer: &BundleWriter,
    symbols: &[String],
    progress: &dyn BatchProgress,
) -> BatchSummary {
    BatchRunner::new(provider, normalizer, writer).run(symbols, progress)
}
