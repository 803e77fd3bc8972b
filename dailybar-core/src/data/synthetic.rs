//! Synthetic raw rows for demos and tests.
//!
//! Produces a seeded random walk from a starting price of 100.0. The seed is
//! derived from the symbol name, so the same symbol always yields the same
//! rows. Weekends are skipped; holidays are not, which gives the normalizer
//! off-calendar rows to discard. A slow downward drift of `adj_close`
//! relative to `close` mimics accumulated dividends.

use super::provider::{DataError, DataProvider, DataSource, FetchResult};
use crate::domain::RawPriceRow;
use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone)]
pub struct SyntheticProvider {
    /// Probability that a generated session is left out entirely.
    pub gap_probability: f64,
}

impl Default for SyntheticProvider {
    fn default() -> Self {
        Self {
            gap_probability: 0.02,
        }
    }
}

impl SyntheticProvider {
    pub fn generate(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<RawPriceRow> {
        let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
        let mut rng = StdRng::from_seed(seed);

        let mut rows = Vec::new();
        let mut price = 100.0_f64;
        let mut adj_ratio = 1.0_f64;

        for date in start.iter_days().take_while(|d| *d <= end) {
            if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                continue;
            }

            let daily_return: f64 = rng.gen_range(-0.03..0.03);
            let open = price;
            let close = price * (1.0 + daily_return);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = rng.gen_range(500_000..5_000_000u64) as f64;
            price = close;
            adj_ratio *= 1.0 - rng.gen_range(0.0..0.0002);

            if rng.gen_bool(self.gap_probability.clamp(0.0, 1.0)) {
                continue;
            }

            rows.push(RawPriceRow {
                date,
                open,
                high,
                low,
                close,
                adj_close: close * adj_ratio,
                volume: Some(volume),
            });
        }

        rows
    }
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        Ok(FetchResult {
            symbol: symbol.to_string(),
            rows: self.generate(symbol, start, end),
            source: DataSource::Synthetic,
        })
    }
}
