//! Price rows: what comes in from a data source and what goes out to the bundle.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Column order of a normalized series, date index first.
///
/// The bundle ingestion step reads files by position and name; reordering or
/// renaming these breaks ingestion.
pub const NORMALIZED_COLUMNS: [&str; 8] = [
    "date", "open", "high", "low", "close", "volume", "dividend", "split",
];

/// Raw daily OHLCV row as received from a data source, before adjustment.
///
/// Missing prices are NaN. `adj_close` carries the vendor's split/dividend
/// adjusted close for the same date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPriceRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: Option<f64>,
}

impl RawPriceRow {
    /// Returns true if no required price field is missing (NaN).
    ///
    /// Infinite prices count as present; coercion clamps them later.
    /// Volume is not required; a missing volume is encoded as zero.
    pub fn is_complete(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.adj_close]
            .iter()
            .all(|v| !v.is_nan())
    }

    /// Volume with NaN folded into `None`.
    pub fn volume(&self) -> Option<f64> {
        self.volume.filter(|v| !v.is_nan())
    }
}

/// One day of a normalized series: adjusted, rounded and bounded.
///
/// Field order matches [`NORMALIZED_COLUMNS`], which is also the serialized
/// column order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRow {
    pub date: NaiveDate,
    pub open: u32,
    pub high: u32,
    pub low: u32,
    pub close: u32,
    pub volume: u32,
    pub dividend: f64,
    pub split: f64,
}

impl NormalizedRow {
    /// Dividend carried on every row. Historical dividends are already folded
    /// into the adjustment factor.
    pub const NO_DIVIDEND: f64 = 0.0;

    /// Split ratio carried on every row, for the same reason.
    pub const NO_SPLIT: f64 = 1.0;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(open: f64, adj_close: f64, volume: Option<f64>) -> RawPriceRow {
        RawPriceRow {
            date: NaiveDate::from_ymd_opt(2020, 1, 2).unwrap(),
            open,
            high: 11.0,
            low: 9.0,
            close: 10.0,
            adj_close,
            volume,
        }
    }

    #[test]
    fn complete_row_accepts_missing_volume() {
        assert!(row(10.0, 10.0, None).is_complete());
        assert!(row(10.0, 10.0, Some(f64::NAN)).is_complete());
    }

    #[test]
    fn nan_price_is_incomplete() {
        assert!(!row(f64::NAN, 10.0, Some(1.0)).is_complete());
        assert!(!row(10.0, f64::NAN, Some(1.0)).is_complete());
    }

    #[test]
    fn infinite_price_is_still_complete() {
        assert!(row(f64::INFINITY, 10.0, Some(1.0)).is_complete());
        assert!(row(10.0, f64::NEG_INFINITY, Some(1.0)).is_complete());
    }

    #[test]
    fn nan_volume_reads_as_missing() {
        assert_eq!(row(10.0, 10.0, Some(f64::NAN)).volume(), None);
        assert_eq!(row(10.0, 10.0, Some(5.0)).volume(), Some(5.0));
    }

    #[test]
    fn column_contract_order() {
        assert_eq!(NORMALIZED_COLUMNS[0], "date");
        assert_eq!(
            &NORMALIZED_COLUMNS[1..],
            &["open", "high", "low", "close", "volume", "dividend", "split"]
        );
    }
}
