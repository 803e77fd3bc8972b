//! Cleaning and single-factor price adjustment.

use crate::domain::{NormalizedRow, RawPriceRow};
use chrono::NaiveDate;
use std::collections::HashSet;

/// A row after adjustment: prices rescaled by `adj_close / close`, corporate
/// action columns synthesized, still floating point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdjustedBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<f64>,
    pub dividend: f64,
    pub split: f64,
}

/// Rows that survived cleaning and adjustment, plus what was thrown away.
#[derive(Debug, Default)]
pub struct Adjusted {
    pub bars: Vec<AdjustedBar>,
    pub dropped_incomplete: usize,
    pub dropped_duplicate: usize,
    /// Rows whose adjusted prices are undefined (NaN), e.g. a zero close.
    pub dropped_undefined_adjustment: usize,
}

/// `adj_close / close`. May be infinite or NaN; [`adjust_row`] decides.
pub fn adjustment_factor(row: &RawPriceRow) -> f64 {
    row.adj_close / row.close
}

/// Rescale all four prices of one row by its adjustment factor.
///
/// Every price on the date is multiplied by the same factor, so intraday
/// relationships (high >= low, ...) survive up to float rounding.
///
/// Returns `None` only when an adjusted price is NaN, as with a zero close
/// (`0 * inf`). Infinite adjusted prices are kept and clamped on coercion.
pub fn adjust_row(row: &RawPriceRow) -> Option<AdjustedBar> {
    let factor = adjustment_factor(row);
    let bar = AdjustedBar {
        date: row.date,
        open: row.open * factor,
        high: row.high * factor,
        low: row.low * factor,
        close: row.close * factor,
        volume: row.volume(),
        dividend: NormalizedRow::NO_DIVIDEND,
        split: NormalizedRow::NO_SPLIT,
    };
    [bar.open, bar.high, bar.low, bar.close]
        .iter()
        .all(|v| !v.is_nan())
        .then_some(bar)
}

/// Drop incomplete and duplicate-date rows, then adjust what is left.
///
/// The first row seen for a date wins. Input order is otherwise preserved.
pub fn clean_and_adjust(rows: Vec<RawPriceRow>) -> Adjusted {
    let mut out = Adjusted {
        bars: Vec::with_capacity(rows.len()),
        ..Adjusted::default()
    };
    let mut seen: HashSet<NaiveDate> = HashSet::with_capacity(rows.len());

    for row in rows {
        if !row.is_complete() {
            out.dropped_incomplete += 1;
            continue;
        }
        if !seen.insert(row.date) {
            out.dropped_duplicate += 1;
            continue;
        }
        match adjust_row(&row) {
            Some(bar) => out.bars.push(bar),
            None => out.dropped_undefined_adjustment += 1,
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(date: &str, open: f64, high: f64, low: f64, close: f64, adj: f64) -> RawPriceRow {
        RawPriceRow {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            open,
            high,
            low,
            close,
            adj_close: adj,
            volume: Some(1000.0),
        }
    }

    #[test]
    fn factor_scales_all_prices_uniformly() {
        let bar = adjust_row(&raw("2020-01-02", 110.0, 115.0, 95.0, 100.0, 90.0)).unwrap();
        assert!((bar.open - 99.0).abs() < 1e-9);
        assert!((bar.high - 103.5).abs() < 1e-9);
        assert!((bar.low - 85.5).abs() < 1e-9);
        assert!((bar.close - 90.0).abs() < 1e-9);
        assert_eq!(bar.dividend, 0.0);
        assert_eq!(bar.split, 1.0);
    }

    #[test]
    fn zero_close_is_undefined() {
        let row = raw("2020-01-02", 1.0, 1.0, 1.0, 0.0, 1.0);
        assert!(adjustment_factor(&row).is_infinite());
        assert_eq!(adjust_row(&row), None);
    }

    #[test]
    fn infinite_prices_survive_adjustment() {
        let bar = adjust_row(&raw("2020-01-02", f64::INFINITY, 11.0, 9.0, 10.0, 10.0)).unwrap();
        assert_eq!(bar.open, f64::INFINITY);
        assert_eq!(bar.close, 10.0);

        // Infinite adj_close gives an infinite factor over non-zero prices.
        let bar = adjust_row(&raw("2020-01-02", 10.0, 11.0, 9.0, 10.0, f64::INFINITY)).unwrap();
        assert!(bar.high.is_infinite());
    }

    #[test]
    fn clean_counts_each_kind_of_drop() {
        let rows = vec![
            raw("2020-01-02", 10.0, 11.0, 9.0, 10.0, 10.0),
            raw("2020-01-02", 20.0, 21.0, 19.0, 20.0, 20.0),
            raw("2020-01-03", f64::NAN, 11.0, 9.0, 10.0, 10.0),
            raw("2020-01-06", 10.0, 11.0, 9.0, 0.0, 10.0),
            raw("2020-01-07", 10.0, 11.0, 9.0, 10.0, 5.0),
        ];
        let out = clean_and_adjust(rows);
        assert_eq!(out.bars.len(), 2);
        assert_eq!(out.dropped_duplicate, 1);
        assert_eq!(out.dropped_incomplete, 1);
        assert_eq!(out.dropped_undefined_adjustment, 1);
        // First occurrence of the duplicated date is kept.
        assert_eq!(out.bars[0].open, 10.0);
        assert_eq!(out.bars[1].close, 5.0);
    }
}
