//! Per-symbol normalization pipeline.
//!
//! raw rows → clean → adjust → reindex onto the calendar → forward-fill →
//! patch anomaly dates → sort → coerce to bounded integers.
//!
//! The pipeline is a pure function of its inputs. Lossy steps (dropped rows,
//! fills, clamps) are deterministic and counted in a [`NormalizeReport`].

pub mod adjust;
pub mod align;
pub mod coerce;

use crate::calendar::{AnomalyDates, CalendarError, CanonicalCalendar};
use crate::domain::{NormalizedRow, RawPriceRow, SeriesHash};
use crate::fingerprint::series_hash;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub use adjust::AdjustedBar;
pub use align::RowOrigin;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("no usable price rows for '{symbol}' ({raw_rows} raw rows, none survived cleaning)")]
    EmptyInput { symbol: String, raw_rows: usize },

    #[error("calendar mismatch: {0}")]
    CalendarMismatch(#[from] CalendarError),
}

/// What one normalization call discarded, filled or clamped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeReport {
    pub raw_rows: usize,
    pub dropped_incomplete: usize,
    pub dropped_duplicate: usize,
    pub dropped_undefined_adjustment: usize,
    pub dropped_off_calendar: usize,
    pub forward_filled: usize,
    pub anomaly_patched: usize,
    pub unfilled_leading: usize,
    pub clamped: usize,
}

impl NormalizeReport {
    /// Raw rows that did not make it into the output as themselves.
    pub fn dropped(&self) -> usize {
        self.dropped_incomplete
            + self.dropped_duplicate
            + self.dropped_undefined_adjustment
            + self.dropped_off_calendar
    }
}

/// A normalized series for one symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSeries {
    pub symbol: String,
    /// One row per canonical session, ascending.
    pub rows: Vec<NormalizedRow>,
    /// Provenance of each row, parallel to `rows`.
    pub origins: Vec<RowOrigin>,
    pub report: NormalizeReport,
}

impl NormalizedSeries {
    pub fn content_hash(&self) -> SeriesHash {
        series_hash(&self.rows)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }
}

/// Normalizer bound to one calendar and anomaly list.
///
/// Holds only read-only state, so one instance can be shared across worker
/// threads normalizing different symbols.
#[derive(Debug, Clone)]
pub struct Normalizer {
    calendar: CanonicalCalendar,
    anomalies: AnomalyDates,
}

impl Normalizer {
    pub fn new(calendar: CanonicalCalendar, anomalies: AnomalyDates) -> Self {
        for date in anomalies.iter().filter(|d| !calendar.contains(*d)) {
            warn!(%date, "anomaly date is not a canonical session and will not be patched");
        }
        Self {
            calendar,
            anomalies,
        }
    }

    /// Build from an unvalidated date list.
    pub fn from_dates(
        canonical_dates: Vec<NaiveDate>,
        anomalies: AnomalyDates,
    ) -> Result<Self, NormalizeError> {
        let calendar = CanonicalCalendar::new(canonical_dates)?;
        Ok(Self::new(calendar, anomalies))
    }

    pub fn calendar(&self) -> &CanonicalCalendar {
        &self.calendar
    }

    pub fn anomalies(&self) -> &AnomalyDates {
        &self.anomalies
    }

    /// Normalize one symbol's raw rows onto the calendar.
    ///
    /// Fails only when no row survives cleaning. Missing sessions are filled
    /// and out-of-range values are clamped; neither is an error.
    pub fn normalize(
        &self,
        symbol: &str,
        rows: Vec<RawPriceRow>,
    ) -> Result<NormalizedSeries, NormalizeError> {
        let mut report = NormalizeReport {
            raw_rows: rows.len(),
            ..NormalizeReport::default()
        };

        // 1-3. clean, adjust, synthesize dividend/split
        let adjusted = adjust::clean_and_adjust(rows);
        report.dropped_incomplete = adjusted.dropped_incomplete;
        report.dropped_duplicate = adjusted.dropped_duplicate;
        report.dropped_undefined_adjustment = adjusted.dropped_undefined_adjustment;

        if adjusted.bars.is_empty() {
            return Err(NormalizeError::EmptyInput {
                symbol: symbol.to_string(),
                raw_rows: report.raw_rows,
            });
        }
        debug!(symbol, kept = adjusted.bars.len(), "adjusted raw rows");

        // 4-6. align, forward-fill, patch
        let mut aligned = align::reindex(adjusted.bars, &self.calendar);
        report.dropped_off_calendar = aligned.off_calendar;
        report.forward_filled = align::forward_fill(&mut aligned.rows, &self.anomalies);
        report.anomaly_patched = align::patch_anomalies(&mut aligned.rows, &self.anomalies);

        // 7. sort; reindexing already yields calendar order
        aligned.rows.sort_by_key(|r| r.date);

        // 8. coerce
        let mut out = Vec::with_capacity(aligned.rows.len());
        let mut origins = Vec::with_capacity(aligned.rows.len());
        for row in &aligned.rows {
            if row.bar.is_none() {
                report.unfilled_leading += 1;
            }
            let (encoded, clamps) = encode(row.date, row.bar.as_ref());
            report.clamped += clamps;
            out.push(encoded);
            origins.push(row.origin);
        }

        if report.dropped() > 0 {
            warn!(
                symbol,
                incomplete = report.dropped_incomplete,
                duplicate = report.dropped_duplicate,
                undefined_adjustment = report.dropped_undefined_adjustment,
                off_calendar = report.dropped_off_calendar,
                "dropped raw rows"
            );
        }
        if report.unfilled_leading > 0 {
            warn!(
                symbol,
                sessions = report.unfilled_leading,
                "sessions before first valid row encoded as zero"
            );
        }
        debug!(
            symbol,
            rows = out.len(),
            forward_filled = report.forward_filled,
            anomaly_patched = report.anomaly_patched,
            clamped = report.clamped,
            "normalized"
        );

        Ok(NormalizedSeries {
            symbol: symbol.to_string(),
            rows: out,
            origins,
            report,
        })
    }
}

/// Encode one aligned row; returns the row and how many fields were clamped.
fn encode(date: NaiveDate, bar: Option<&AdjustedBar>) -> (NormalizedRow, usize) {
    let (open, high, low, close, volume) = match bar {
        Some(b) => (b.open, b.high, b.low, b.close, b.volume),
        None => (f64::NAN, f64::NAN, f64::NAN, f64::NAN, None),
    };
    let fields = [
        coerce::price_to_u32(open),
        coerce::price_to_u32(high),
        coerce::price_to_u32(low),
        coerce::price_to_u32(close),
        coerce::volume_to_u32(volume),
    ];
    let clamps = fields.iter().filter(|(_, clamped)| *clamped).count();

    let row = NormalizedRow {
        date,
        open: fields[0].0,
        high: fields[1].0,
        low: fields[2].0,
        close: fields[3].0,
        volume: fields[4].0,
        dividend: bar.map_or(NormalizedRow::NO_DIVIDEND, |b| b.dividend),
        split: bar.map_or(NormalizedRow::NO_SPLIT, |b| b.split),
    };
    (row, clamps)
}

/// Normalize raw rows against a plain date list.
///
/// Validates `canonical_dates` (non-empty, strictly increasing) and returns
/// exactly one row per date.
pub fn normalize(
    rows: Vec<RawPriceRow>,
    canonical_dates: &[NaiveDate],
    anomaly_dates: &[NaiveDate],
) -> Result<Vec<NormalizedRow>, NormalizeError> {
    let normalizer = Normalizer::from_dates(
        canonical_dates.to_vec(),
        AnomalyDates::new(anomaly_dates.iter().copied()),
    )?;
    normalizer.normalize("", rows).map(|series| series.rows)
}
