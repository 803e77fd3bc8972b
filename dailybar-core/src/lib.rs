//! dailybar core — normalization of raw daily OHLCV series into gap-free,
//! adjusted, integer-encoded series aligned to an exchange calendar.
//!
//! This crate contains:
//! - Domain types (raw and normalized rows)
//! - Canonical calendars, anomaly dates and NYSE session rules
//! - The per-symbol normalizer (adjust, align, fill, patch, coerce)
//! - Local raw data sources (CSV exports, synthetic series)
//! - Content fingerprints of normalized output

pub mod calendar;
pub mod data;
pub mod domain;
pub mod fingerprint;
pub mod normalize;

pub use calendar::{AnomalyDates, CalendarError, CanonicalCalendar, ExchangeCalendar, Xnys};
pub use domain::{NormalizedRow, RawPriceRow, SeriesHash, NORMALIZED_COLUMNS};
pub use normalize::{normalize, NormalizeError, NormalizeReport, NormalizedSeries, Normalizer};
