//! Trading calendars and the canonical date index.
//!
//! A [`CanonicalCalendar`] is the authoritative, strictly increasing list of
//! sessions a series is aligned to. [`AnomalyDates`] are sessions that the
//! calendar source is known to get wrong; the normalizer patches them
//! explicitly instead of trusting whatever the raw data says.

pub mod xnys;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

pub use xnys::Xnys;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CalendarError {
    #[error("canonical calendar is empty")]
    Empty,

    #[error("canonical calendar is not strictly increasing at index {index}: {date} follows {previous}")]
    Unordered {
        index: usize,
        previous: NaiveDate,
        date: NaiveDate,
    },

    #[error("invalid session window: {start} > {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("unknown exchange calendar '{0}' (known: XNYS)")]
    UnknownCalendar(String),
}

/// Ordered, duplicate-free list of trading sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalCalendar {
    dates: Vec<NaiveDate>,
}

impl CanonicalCalendar {
    /// Validate and wrap a session list.
    ///
    /// Fails if the list is empty or not strictly increasing (which also
    /// rules out duplicates).
    pub fn new(dates: Vec<NaiveDate>) -> Result<Self, CalendarError> {
        if dates.is_empty() {
            return Err(CalendarError::Empty);
        }
        for (i, pair) in dates.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(CalendarError::Unordered {
                    index: i + 1,
                    previous: pair[0],
                    date: pair[1],
                });
            }
        }
        Ok(Self { dates })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Always false for a constructed calendar.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn first(&self) -> NaiveDate {
        self.dates[0]
    }

    pub fn last(&self) -> NaiveDate {
        self.dates[self.dates.len() - 1]
    }

    /// Index of `date` in the calendar, if it is a session.
    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.position(date).is_some()
    }

    /// Merge additional sessions into the calendar.
    ///
    /// Used to place anomaly dates that a calendar source omits but the
    /// downstream bundle expects. Dates already present are ignored.
    pub fn with_extra_sessions(self, extra: impl IntoIterator<Item = NaiveDate>) -> Self {
        let mut merged: BTreeSet<NaiveDate> = self.dates.into_iter().collect();
        merged.extend(extra);
        Self {
            dates: merged.into_iter().collect(),
        }
    }
}

/// Sessions the calendar source is known to miscount.
///
/// Injected from configuration; nothing in the normalizer hardcodes them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnomalyDates(BTreeSet<NaiveDate>);

impl AnomalyDates {
    pub fn new(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self(dates.into_iter().collect())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.0.contains(&date)
    }

    /// Dates in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A named exchange calendar that can enumerate its sessions.
pub trait ExchangeCalendar: Send + Sync {
    /// ISO 10383 MIC style name, e.g. `XNYS`.
    fn name(&self) -> &str;

    /// Whether the exchange holds a regular session on `date`.
    fn is_session(&self, date: NaiveDate) -> bool;

    /// All sessions in `[start, end]`, inclusive.
    fn sessions(&self, start: NaiveDate, end: NaiveDate) -> Result<CanonicalCalendar, CalendarError> {
        if start > end {
            return Err(CalendarError::InvalidRange { start, end });
        }
        let dates: Vec<NaiveDate> = start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| self.is_session(*d))
            .collect();
        CanonicalCalendar::new(dates)
    }
}

/// Resolve a configured calendar name.
pub fn calendar_by_name(name: &str) -> Result<Box<dyn ExchangeCalendar>, CalendarError> {
    match name.to_ascii_uppercase().as_str() {
        "XNYS" | "NYSE" => Ok(Box::new(Xnys)),
        _ => Err(CalendarError::UnknownCalendar(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn rejects_empty_calendar() {
        assert_eq!(CanonicalCalendar::new(vec![]), Err(CalendarError::Empty));
    }

    #[test]
    fn rejects_unordered_calendar() {
        let err = CanonicalCalendar::new(vec![d("2020-01-03"), d("2020-01-02")]).unwrap_err();
        assert_eq!(
            err,
            CalendarError::Unordered {
                index: 1,
                previous: d("2020-01-03"),
                date: d("2020-01-02"),
            }
        );
    }

    #[test]
    fn rejects_duplicate_dates() {
        let result = CanonicalCalendar::new(vec![d("2020-01-02"), d("2020-01-02")]);
        assert!(matches!(result, Err(CalendarError::Unordered { index: 1, .. })));
    }

    #[test]
    fn position_and_bounds() {
        let cal =
            CanonicalCalendar::new(vec![d("2020-01-02"), d("2020-01-03"), d("2020-01-06")]).unwrap();
        assert_eq!(cal.len(), 3);
        assert_eq!(cal.first(), d("2020-01-02"));
        assert_eq!(cal.last(), d("2020-01-06"));
        assert_eq!(cal.position(d("2020-01-06")), Some(2));
        assert!(!cal.contains(d("2020-01-04")));
    }

    #[test]
    fn extra_sessions_merge_in_order() {
        let cal = CanonicalCalendar::new(vec![d("2016-10-07"), d("2016-10-11")])
            .unwrap()
            .with_extra_sessions([d("2016-10-10"), d("2016-10-07")]);
        assert_eq!(
            cal.dates(),
            &[d("2016-10-07"), d("2016-10-10"), d("2016-10-11")]
        );
    }

    #[test]
    fn anomaly_dates_are_sorted_and_deduplicated() {
        let a = AnomalyDates::new([d("2016-11-11"), d("2011-01-03"), d("2016-11-11")]);
        assert_eq!(a.len(), 2);
        assert_eq!(a.iter().next(), Some(d("2011-01-03")));
    }

    #[test]
    fn resolves_known_calendar_names() {
        assert_eq!(calendar_by_name("xnys").unwrap().name(), "XNYS");
        assert_eq!(calendar_by_name("NYSE").unwrap().name(), "XNYS");
        assert!(matches!(
            calendar_by_name("XLON"),
            Err(CalendarError::UnknownCalendar(_))
        ));
    }

    #[test]
    fn sessions_reject_inverted_window() {
        let err = Xnys.sessions(d("2020-01-10"), d("2020-01-01")).unwrap_err();
        assert!(matches!(err, CalendarError::InvalidRange { .. }));
    }

    #[test]
    fn weekend_only_window_is_empty() {
        let err = Xnys.sessions(d("2020-01-04"), d("2020-01-05")).unwrap_err();
        assert_eq!(err, CalendarError::Empty);
    }
}
