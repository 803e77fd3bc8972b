//! Calendar alignment and gap filling.
//!
//! Adjusted bars are placed onto the canonical calendar. Sessions without a
//! bar start as void rows; forward-fill and the anomaly patch then decide
//! what each void row becomes.
//!
//! Filling works on whole rows. A raw row that exists but has no volume keeps
//! its missing volume (encoded as 0); it is never filled from earlier rows.

use super::adjust::AdjustedBar;
use crate::calendar::{AnomalyDates, CanonicalCalendar};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where the values of an aligned row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowOrigin {
    /// A raw row existed for this session.
    Raw,
    /// Copied from the most recent earlier row with values.
    ForwardFilled,
    /// Anomaly date copied from the previous session.
    AnomalyPatched,
    /// No earlier values to copy from (leading gap).
    Missing,
}

/// One canonical session and the bar assigned to it, if any.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedRow {
    pub date: NaiveDate,
    pub bar: Option<AdjustedBar>,
    pub origin: RowOrigin,
}

/// Bars reindexed onto the calendar.
#[derive(Debug)]
pub struct Alignment {
    /// One row per canonical session, in calendar order.
    pub rows: Vec<AlignedRow>,
    /// Bars whose date is not a canonical session.
    pub off_calendar: usize,
}

/// Reindex adjusted bars onto the calendar.
///
/// Every session gets exactly one row; sessions with no bar get a void row.
/// Bars dated outside the calendar are discarded and counted.
pub fn reindex(bars: Vec<AdjustedBar>, calendar: &CanonicalCalendar) -> Alignment {
    let mut by_date: HashMap<NaiveDate, AdjustedBar> = HashMap::with_capacity(bars.len());
    let mut off_calendar = 0;
    for bar in bars {
        if calendar.contains(bar.date) {
            by_date.insert(bar.date, bar);
        } else {
            off_calendar += 1;
        }
    }

    let rows = calendar
        .dates()
        .iter()
        .map(|date| match by_date.remove(date) {
            Some(bar) => AlignedRow {
                date: *date,
                bar: Some(bar),
                origin: RowOrigin::Raw,
            },
            None => void_row(*date),
        })
        .collect();

    Alignment { rows, off_calendar }
}

fn void_row(date: NaiveDate) -> AlignedRow {
    AlignedRow {
        date,
        bar: None,
        origin: RowOrigin::Missing,
    }
}

/// Copy the most recent valid bar into following void rows, in date order.
///
/// Anomaly dates are left void here; [`patch_anomalies`] owns them. Returns
/// the number of rows filled.
pub fn forward_fill(rows: &mut [AlignedRow], anomalies: &AnomalyDates) -> usize {
    let mut last: Option<AdjustedBar> = None;
    let mut filled = 0;

    for row in rows.iter_mut() {
        match row.bar {
            Some(bar) => last = Some(bar),
            None if anomalies.contains(row.date) => {}
            None => {
                if let Some(prev) = last {
                    row.bar = Some(AdjustedBar {
                        date: row.date,
                        ..prev
                    });
                    row.origin = RowOrigin::ForwardFilled;
                    filled += 1;
                }
            }
        }
    }

    filled
}

/// Give every still-void anomaly date the full row of the previous session.
///
/// Runs after [`forward_fill`], so the previous session already carries its
/// final values. Anomaly dates with no previous values stay void. Returns the
/// number of rows patched.
pub fn patch_anomalies(rows: &mut [AlignedRow], anomalies: &AnomalyDates) -> usize {
    let mut patched = 0;

    for i in 1..rows.len() {
        if rows[i].bar.is_some() || !anomalies.contains(rows[i].date) {
            continue;
        }
        if let Some(prev) = rows[i - 1].bar {
            rows[i].bar = Some(AdjustedBar {
                date: rows[i].date,
                ..prev
            });
            rows[i].origin = RowOrigin::AnomalyPatched;
            patched += 1;
        }
    }

    patched
}
