//! Post-build checks on a bundle directory.
//!
//! Reads each symbol's file back and checks it is dense over the calendar
//! and, when a manifest is available, byte-for-byte the series that was
//! written.

use crate::manifest::BundleManifest;
use crate::writer::BundleWriter;
use chrono::NaiveDate;
use dailybar_core::fingerprint::series_hash;
use dailybar_core::CanonicalCalendar;
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    MissingFile,
    Unreadable(String),
    RowCount { expected: usize, found: usize },
    DateMismatch { index: usize, expected: NaiveDate, found: NaiveDate },
    NotIncreasing { index: usize, date: NaiveDate },
    HashMismatch { expected: String, found: String },
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFile => write!(f, "file missing"),
            Self::Unreadable(reason) => write!(f, "unreadable: {reason}"),
            Self::RowCount { expected, found } => {
                write!(f, "expected {expected} rows, found {found}")
            }
            Self::DateMismatch {
                index,
                expected,
                found,
            } => write!(f, "row {index}: expected {expected}, found {found}"),
            Self::NotIncreasing { index, date } => {
                write!(f, "row {index}: date {date} not after previous row")
            }
            Self::HashMismatch { expected, found } => {
                write!(f, "content hash {found} differs from manifest {expected}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolCheck {
    pub symbol: String,
    pub problems: Vec<Problem>,
}

impl SymbolCheck {
    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    pub checks: Vec<SymbolCheck>,
}

impl VerifyReport {
    pub fn is_clean(&self) -> bool {
        self.checks.iter().all(SymbolCheck::is_ok)
    }

    pub fn failing(&self) -> impl Iterator<Item = &SymbolCheck> {
        self.checks.iter().filter(|c| !c.is_ok())
    }
}

/// Check every symbol's file against the calendar (and manifest hashes).
pub fn verify_bundle(
    writer: &BundleWriter,
    calendar: &CanonicalCalendar,
    symbols: &[String],
    manifest: Option<&BundleManifest>,
) -> VerifyReport {
    let checks = symbols
        .iter()
        .map(|symbol| {
            let problems = check_symbol(writer, calendar, symbol, manifest);
            if problems.is_empty() {
                debug!(symbol = symbol.as_str(), "verified");
            } else {
                for p in &problems {
                    warn!(symbol = symbol.as_str(), problem = %p, "verify failed");
                }
            }
            SymbolCheck {
                symbol: symbol.clone(),
                problems,
            }
        })
        .collect();
    VerifyReport { checks }
}

fn check_symbol(
    writer: &BundleWriter,
    calendar: &CanonicalCalendar,
    symbol: &str,
    manifest: Option<&BundleManifest>,
) -> Vec<Problem> {
    if !writer.symbol_path(symbol).exists() {
        return vec![Problem::MissingFile];
    }
    let rows = match writer.read(symbol) {
        Ok(rows) => rows,
        Err(e) => return vec![Problem::Unreadable(e.to_string())],
    };

    let mut problems = Vec::new();
    if rows.len() != calendar.len() {
        problems.push(Problem::RowCount {
            expected: calendar.len(),
            found: rows.len(),
        });
    }
    for (index, pair) in rows.windows(2).enumerate() {
        if pair[1].date <= pair[0].date {
            problems.push(Problem::NotIncreasing {
                index: index + 1,
                date: pair[1].date,
            });
            break;
        }
    }
    if let Some((index, (row, expected))) = rows
        .iter()
        .zip(calendar.dates())
        .enumerate()
        .find(|(_, (row, expected))| row.date != **expected)
    {
        problems.push(Problem::DateMismatch {
            index,
            expected: *expected,
            found: row.date,
        });
    }
    if let Some(entry) = manifest.and_then(|m| m.entry(symbol)) {
        let found = series_hash(&rows);
        if found != entry.hash {
            problems.push(Problem::HashMismatch {
                expected: entry.hash.to_string(),
                found: found.to_string(),
            });
        }
    }
    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::OutputFormat;
    use dailybar_core::{NormalizeReport, NormalizedRow, NormalizedSeries};

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn row(date: &str) -> NormalizedRow {
        NormalizedRow {
            date: d(date),
            open: 1,
            high: 1,
            low: 1,
            close: 1,
            volume: 0,
            dividend: 0.0,
            split: 1.0,
        }
    }

    fn write(writer: &BundleWriter, symbol: &str, rows: Vec<NormalizedRow>) {
        writer
            .write(&NormalizedSeries {
                symbol: symbol.into(),
                rows,
                origins: vec![],
                report: NormalizeReport::default(),
            })
            .unwrap();
    }

    #[test]
    fn detects_missing_and_short_files() {
        let dir = tempfile::tempdir().unwrap();
        let writer = BundleWriter::new(dir.path(), OutputFormat::Csv);
        let calendar =
            CanonicalCalendar::new(vec![d("2020-01-02"), d("2020-01-03"), d("2020-01-06")]).unwrap();
        write(&writer, "OK", vec![row("2020-01-02"), row("2020-01-03"), row("2020-01-06")]);
        write(&writer, "GAP", vec![row("2020-01-02"), row("2020-01-06")]);

        let symbols: Vec<String> = ["OK", "GAP", "NONE"].iter().map(|s| s.to_string()).collect();
        let report = verify_bundle(&writer, &calendar, &symbols, None);

        assert!(!report.is_clean());
        assert!(report.checks[0].is_ok());
        assert_eq!(
            report.checks[1].problems,
            vec![
                Problem::RowCount {
                    expected: 3,
                    found: 2
                },
                Problem::DateMismatch {
                    index: 1,
                    expected: d("2020-01-03"),
                    found: d("2020-01-06")
                },
            ]
        );
        assert_eq!(report.checks[2].problems, vec![Problem::MissingFile]);
        assert_eq!(report.failing().count(), 2);
    }
}
