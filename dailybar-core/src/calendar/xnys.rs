//! New York Stock Exchange session rules.
//!
//! Rule-based: weekends, the NYSE full-day holidays with their weekend
//! observance, and a short list of unscheduled closures. Early closes are
//! still sessions and are not modelled.

use super::ExchangeCalendar;
use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Unscheduled full-day closures since 2000.
const UNSCHEDULED_CLOSURES: [(i32, u32, u32); 10] = [
    (2001, 9, 11),
    (2001, 9, 12),
    (2001, 9, 13),
    (2001, 9, 14),
    (2004, 6, 11),
    (2007, 1, 2),
    (2012, 10, 29),
    (2012, 10, 30),
    (2018, 12, 5),
    (2025, 1, 9),
];

/// NYSE calendar.
#[derive(Debug, Clone, Copy, Default)]
pub struct Xnys;

impl Xnys {
    /// Whether `date` is a full-day exchange holiday (weekends excluded).
    pub fn is_holiday(date: NaiveDate) -> bool {
        let year = date.year();
        let fixed = |month, day| observed(NaiveDate::from_ymd_opt(year, month, day));

        // New Year's Day falling on a Saturday is not observed on the Friday before.
        let new_year = NaiveDate::from_ymd_opt(year, 1, 1)
            .filter(|d| d.weekday() != Weekday::Sat)
            .and_then(|d| observed(Some(d)));

        let holidays = [
            new_year,
            (year >= 1998)
                .then(|| NaiveDate::from_weekday_of_month_opt(year, 1, Weekday::Mon, 3))
                .flatten(),
            NaiveDate::from_weekday_of_month_opt(year, 2, Weekday::Mon, 3),
            good_friday(year),
            last_weekday_of_month(year, 5, Weekday::Mon),
            (year >= 2022).then(|| fixed(6, 19)).flatten(),
            fixed(7, 4),
            NaiveDate::from_weekday_of_month_opt(year, 9, Weekday::Mon, 1),
            NaiveDate::from_weekday_of_month_opt(year, 11, Weekday::Thu, 4),
            fixed(12, 25),
        ];

        holidays.iter().flatten().any(|h| *h == date)
            || UNSCHEDULED_CLOSURES
                .iter()
                .any(|&(y, m, d)| NaiveDate::from_ymd_opt(y, m, d) == Some(date))
    }
}

impl ExchangeCalendar for Xnys {
    fn name(&self) -> &str {
        "XNYS"
    }

    fn is_session(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !Self::is_holiday(date)
    }
}

/// Saturday holidays move to Friday, Sunday holidays to Monday.
fn observed(date: Option<NaiveDate>) -> Option<NaiveDate> {
    let date = date?;
    match date.weekday() {
        Weekday::Sat => Some(date - Duration::days(1)),
        Weekday::Sun => Some(date + Duration::days(1)),
        _ => Some(date),
    }
}

fn last_weekday_of_month(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let mut day = first_of_next.pred_opt()?;
    while day.weekday() != weekday {
        day = day.pred_opt()?;
    }
    Some(day)
}

/// Good Friday: two days before Western Easter (anonymous Gregorian computus).
fn good_friday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    let easter = NaiveDate::from_ymd_opt(year, month as u32, day as u32)?;
    Some(easter - Duration::days(2))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn session_count(year: i32) -> usize {
        Xnys.sessions(
            NaiveDate::from_ymd_opt(year, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(year, 12, 31).unwrap(),
        )
        .unwrap()
        .len()
    }

    #[test]
    fn good_friday_known_years() {
        assert_eq!(good_friday(2024), Some(d("2024-03-29")));
        assert_eq!(good_friday(2023), Some(d("2023-04-07")));
        assert_eq!(good_friday(2016), Some(d("2016-03-25")));
    }

    #[test]
    fn full_year_session_counts() {
        assert_eq!(session_count(2022), 251);
        assert_eq!(session_count(2023), 250);
        assert_eq!(session_count(2024), 252);
    }

    #[test]
    fn holidays_2024() {
        for h in [
            "2024-01-01", "2024-01-15", "2024-02-19", "2024-03-29", "2024-05-27", "2024-06-19",
            "2024-07-04", "2024-09-02", "2024-11-28", "2024-12-25",
        ] {
            assert!(Xnys::is_holiday(d(h)), "{h} should be a holiday");
            assert!(!Xnys.is_session(d(h)));
        }
    }

    #[test]
    fn weekend_observance() {
        // Christmas 2022 fell on a Sunday.
        assert!(!Xnys.is_session(d("2022-12-26")));
        // Independence Day 2020 fell on a Saturday.
        assert!(!Xnys.is_session(d("2020-07-03")));
        // New Year's Day 2022 fell on a Saturday: Dec 31 2021 stays open.
        assert!(Xnys.is_session(d("2021-12-31")));
    }

    #[test]
    fn juneteenth_only_from_2022() {
        assert!(Xnys.is_session(d("2021-06-18")));
        assert!(!Xnys.is_session(d("2023-06-19")));
    }

    #[test]
    fn unscheduled_closures() {
        assert!(!Xnys.is_session(d("2012-10-29")));
        assert!(!Xnys.is_session(d("2018-12-05")));
        assert!(Xnys.is_session(d("2018-12-06")));
    }

    #[test]
    fn bond_market_holidays_are_equity_sessions() {
        // Columbus Day and Veterans Day close bond markets, not the NYSE.
        assert!(Xnys.is_session(d("2016-10-10")));
        assert!(Xnys.is_session(d("2016-11-11")));
    }
}
