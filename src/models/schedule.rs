//! Pay-schedule and period boundary calculation
//!
//! A pay schedule splits every month into two budgeting windows bounded by
//! the user's configured pay days. All computation here is pure calendar
//! arithmetic; nothing touches storage or the clock.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The computed boundaries of a single pay period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodBoundaries {
    /// First day of the period
    pub start: NaiveDate,
    /// Last day of the period (inclusive)
    pub end: NaiveDate,
    /// Stable natural key for the period's starting pay day,
    /// `"YYYY-MM-01"` or `"YYYY-MM-<p2>"`
    pub key: String,
    /// 1 for the first half of the month, the second pay day for the second
    /// half (e.g. 15)
    pub number: u32,
}

impl PeriodBoundaries {
    /// Check if a date falls within this period
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

impl fmt::Display for PeriodBoundaries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

/// Two configured pay days per month, splitting it into two periods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaySchedule {
    pay_days: [u32; 2],
}

impl Default for PaySchedule {
    fn default() -> Self {
        Self { pay_days: [1, 15] }
    }
}

impl PaySchedule {
    /// Create a schedule from two pay days
    ///
    /// Requires `1 <= first <= 27` and `first < second <= 31`. A second pay
    /// day that exceeds a short month is clamped to that month's last real
    /// day at computation time, never rejected here. The first pay day must
    /// stay below the clamp floor (day 28, February's length) so that the
    /// first half of every month is non-empty and chained periods never
    /// overlap.
    pub fn new(pay_days: [u32; 2]) -> Result<Self, ScheduleError> {
        let [p1, p2] = pay_days;
        if p1 < 1 || p1 > 27 || p2 > 31 || p1 >= p2 {
            return Err(ScheduleError::InvalidPayDays(pay_days));
        }
        Ok(Self { pay_days })
    }

    /// The configured pay days
    pub fn pay_days(&self) -> [u32; 2] {
        self.pay_days
    }

    /// Compute the boundaries of the period containing `date`
    pub fn boundaries_for(&self, date: NaiveDate) -> PeriodBoundaries {
        let [p1, _] = self.pay_days;
        let day = date.day();

        if day < p1 {
            // Tail of the second half that started in the previous month.
            // Unreachable with the default first pay day of 1.
            let prev = first_of_month(date).pred_opt().unwrap_or(date);
            self.second_half(prev.year(), prev.month())
        } else if day < self.second_pay_day_in(date.year(), date.month()) {
            self.first_half(date.year(), date.month())
        } else {
            self.second_half(date.year(), date.month())
        }
    }

    /// Compute the boundaries of the period immediately after one ending on
    /// `current_end`
    ///
    /// Chaining must always go through the previous period's end date, never
    /// wall-clock "today", so back-filled or late creation cannot skip or
    /// duplicate a period.
    pub fn next_after(&self, current_end: NaiveDate) -> PeriodBoundaries {
        self.boundaries_for(current_end + Duration::days(1))
    }

    /// The second pay day clamped to the month's last real day
    fn second_pay_day_in(&self, year: i32, month: u32) -> u32 {
        self.pay_days[1].min(days_in_month(year, month))
    }

    fn first_half(&self, year: i32, month: u32) -> PeriodBoundaries {
        let [p1, _] = self.pay_days;
        let p2 = self.second_pay_day_in(year, month);
        PeriodBoundaries {
            start: ymd(year, month, p1),
            end: ymd(year, month, p2 - 1),
            key: format!("{:04}-{:02}-01", year, month),
            number: 1,
        }
    }

    fn second_half(&self, year: i32, month: u32) -> PeriodBoundaries {
        let [p1, p2] = self.pay_days;
        let start = ymd(year, month, self.second_pay_day_in(year, month));
        // Day before the first pay day of the next month. With a first pay
        // day of 1 this is the last calendar day of the month, computed via
        // next-month arithmetic rather than naive day-31 construction.
        let end = first_of_next_month(year, month) + Duration::days(i64::from(p1) - 1)
            - Duration::days(1);
        PeriodBoundaries {
            start,
            end,
            key: format!("{:04}-{:02}-{:02}", year, month, p2),
            number: p2,
        }
    }
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    // Callers only pass days already clamped to the month
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap_or_else(|| first_of_next_month(year, month) - Duration::days(1))
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    ymd(date.year(), date.month(), 1)
}

fn first_of_next_month(year: i32, month: u32) -> NaiveDate {
    if month == 12 {
        ymd(year + 1, 1, 1)
    } else {
        ymd(year, month + 1, 1)
    }
}

/// Number of real calendar days in a month
fn days_in_month(year: i32, month: u32) -> u32 {
    (first_of_next_month(year, month) - Duration::days(1)).day()
}

/// Error type for pay schedule construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    InvalidPayDays([u32; 2]),
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleError::InvalidPayDays([p1, p2]) => {
                write!(
                    f,
                    "Invalid pay days [{}, {}]: need 1 <= first <= 27 and first < second <= 31",
                    p1, p2
                )
            }
        }
    }
}

impl std::error::Error for ScheduleError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_invalid_pay_days() {
        assert!(PaySchedule::new([0, 15]).is_err());
        assert!(PaySchedule::new([15, 15]).is_err());
        assert!(PaySchedule::new([16, 15]).is_err());
        assert!(PaySchedule::new([1, 32]).is_err());
        assert!(PaySchedule::new([1, 15]).is_ok());
    }

    #[test]
    fn test_first_pay_day_must_exist_in_every_month() {
        // A first pay day at or past the February clamp floor would produce
        // overlapping windows in short months
        assert!(PaySchedule::new([30, 31]).is_err());
        assert!(PaySchedule::new([28, 31]).is_err());
        assert!(PaySchedule::new([27, 31]).is_ok());
    }

    #[test]
    fn test_first_half_default() {
        let schedule = PaySchedule::default();
        let b = schedule.boundaries_for(date(2025, 1, 7));

        assert_eq!(b.start, date(2025, 1, 1));
        assert_eq!(b.end, date(2025, 1, 14));
        assert_eq!(b.key, "2025-01-01");
        assert_eq!(b.number, 1);
        assert!(b.contains(date(2025, 1, 7)));
    }

    #[test]
    fn test_second_half_default() {
        let schedule = PaySchedule::default();
        let b = schedule.boundaries_for(date(2025, 1, 15));

        assert_eq!(b.start, date(2025, 1, 15));
        assert_eq!(b.end, date(2025, 1, 31));
        assert_eq!(b.key, "2025-01-15");
        assert_eq!(b.number, 15);
    }

    #[test]
    fn test_second_half_ends_on_last_real_day() {
        let schedule = PaySchedule::default();
        // February in a non-leap year
        let b = schedule.boundaries_for(date(2025, 2, 20));
        assert_eq!(b.end, date(2025, 2, 28));
        // Leap year
        let b = schedule.boundaries_for(date(2024, 2, 20));
        assert_eq!(b.end, date(2024, 2, 29));
    }

    #[test]
    fn test_second_pay_day_clamped_in_short_month() {
        // Pay day 30 configured, but February has 28 days
        let schedule = PaySchedule::new([1, 30]).unwrap();
        let b = schedule.boundaries_for(date(2025, 2, 28));
        assert_eq!(b.start, date(2025, 2, 28));
        assert_eq!(b.end, date(2025, 2, 28));
        assert_eq!(b.number, 30);

        let first = schedule.boundaries_for(date(2025, 2, 10));
        assert_eq!(first.start, date(2025, 2, 1));
        assert_eq!(first.end, date(2025, 2, 27));
    }

    #[test]
    fn test_next_after_chains_across_month() {
        let schedule = PaySchedule::default();
        let b = schedule.boundaries_for(date(2025, 1, 20));
        let next = schedule.next_after(b.end);

        assert_eq!(next.start, date(2025, 2, 1));
        assert_eq!(next.end, date(2025, 2, 14));
        assert_eq!(next.number, 1);
    }

    #[test]
    fn test_date_before_first_pay_day() {
        // With a first pay day of 5, Jan 3 belongs to the second half that
        // started in December.
        let schedule = PaySchedule::new([5, 20]).unwrap();
        let b = schedule.boundaries_for(date(2025, 1, 3));

        assert_eq!(b.start, date(2024, 12, 20));
        assert_eq!(b.end, date(2025, 1, 4));
        assert_eq!(b.number, 20);
    }

    #[test]
    fn test_year_coverage_contiguous_and_non_overlapping() {
        for pay_days in [[1, 15], [1, 16], [5, 20], [10, 25], [1, 28], [15, 31], [27, 31]] {
            let schedule = PaySchedule::new(pay_days).unwrap();
            let mut day = date(2025, 1, 1);
            let end_of_year = date(2025, 12, 31);

            // Every day is contained in the period computed for it
            while day <= end_of_year {
                let b = schedule.boundaries_for(day);
                assert!(
                    b.contains(day),
                    "pay_days {:?}: {} not in {}",
                    pay_days,
                    day,
                    b
                );
                day += Duration::days(1);
            }

            // Chained periods tile the year with no gaps or overlaps
            let mut current = schedule.boundaries_for(date(2025, 1, 1));
            let mut covered = current.end - current.start + Duration::days(1);
            while current.end < end_of_year {
                let next = schedule.next_after(current.end);
                assert_eq!(
                    next.start,
                    current.end + Duration::days(1),
                    "pay_days {:?}: gap after {}",
                    pay_days,
                    current
                );
                covered = covered + (next.end - next.start + Duration::days(1));
                current = next;
            }
            assert!(covered >= end_of_year - date(2025, 1, 1));
        }
    }

    #[test]
    fn test_serde_round_trip() {
        let schedule = PaySchedule::new([1, 15]).unwrap();
        let b = schedule.boundaries_for(date(2025, 6, 1));
        let json = serde_json::to_string(&b).unwrap();
        let back: PeriodBoundaries = serde_json::from_str(&json).unwrap();
        assert_eq!(b, back);
    }
}
