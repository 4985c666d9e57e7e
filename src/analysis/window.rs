//! Reporting windows.
//!
//! A window is either one explicit month or a rolling run of months ending
//! at a reference month. Rolling windows are counted in calendar months,
//! not elapsed days, and include the reference month itself.

use crate::events::types::Period;
use chrono::NaiveDate;

/// Length of a rolling window when nothing else is configured.
pub const DEFAULT_WINDOW_MONTHS: u32 = 6;
/// Longest rolling window accepted (one hundred years).
pub const MAX_WINDOW_MONTHS: u32 = 1_200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportWindow {
    Single(Period),
    Rolling { end: Period, months: u32 },
}

impl ReportWindow {
    pub fn single(period: Period) -> Self {
        Self::Single(period)
    }

    /// `months` is clamped to `1..=MAX_WINDOW_MONTHS`.
    pub fn rolling(end: Period, months: u32) -> Self {
        Self::Rolling {
            end,
            months: months.clamp(1, MAX_WINDOW_MONTHS),
        }
    }

    /// Periods in chronological order.
    pub fn periods(&self) -> Vec<Period> {
        match *self {
            Self::Single(period) => vec![period],
            Self::Rolling { end, months } => (0..months as i32)
                .rev()
                .map(|back| end.shift(-back))
                .collect(),
        }
    }

    pub fn first(&self) -> Period {
        match *self {
            Self::Single(period) => period,
            Self::Rolling { end, months } => end.shift(1 - months as i32),
        }
    }

    /// The reporting period: the single month, or the rolling window's end.
    pub fn last(&self) -> Period {
        match *self {
            Self::Single(period) => period,
            Self::Rolling { end, .. } => end,
        }
    }

    pub fn contains(&self, period: Period) -> bool {
        self.first() <= period && period <= self.last()
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.contains(Period::of(date))
    }
}

/// Whether the raw input also covers the months around the target month.
///
/// Computed over every dated line, not just matching records. A gap means
/// the export may have been cut short; it is reported, never acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completeness {
    pub target: Period,
    pub has_previous: bool,
    pub has_next: bool,
}

impl Completeness {
    pub fn check<I>(target: Period, dates: I) -> Self
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let previous = target.previous();
        let next = target.next();
        let mut report = Self {
            target,
            has_previous: false,
            has_next: false,
        };

        for date in dates {
            let period = Period::of(date);
            report.has_previous |= period == previous;
            report.has_next |= period == next;
            if report.is_complete() {
                break;
            }
        }
        report
    }

    pub fn is_complete(&self) -> bool {
        self.has_previous && self.has_next
    }

    /// Warning text naming the missing neighbours, if any.
    pub fn warning(&self) -> Option<String> {
        let mut missing = Vec::with_capacity(2);
        if !self.has_previous {
            missing.push(format!("previous month ({})", self.target.previous()));
        }
        if !self.has_next {
            missing.push(format!("next month ({})", self.target.next()));
        }

        (!missing.is_empty()).then(|| format!("No events found for {}", missing.join(" and ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(year: i32, month: u32) -> Period {
        Period::new(year, month).unwrap()
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn test_rolling_window_steps_calendar_months() {
        let window = ReportWindow::rolling(period(2025, 2), DEFAULT_WINDOW_MONTHS);
        let labels: Vec<String> = window.periods().iter().map(Period::label).collect();
        assert_eq!(
            labels,
            vec!["09_2024", "10_2024", "11_2024", "12_2024", "01_2025", "02_2025"]
        );
        assert_eq!(window.first(), period(2024, 9));
        assert_eq!(window.last(), period(2025, 2));
    }

    #[test]
    fn test_rolling_window_membership() {
        let window = ReportWindow::rolling(period(2025, 10), 6);
        assert!(window.contains_date(date(2025, 5, 1)));
        assert!(window.contains_date(date(2025, 10, 31)));
        assert!(!window.contains_date(date(2025, 4, 30)));
        assert!(!window.contains_date(date(2025, 11, 1)));
    }

    #[test]
    fn test_single_window() {
        let window = ReportWindow::single(period(2025, 8));
        assert_eq!(window.periods(), vec![period(2025, 8)]);
        assert!(window.contains_date(date(2025, 8, 2)));
        assert!(!window.contains_date(date(2025, 9, 1)));
    }

    #[test]
    fn test_zero_month_window_is_clamped() {
        let window = ReportWindow::rolling(period(2025, 8), 0);
        assert_eq!(window.periods().len(), 1);
    }

    #[test]
    fn test_oversized_window_is_clamped() {
        let window = ReportWindow::rolling(period(2025, 8), u32::MAX);
        let periods = window.periods();
        assert_eq!(periods.len(), MAX_WINDOW_MONTHS as usize);
        assert_eq!(periods.last(), Some(&period(2025, 8)));
        assert_eq!(window.first(), period(1925, 9));
        assert!(window.contains(period(2000, 1)));
    }

    #[test]
    fn test_completeness_both_present() {
        let report = Completeness::check(
            period(2025, 8),
            vec![date(2025, 7, 31), date(2025, 8, 2), date(2025, 9, 1)],
        );
        assert!(report.is_complete());
        assert_eq!(report.warning(), None);
    }

    #[test]
    fn test_completeness_missing_next() {
        let report = Completeness::check(period(2025, 8), vec![date(2025, 7, 31)]);
        assert!(report.has_previous);
        assert!(!report.has_next);
        assert_eq!(
            report.warning().unwrap(),
            "No events found for next month (2025-09)"
        );
    }

    #[test]
    fn test_completeness_missing_both_across_year() {
        let report = Completeness::check(period(2025, 1), vec![date(2025, 1, 5)]);
        assert_eq!(
            report.warning().unwrap(),
            "No events found for previous month (2024-12) and next month (2025-02)"
        );
    }
}
