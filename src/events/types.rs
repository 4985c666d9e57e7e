//! Data structures shared by the parsing, aggregation and rendering stages.

use crate::error::ReportError;
use crate::utils::time::parse_month;
use chrono::{Datelike, Months, NaiveDate};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A calendar month: the unit of aggregation and of output columns.
///
/// Field order makes the derived `Ord` chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// Build a period, rejecting months outside `1..=12`.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// The period a date falls in.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        // month is validated on construction, day 1 always exists
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    /// Step by whole calendar months (negative steps go back in time).
    pub fn shift(&self, months: i32) -> Self {
        let index = self.year * 12 + self.month as i32 - 1 + months;
        Self {
            year: index.div_euclid(12),
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    pub fn previous(&self) -> Self {
        self.shift(-1)
    }

    pub fn next(&self) -> Self {
        self.shift(1)
    }

    /// Last day of the month, used for range checks.
    pub fn last_day(&self) -> NaiveDate {
        self.first_day()
            .checked_add_months(Months::new(1))
            .and_then(|d| d.pred_opt())
            .unwrap_or_else(|| self.first_day())
    }

    /// `mm_yyyy`, the token used in file names and column headers.
    pub fn label(&self) -> String {
        format!("{:02}_{}", self.month, self.year)
    }
}

/// Displays as `YYYY-MM`, the prefix log lines of this month start with.
impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_month(s)
    }
}

/// One structured record produced from a log line or a CSV row.
///
/// # Fields
///
/// - `date`: calendar date of the event (for monthly CSV rows, the first
///   day of the file's month)
/// - `entity_id`: device address or protected object the record counts for
/// - `event_label`: attack name for CSV rows, the activation text for log lines
/// - `join_key`: attack id used to correlate with the enrichment CSV
/// - `extra_fields`: enrichment values keyed by canonical column name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRecord {
    pub date: NaiveDate,
    pub entity_id: String,
    pub event_label: String,
    pub join_key: Option<String>,
    pub extra_fields: BTreeMap<String, String>,
}

impl ParsedRecord {
    pub fn new(date: NaiveDate, entity_id: impl Into<String>, event_label: impl Into<String>) -> Self {
        Self {
            date,
            entity_id: entity_id.into(),
            event_label: event_label.into(),
            join_key: None,
            extra_fields: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_join_key(mut self, key: Option<String>) -> Self {
        self.join_key = key;
        self
    }

    pub fn period(&self) -> Period {
        Period::of(self.date)
    }

    /// Enrichment value for a column, if the join supplied one.
    pub fn field(&self, column: &str) -> Option<&str> {
        self.extra_fields.get(column).map(String::as_str)
    }
}
