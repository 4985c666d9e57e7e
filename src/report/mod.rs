//! Spreadsheet report model and rendering.
//!
//! Two reports exist:
//!
//! - the monthly attack count (`attacks_count_pd_mm_yyyy.xlsx`) with a
//!   `Total` and a `Filtered` sheet, entities × periods;
//! - the activation report (`activations_report_mm_yyyy.xlsx`) with a
//!   `Detail` sheet and a banded `Summary` table anchored at B2.
//!
//! The model types here are plain data; [`workbook`] turns them into
//! `rust_xlsxwriter` worksheets.

pub mod workbook;

use crate::events::types::{ParsedRecord, Period};
use crate::utils::time::format_date;
use std::collections::BTreeMap;

/// File name prefix of the monthly attack count report.
pub const COUNT_REPORT_PREFIX: &str = "attacks_count_pd";
/// File name prefix of the activation report.
pub const ACTIVATION_REPORT_PREFIX: &str = "activations_report";

/// `<prefix>_mm_yyyy.xlsx` for the reporting period.
pub fn report_file_name(prefix: &str, period: Period) -> String {
    format!("{}_{}.xlsx", prefix, period.label())
}

/// One line of the Summary table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub label: String,
    pub activation_count: u64,
}

/// Ordered Summary rows; the Total row is derived, never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryTable {
    rows: Vec<SummaryRow>,
}

impl SummaryTable {
    pub fn new(rows: Vec<SummaryRow>) -> Self {
        Self { rows }
    }

    /// Activations per calendar day, oldest first.
    pub fn by_date(records: &[ParsedRecord]) -> Self {
        let mut per_day: BTreeMap<_, u64> = BTreeMap::new();
        for record in records {
            *per_day.entry(record.date).or_insert(0) += 1;
        }

        Self::new(
            per_day
                .into_iter()
                .map(|(date, activation_count)| SummaryRow {
                    label: format_date(date),
                    activation_count,
                })
                .collect(),
        )
    }

    pub fn rows(&self) -> &[SummaryRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum over the rows as they will be rendered.
    pub fn total(&self) -> u64 {
        self.rows.iter().map(|row| row.activation_count).sum()
    }
}
