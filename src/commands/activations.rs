//! Activation report for a single month.
//!
//! Scans the alert log for lines announcing the configured activation,
//! joins them with the month's attack export on the attack id and writes
//! `activations_report_mm_yyyy.xlsx`:
//!
//! - `Detail`: one row per activation (date, protected object, attack id,
//!   then whichever enrichment columns the export provides);
//! - `Summary`: activations per day as a banded table at B2 with a total
//!   row.
//!
//! # Usage
//!
//! ```bash
//! attack-report activations --month 08-2025
//! attack-report activations --log /var/log/dfc/alert.txt.gz \
//!     --activation "triggered up operation SmartTapDivert-EU1"
//! ```
//!
//! The log must exist; the enrichment export is optional. When the log has
//! no lines at all for the month before or after the report month, a
//! warning is printed since the export was likely cut short.

use crate::analysis::enrich::{self, select_source, EnrichmentTable};
use crate::analysis::window::{Completeness, ReportWindow};
use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::events::parser::{CsvTable, LogLineParser};
use crate::events::types::{ParsedRecord, Period};
use crate::report::workbook::{activation_workbook, save};
use crate::report::{report_file_name, SummaryTable, ACTIVATION_REPORT_PREFIX};
use crate::utils::format::format_number;
use crate::utils::progress::ProgressBar;
use crate::utils::reader::read_lines;
use crate::utils::time::parse_leading_date;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::path::PathBuf;

/// Activation records of `period` plus the neighbour-month check.
#[derive(Debug)]
pub struct LogScan {
    pub records: Vec<ParsedRecord>,
    pub completeness: Completeness,
    pub lines: usize,
}

/// Parse log lines, keeping activation records dated in `period`.
pub fn scan_lines(lines: &[String], parser: &LogLineParser, period: Period) -> LogScan {
    let window = ReportWindow::single(period);
    let progress = ProgressBar::new(lines.len(), "Parsing alert log");
    let mut records = Vec::new();
    let mut dates = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        progress.update(i);
        let Some(date) = parse_leading_date(line) else {
            continue;
        };
        dates.push(date);

        if let Some(record) = parser.parse(line) {
            if window.contains_date(record.date) {
                records.push(record);
            }
        }
    }
    progress.finish_with_message("Parsed alert log");

    LogScan {
        records,
        completeness: Completeness::check(period, dates),
        lines: lines.len(),
    }
}

/// Load the enrichment export for `period`, if one is usable.
///
/// Every failure here degrades to "no enrichment" with a log message.
pub fn load_enrichment(config: &ReportConfig, period: Period) -> Option<EnrichmentTable> {
    let input_dir = &config.general.input_dir;
    let Some(path) = select_source(input_dir, &config.monthly_csv_name(period)) else {
        info!(
            "No CSV found in {}; detail rows are not enriched",
            input_dir.display()
        );
        return None;
    };

    let table = match CsvTable::from_path(&path) {
        Ok(table) => table,
        Err(e) => {
            warn!("Failed to read {}: {:#}", path.display(), e);
            return None;
        }
    };

    match EnrichmentTable::from_csv(&table) {
        Ok(enrichment) => {
            if !enrichment.missing_columns().is_empty() {
                warn!(
                    "{} is missing columns: {}",
                    path.display(),
                    enrichment.missing_columns().join(", ")
                );
            }
            info!(
                "Loaded enrichment: {} ({} attack ids)",
                path.display(),
                format_number(enrichment.len() as u64)
            );
            Some(enrichment)
        }
        Err(e) => {
            warn!("{}: {}", path.display(), e);
            None
        }
    }
}

/// Build the activation workbook; returns the written path.
pub fn run(config: &ReportConfig) -> Result<PathBuf> {
    let period = config.current_month()?;
    let parser = LogLineParser::new(config.activation()?);
    let log_path = config.alert_log_path();

    if !log_path.is_file() {
        return Err(ReportError::NoUsableInput(format!(
            "alert log not found: {}",
            log_path.display()
        ))
        .into());
    }
    let lines = read_lines(&log_path)
        .with_context(|| format!("Failed to read alert log {}", log_path.display()))?;
    info!(
        "Loaded: {} ({} lines)",
        log_path.display(),
        format_number(lines.len() as u64)
    );

    let mut scan = scan_lines(&lines, &parser, period);
    info!(
        "Found {} activations in {} for {}",
        format_number(scan.records.len() as u64),
        log_path.display(),
        period
    );
    if let Some(warning) = scan.completeness.warning() {
        warn!("{}", warning);
    }

    let columns = match load_enrichment(config, period) {
        Some(table) => {
            let matched = enrich::join(&mut scan.records, &table);
            debug!("{} of {} activations enriched", matched, scan.records.len());
            table.columns().to_vec()
        }
        None => Vec::new(),
    };

    let summary = SummaryTable::by_date(&scan.records);
    let output = config
        .general
        .output_dir
        .join(report_file_name(ACTIVATION_REPORT_PREFIX, period));
    let mut workbook = activation_workbook(&scan.records, &columns, &summary)
        .map_err(|e| anyhow::anyhow!("Failed to build activation workbook: {}", e))?;
    save(&mut workbook, &output)?;

    println!("Excel report saved to: {}", output.display());
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACTIVATION: &str = "triggered up operation SmartTapDivert-EU1";

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|line| line.to_string()).collect()
    }

    #[test]
    fn test_scan_keeps_only_report_month() {
        let input = lines(&[
            "2025-07-31 23:59:00 UTC triggered up operation SmartTapDivert-EU1 protected object A. Attack Id 1.",
            "2025-08-02 03:14:07 UTC triggered up operation SmartTapDivert-EU1 protected object B. Attack Id 2.",
            "2025-08-03 03:14:07 UTC unrelated line",
            "not a dated line",
            "2025-09-01 00:00:01 UTC heartbeat",
        ]);
        let scan = scan_lines(
            &input,
            &LogLineParser::new(ACTIVATION),
            Period::new(2025, 8).unwrap(),
        );

        assert_eq!(scan.lines, 5);
        assert_eq!(scan.records.len(), 1);
        assert_eq!(scan.records[0].entity_id, "B");
        assert!(scan.completeness.is_complete());
    }

    #[test]
    fn test_scan_reports_missing_neighbours() {
        let input = lines(&[
            "2025-08-02 03:14:07 UTC triggered up operation SmartTapDivert-EU1 protected object B. Attack Id 2.",
        ]);
        let scan = scan_lines(
            &input,
            &LogLineParser::new(ACTIVATION),
            Period::new(2025, 8).unwrap(),
        );
        assert!(!scan.completeness.has_previous);
        assert!(!scan.completeness.has_next);
        assert!(scan.completeness.warning().is_some());
    }
}
