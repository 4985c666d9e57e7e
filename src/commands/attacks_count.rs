//! Monthly attack count report.
//!
//! Counts attacks per device over the last completed months and writes
//! `attacks_count_pd_mm_yyyy.xlsx` with two sheets:
//!
//! - `Total`: every attack row, per device and month;
//! - `Filtered`: the same, minus rows whose attack name is listed in
//!   `filters.excluded_attack_names`.
//!
//! # Usage
//!
//! ```bash
//! # Window ends at the month before general.cur_month
//! attack-report attacks-count
//!
//! # Explicit run month and a 12 month window
//! attack-report attacks-count --month 11-2025 --months 12
//! ```
//!
//! # Input
//!
//! One CSV export per month in the input directory, named
//! `<csv_file_prefix><mm>_<yyyy><csv_file_suffix>` (for example
//! `database_EA_10_2025.csv`). Missing months are reported and rendered as
//! zero columns; the run only fails when no month at all could be read.
//!
//! Devices are shown under their display name from the name mapping file.
//! Devices seen for the first time are added to that file mapped to
//! themselves, ready for editing.

use crate::analysis::aggregate::{Aggregation, Aggregator};
use crate::analysis::names::{NameResolver, NameStore};
use crate::analysis::window::{ReportWindow, MAX_WINDOW_MONTHS};
use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::events::parser::{parse_attack_rows, CsvTable, ATTACK_NAME_COLUMN, DEVICE_NAME_COLUMN};
use crate::report::workbook::{count_workbook, save};
use crate::report::{report_file_name, COUNT_REPORT_PREFIX};
use crate::utils::format::format_number;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::PathBuf;

const SAMPLE_DEVICES: usize = 5;

/// Window of completed months for a run in `config`'s current month.
pub fn report_window(config: &ReportConfig) -> Result<ReportWindow, ReportError> {
    let run_month = config.current_month()?;
    if config.general.window_months > MAX_WINDOW_MONTHS {
        warn!(
            "Window of {} months is too long; using {}",
            config.general.window_months, MAX_WINDOW_MONTHS
        );
    }
    Ok(ReportWindow::rolling(
        run_month.previous(),
        config.general.window_months,
    ))
}

/// Read the monthly exports and fold them into count matrices.
///
/// Returns the aggregation and how many monthly files were read.
pub fn collect(
    config: &ReportConfig,
    window: &ReportWindow,
    excluded: &[String],
) -> Result<(Aggregation, usize)> {
    let input_dir = &config.general.input_dir;
    let mut aggregator = Aggregator::new(window, excluded);
    let mut files_read = 0;

    for period in window.periods() {
        let name = config.monthly_csv_name(period);
        let path = input_dir.join(&name);
        if !path.is_file() {
            warn!("CSV file not found: {}", name);
            continue;
        }

        let table = match CsvTable::from_path(&path) {
            Ok(table) => table,
            Err(e) => {
                warn!("Failed to read {}: {:#}", name, e);
                continue;
            }
        };
        files_read += 1;
        info!("Loaded: {} ({} rows)", name, format_number(table.len() as u64));

        if !table.has_column(DEVICE_NAME_COLUMN) {
            warn!("'{}' column not found in {}", DEVICE_NAME_COLUMN, name);
        } else if !table.has_column(ATTACK_NAME_COLUMN) {
            warn!(
                "'{}' column not found in {}; filtered counts equal totals",
                ATTACK_NAME_COLUMN, name
            );
        }

        let records = parse_attack_rows(&table, period);
        debug!("{}: {} records for {}", name, records.len(), period);
        aggregator.extend(&records);
    }

    Ok((aggregator.finish(), files_read))
}

/// Build the monthly attack count workbook; returns the written path.
pub fn run(config: &ReportConfig) -> Result<PathBuf> {
    let window = report_window(config)?;
    let periods = window.periods();
    let excluded = config.excluded_attack_names();
    info!(
        "Processing {} months: {} to {}",
        periods.len(),
        window.first(),
        window.last()
    );

    let (aggregation, files_read) = collect(config, &window, &excluded)?;
    if files_read == 0 {
        return Err(ReportError::NoUsableInput(format!(
            "no monthly CSV files found in {} for {} to {}",
            config.general.input_dir.display(),
            window.first(),
            window.last()
        ))
        .into());
    }

    let mut store = NameStore::load(&config.general.device_names)?;
    let names: HashMap<String, String> = {
        let mut resolver = NameResolver::new(&mut store);
        aggregation
            .total
            .entities()
            .map(|raw| (raw.to_string(), resolver.resolve(raw)))
            .collect()
    };

    info!("Summary:");
    info!("  Devices found: {}", aggregation.total.len());
    info!(
        "  Months processed: {}/{}",
        aggregation.populated_periods().len(),
        periods.len()
    );
    info!(
        "  Attacks counted: {} total, {} after filtering",
        format_number(aggregation.total.total()),
        format_number(aggregation.filtered.total())
    );
    if excluded.is_empty() {
        info!("  Excluded attack names: none");
    } else {
        info!("  Excluded attack names: {}", excluded.join(", "));
    }
    let sample: Vec<&str> = aggregation.total.entities().take(SAMPLE_DEVICES).collect();
    if !sample.is_empty() {
        info!("  Sample devices: {}", sample.join(", "));
    }
    if aggregation.out_of_window > 0 {
        debug!("{} records fell outside the window", aggregation.out_of_window);
    }

    let output = config
        .general
        .output_dir
        .join(report_file_name(COUNT_REPORT_PREFIX, window.last()));
    let mut workbook = count_workbook(&aggregation.total, &aggregation.filtered, &names)
        .map_err(|e| anyhow::anyhow!("Failed to build attack count workbook: {}", e))?;
    save(&mut workbook, &output)?;

    let new_devices: Vec<String> = store.discovered().map(str::to_string).collect();
    if store
        .save()
        .with_context(|| format!("Failed to update {}", store.path().display()))?
    {
        info!(
            "Found new devices, added to {}: {}",
            store.path().display(),
            new_devices.join(", ")
        );
        info!("Edit {} to customize device names", store.path().display());
    }

    println!("Excel report saved to: {}", output.display());
    Ok(output)
}
