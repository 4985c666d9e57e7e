//! # Attack Report Tools
//!
//! Command-line tools that turn DDoS appliance exports into monthly Excel
//! reports.
//!
//! ## Overview
//!
//! Two inputs feed the reports:
//!
//! - monthly CSV exports of mitigated attacks, one row per attack, with at
//!   least a `Device Name` and an `Attack Name` column;
//! - a free-text alert log whose activation lines name the protected object
//!   and the attack id.
//!
//! Everything is read into memory, aggregated and rendered in a single
//! pass. Workbooks are built in memory and written in one step, so a failed
//! run leaves no partial output.
//!
//! ## Reports
//!
//! - `attacks-count` - attacks per device and month over the last completed
//!   months, as `Total` and `Filtered` sheets
//!   (`attacks_count_pd_mm_yyyy.xlsx`)
//! - `activations` - activation lines of one month, enriched from the attack
//!   export, as a `Detail` sheet and a banded `Summary` table
//!   (`activations_report_mm_yyyy.xlsx`)
//!
//! ## Architecture
//!
//! - [`events`] - Parsed record types and the log/CSV parsers
//! - [`analysis`] - Reporting windows, aggregation, enrichment join and the
//!   device name mapping
//! - [`report`] - Workbook model and `rust_xlsxwriter` rendering
//! - [`commands`] - The report pipelines behind each subcommand
//! - [`config`] - TOML configuration
//! - [`error`] - Typed errors for fatal and recoverable conditions
//! - [`utils`] - Input reading, month parsing, progress and output helpers
//!
//! ## Example Usage
//!
//! ```bash
//! # Uses ./report.toml
//! attack-report attacks-count
//! attack-report activations --month 08-2025
//!
//! # Compressed logs work directly
//! attack-report activations --log alert.txt.gz
//!
//! # More detail on stderr
//! attack-report -v attacks-count --months 12
//! ```
//!
//! ## Installation
//!
//! ```bash
//! cargo install --path .
//! ```

pub mod analysis;
pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod report;
pub mod utils;
