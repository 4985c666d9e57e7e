//! Utility functions and helpers.
//!
//! This module provides common functionality used across commands:
//!
//! - [`progress`] - Progress bar shown while scanning log lines
//! - [`time`] - Month and leading-date parsing helpers
//! - [`reader`] - File reader with automatic decompression
//! - [`format`] - Human-readable number formatting for console summaries
//! - [`output`] - All-or-nothing file writes
//!
//! # Examples
//!
//! ## Parsing a month argument
//!
//! ```
//! use attack_report_tools::utils::time::parse_month;
//!
//! let period = parse_month("08-2025").unwrap();
//! assert_eq!(period.label(), "08_2025");
//! ```
//!
//! ## Reading a compressed alert log
//!
//! ```no_run
//! use attack_report_tools::utils::reader::read_lines;
//!
//! // Handles .gz, .zst and plain text alike
//! let lines = read_lines("input/alert.txt.gz").unwrap();
//! println!("{} lines", lines.len());
//! ```

pub mod format;
pub mod output;
pub mod progress;
pub mod reader;
pub mod time;
