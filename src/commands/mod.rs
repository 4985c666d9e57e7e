//! Report commands.
//!
//! Each module implements one subcommand and exposes a `run` function that
//! takes the loaded [`ReportConfig`](crate::config::ReportConfig), writes
//! its workbook and returns the output path.
//!
//! - [`attacks_count`] - Attacks per device over the last completed months
//!   (`Total` and `Filtered` sheets)
//! - [`activations`] - Alert-log activations for one month, enriched from
//!   the attack export (`Detail` and `Summary` sheets)

pub mod activations;
pub mod attacks_count;
