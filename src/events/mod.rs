//! Security event parsing.
//!
//! This module turns raw inputs into [`ParsedRecord`](types::ParsedRecord)s:
//!
//! - [`types`] - Record and period types shared by every later stage
//! - [`parser`] - Alert-log line parsing, marker extraction and CSV loading
//!
//! Input that does not satisfy the required patterns simply produces no
//! record; nothing in here fails on malformed data.

pub mod parser;
pub mod types;
