//! Record parsing for alert-log lines and CSV exports.
//!
//! # Alert-log lines
//!
//! A line is a record when all of the following hold:
//!
//! 1. it opens with a `YYYY-MM-DD` date,
//! 2. it contains the configured activation text (exact, case-sensitive),
//! 3. the `protected object` marker yields a value terminated by `.`.
//!
//! The `Attack Id` marker is optional and case-sensitive. Its value is the
//! run of identifier characters after it, which may contain periods itself;
//! only the final period is removed to form the record's join key.
//!
//! ```
//! use attack_report_tools::events::parser::LogLineParser;
//!
//! let parser = LogLineParser::new("triggered up operation SmartTapDivert-EU1");
//! let line = "2025-08-02 03:14:07 UTC triggered up operation SmartTapDivert-EU1 \
//!             protected object EA-Login-Prod. Attack Id 12345-XYZ.";
//! let record = parser.parse(line).unwrap();
//! assert_eq!(record.entity_id, "EA-Login-Prod");
//! assert_eq!(record.join_key.as_deref(), Some("12345-XYZ"));
//! ```
//!
//! # CSV exports
//!
//! [`CsvTable`] lower-cases and trims every header once at load time, so
//! every later lookup is a plain map access regardless of how the export
//! capitalised its columns.

use super::types::{ParsedRecord, Period};
use crate::utils::reader::open_file;
use crate::utils::time::parse_leading_date;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Entity column of the monthly attack exports.
pub const DEVICE_NAME_COLUMN: &str = "Device Name";
/// Event label column of the monthly attack exports.
pub const ATTACK_NAME_COLUMN: &str = "Attack Name";

/// How a field's value ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    /// Everything up to the terminator, trimmed.
    UntilTerminator(char),
    /// A run of identifier characters (`A-Za-z0-9._:-`) that must end in
    /// `.`; the period is part of the capture.
    Identifier,
}

/// A field announced by a literal marker.
///
/// The marker's first occurrence wins and must be followed by whitespace.
/// If the value is not properly terminated, the field is absent.
#[derive(Debug, Clone, Copy)]
pub struct FieldPattern {
    marker: &'static str,
    ignore_case: bool,
    capture: Capture,
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ':' | '-')
}

impl FieldPattern {
    /// Marker matched ASCII case-insensitively, value closed by `terminator`.
    pub const fn until(marker: &'static str, terminator: char) -> Self {
        Self {
            marker,
            ignore_case: true,
            capture: Capture::UntilTerminator(terminator),
        }
    }

    /// Marker matched exactly, value an identifier run ending in `.`.
    pub const fn identifier(marker: &'static str) -> Self {
        Self {
            marker,
            ignore_case: false,
            capture: Capture::Identifier,
        }
    }

    fn value_start(&self, line: &str) -> Option<usize> {
        let found = if self.ignore_case {
            // ASCII lowering keeps byte offsets, so positions carry over to `line`
            line.to_ascii_lowercase()
                .find(&self.marker.to_ascii_lowercase())?
        } else {
            line.find(self.marker)?
        };
        Some(found + self.marker.len())
    }

    /// Capture the field's value.
    pub fn extract<'a>(&self, line: &'a str) -> Option<&'a str> {
        let rest = &line[self.value_start(line)?..];
        let value = rest.trim_start();
        if value.len() == rest.len() {
            return None;
        }

        match self.capture {
            Capture::UntilTerminator(terminator) => {
                let end = value.find(terminator)?;
                let value = value[..end].trim();
                (!value.is_empty()).then_some(value)
            }
            Capture::Identifier => {
                let end = value
                    .find(|c: char| !is_identifier_char(c))
                    .unwrap_or(value.len());
                let run = &value[..end];
                (run.len() > 1 && run.ends_with('.')).then_some(run)
            }
        }
    }
}

/// `protected object <name>.`
pub const PROTECTED_OBJECT: FieldPattern = FieldPattern::until("protected object", '.');
/// `Attack Id <id>.`, captured with its final period.
pub const ATTACK_ID: FieldPattern = FieldPattern::identifier("Attack Id");

/// Normalize a join key: trim it and drop one trailing period.
///
/// ```
/// use attack_report_tools::events::parser::normalize_join_key;
///
/// assert_eq!(normalize_join_key("12345-XYZ."), "12345-XYZ");
/// ```
pub fn normalize_join_key(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed.strip_suffix('.').unwrap_or(trimmed).trim_end().to_string()
}

/// Parser for activation lines of a Vision/DFC alert log.
#[derive(Debug, Clone)]
pub struct LogLineParser {
    activation: String,
}

impl LogLineParser {
    pub fn new(activation: impl Into<String>) -> Self {
        Self {
            activation: activation.into(),
        }
    }

    pub fn activation(&self) -> &str {
        &self.activation
    }

    /// Parse one line, or `None` when it is not an activation record.
    pub fn parse(&self, line: &str) -> Option<ParsedRecord> {
        let date = parse_leading_date(line)?;
        if self.activation.is_empty() || !line.contains(&self.activation) {
            return None;
        }

        let protected_object = PROTECTED_OBJECT.extract(line)?;
        let join_key = ATTACK_ID
            .extract(line)
            .map(normalize_join_key)
            .filter(|key| !key.is_empty());

        Some(
            ParsedRecord::new(date, protected_object, self.activation.as_str())
                .with_join_key(join_key),
        )
    }
}

/// Lower-case, trimmed header key.
pub fn normalize_header(name: &str) -> String {
    name.trim().trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// An in-memory CSV export with normalized headers.
#[derive(Debug, Clone, Default)]
pub struct CsvTable {
    headers: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<csv::StringRecord>,
}

impl CsvTable {
    /// Load a CSV file from disk; `.gz` and `.zst` exports are decompressed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = open_file(path)?;
        Self::from_reader(file).with_context(|| format!("Failed to read CSV: {}", path.display()))
    }

    /// Load CSV data from any reader. Ragged rows and invalid UTF-8 are
    /// tolerated.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .byte_headers()
            .context("Failed to read CSV header")?
            .iter()
            .map(|field| normalize_header(&String::from_utf8_lossy(field)))
            .collect();

        let mut index = HashMap::with_capacity(headers.len());
        for (i, header) in headers.iter().enumerate() {
            // duplicated headers: the leftmost column wins
            index.entry(header.clone()).or_insert(i);
        }

        // exports are not always UTF-8; bad bytes are replaced per cell
        let mut rows = Vec::new();
        for record in reader.byte_records() {
            let record = record.context("Failed to read CSV records")?;
            let cells: Vec<String> = record
                .iter()
                .map(|field| String::from_utf8_lossy(field).into_owned())
                .collect();
            rows.push(csv::StringRecord::from(cells));
        }

        Ok(Self {
            headers,
            index,
            rows,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Position of a column, matched case-insensitively.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.index.get(&normalize_header(name)).copied()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = CsvRow<'_>> {
        self.rows.iter().map(move |record| CsvRow {
            table: self,
            record,
        })
    }
}

/// A borrowed row of a [`CsvTable`].
#[derive(Debug, Clone, Copy)]
pub struct CsvRow<'a> {
    table: &'a CsvTable,
    record: &'a csv::StringRecord,
}

impl<'a> CsvRow<'a> {
    /// Trimmed cell value; `None` for missing columns and empty cells.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let idx = self.table.column(column)?;
        self.record
            .get(idx)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

/// Convert a monthly attack export into records dated on the first day of
/// `period`.
///
/// Rows without a device name are skipped. A table without the device
/// column yields nothing; without the attack-name column every row gets an
/// empty label, so none of them can match an exclusion.
pub fn parse_attack_rows(table: &CsvTable, period: Period) -> Vec<ParsedRecord> {
    if !table.has_column(DEVICE_NAME_COLUMN) {
        return Vec::new();
    }

    let date = period.first_day();
    table
        .rows()
        .filter_map(|row| {
            let device = row.get(DEVICE_NAME_COLUMN)?;
            let attack = row.get(ATTACK_NAME_COLUMN).unwrap_or_default();
            Some(ParsedRecord::new(date, device, attack))
        })
        .collect()
}
