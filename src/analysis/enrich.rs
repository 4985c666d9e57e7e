//! Enrichment join between parsed log records and an attack CSV export.
//!
//! The join is a left join on the attack id: every detail record is kept,
//! matched ones gain the enrichment columns, unmatched ones gain nothing
//! and render blank. Keys compare exactly after [`normalize_join_key`].
//! When the CSV repeats a key, the first row in file order wins.

use crate::error::ReportError;
use crate::events::parser::{normalize_join_key, CsvTable};
use crate::events::types::ParsedRecord;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Join column of the enrichment export.
pub const JOIN_KEY_COLUMN: &str = "attackIpsId";

/// Columns pulled from the enrichment export, in output order.
pub const ENRICHMENT_COLUMNS: [&str; 5] = [
    "Attack Name",
    "packetCount",
    "category",
    "maxAttackPacketRatePps",
    "maxAttackRateBps",
];

/// Lookup from normalized attack id to enrichment values.
#[derive(Debug, Clone, Default)]
pub struct EnrichmentTable {
    columns: Vec<String>,
    missing: Vec<String>,
    rows: HashMap<String, Vec<String>>,
}

impl EnrichmentTable {
    /// Build the lookup from a loaded CSV.
    ///
    /// Fails with [`ReportError::EnrichmentUnavailable`] when the join column
    /// is absent. Other absent columns are recorded in
    /// [`missing_columns`](Self::missing_columns) and left out.
    pub fn from_csv(table: &CsvTable) -> Result<Self, ReportError> {
        if !table.has_column(JOIN_KEY_COLUMN) {
            return Err(ReportError::EnrichmentUnavailable(JOIN_KEY_COLUMN));
        }

        let (present, missing): (Vec<&str>, Vec<&str>) = ENRICHMENT_COLUMNS
            .iter()
            .copied()
            .partition(|column| table.has_column(column));

        let mut rows: HashMap<String, Vec<String>> = HashMap::with_capacity(table.len());
        for row in table.rows() {
            let Some(raw_key) = row.get(JOIN_KEY_COLUMN) else {
                continue;
            };
            let key = normalize_join_key(raw_key);
            if key.is_empty() || rows.contains_key(&key) {
                continue;
            }
            let values = present
                .iter()
                .map(|column| row.get(column).unwrap_or_default().to_string())
                .collect();
            rows.insert(key, values);
        }

        Ok(Self {
            columns: present.into_iter().map(str::to_string).collect(),
            missing: missing.into_iter().map(str::to_string).collect(),
            rows,
        })
    }

    /// Enrichment columns actually present, in canonical order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Expected enrichment columns the CSV did not have.
    pub fn missing_columns(&self) -> &[String] {
        &self.missing
    }

    pub fn lookup(&self, key: &str) -> Option<&[String]> {
        self.rows.get(key).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Left-join records against the table; returns how many matched.
pub fn join(records: &mut [ParsedRecord], table: &EnrichmentTable) -> usize {
    let mut matched = 0;
    for record in records.iter_mut() {
        let Some(values) = record.join_key.as_deref().and_then(|key| table.lookup(key)) else {
            continue;
        };
        for (column, value) in table.columns().iter().zip(values) {
            record.extra_fields.insert(column.clone(), value.clone());
        }
        matched += 1;
    }
    matched
}

/// Pick the enrichment CSV for a month.
///
/// Prefers the month-specific export `file_name`; otherwise falls back to
/// the lexicographically first `*.csv` in `input_dir`.
pub fn select_source(input_dir: &Path, file_name: &str) -> Option<PathBuf> {
    let specific = input_dir.join(file_name);
    if specific.is_file() {
        return Some(specific);
    }

    let mut candidates: Vec<PathBuf> = std::fs::read_dir(input_dir)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::TempDir;

    const CSV: &str = "\
ATTACKIPSID,attack name,PacketCount,Category,maxAttackPacketRatePps,maxAttackRateBps
12345-XYZ,SYN Flood,1000,DoS,50,4000
777,HTTP Flood,20,App,1,80
12345-XYZ,Duplicate,1,DoS,1,1
";

    fn detail(key: Option<&str>) -> ParsedRecord {
        ParsedRecord::new(NaiveDate::from_ymd_opt(2025, 8, 2).unwrap(), "EA-Login-Prod", "act")
            .with_join_key(key.map(str::to_string))
    }

    #[test]
    fn test_left_join_keeps_every_record() {
        let table = EnrichmentTable::from_csv(&CsvTable::from_reader(CSV.as_bytes()).unwrap()).unwrap();
        let mut records = vec![detail(Some("12345-XYZ")), detail(Some("nope")), detail(None)];

        assert_eq!(join(&mut records, &table), 1);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].field("packetCount"), Some("1000"));
        assert_eq!(records[0].field("Attack Name"), Some("SYN Flood"));
        assert!(records[1].extra_fields.is_empty());
        assert!(records[2].extra_fields.is_empty());
    }

    #[test]
    fn test_duplicate_keys_first_occurrence_wins() {
        let table = EnrichmentTable::from_csv(&CsvTable::from_reader(CSV.as_bytes()).unwrap()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup("12345-XYZ").unwrap()[0], "SYN Flood");
    }

    #[test]
    fn test_join_is_repeatable() {
        let csv = CsvTable::from_reader(CSV.as_bytes()).unwrap();
        let first = EnrichmentTable::from_csv(&csv).unwrap();
        let second = EnrichmentTable::from_csv(&csv).unwrap();
        let mut a = vec![detail(Some("777"))];
        let mut b = vec![detail(Some("777"))];
        join(&mut a, &first);
        join(&mut b, &second);
        assert_eq!(a, b);
    }

    #[test]
    fn test_missing_key_column_is_unavailable() {
        let csv = CsvTable::from_reader("Attack Name,category\nX,Y\n".as_bytes()).unwrap();
        let err = EnrichmentTable::from_csv(&csv).unwrap_err();
        assert!(matches!(err, ReportError::EnrichmentUnavailable("attackIpsId")));
    }

    #[test]
    fn test_partial_columns_are_reported() {
        let csv = CsvTable::from_reader("attackIpsId,category\n1.,DoS\n".as_bytes()).unwrap();
        let table = EnrichmentTable::from_csv(&csv).unwrap();
        assert_eq!(table.columns(), &["category"]);
        assert_eq!(table.missing_columns().len(), 4);
        // CSV keys get the same trailing-period normalization as log keys
        assert_eq!(table.lookup("1").unwrap(), &["DoS"]);
    }

    #[test]
    fn test_select_source_prefers_month_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a_other.csv"), "x\n").unwrap();
        fs::write(dir.path().join("database_EA_08_2025.csv"), "x\n").unwrap();

        let chosen = select_source(dir.path(), "database_EA_08_2025.csv").unwrap();
        assert!(chosen.ends_with("database_EA_08_2025.csv"));
    }

    #[test]
    fn test_select_source_falls_back_to_first_csv() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.csv"), "x\n").unwrap();
        fs::write(dir.path().join("a.CSV"), "x\n").unwrap();
        fs::write(dir.path().join("alert.txt"), "x\n").unwrap();

        let chosen = select_source(dir.path(), "database_EA_08_2025.csv").unwrap();
        assert!(chosen.ends_with("a.CSV"));
    }

    #[test]
    fn test_select_source_none() {
        let dir = TempDir::new().unwrap();
        assert!(select_source(dir.path(), "x.csv").is_none());
    }
}
