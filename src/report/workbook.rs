//! Excel rendering with `rust_xlsxwriter`.
//!
//! Workbooks are assembled fully in memory and serialized with
//! `save_to_buffer`; [`save`] then moves the bytes into place in one step.
//! A failed run therefore never leaves a truncated `.xlsx` behind.

use super::SummaryTable;
use crate::analysis::aggregate::CountMatrix;
use crate::events::types::{ParsedRecord, Period};
use crate::utils::output::write_atomically;
use crate::utils::time::format_date;
use anyhow::Result;
use rust_xlsxwriter::{
    ColNum, Format, FormatAlign, FormatBorder, Formula, RowNum, Table, TableColumn, TableFunction,
    TableStyle, Workbook, Worksheet, XlsxError,
};
use std::collections::HashMap;
use std::path::Path;

pub const TOTAL_SHEET: &str = "Total";
pub const FILTERED_SHEET: &str = "Filtered";
pub const DETAIL_SHEET: &str = "Detail";
pub const SUMMARY_SHEET: &str = "Summary";

/// First column header of the count sheets.
pub const ENTITY_HEADER: &str = "Device Name";
/// Leading Detail columns; enrichment columns follow.
pub const DETAIL_HEADERS: [&str; 3] = ["Date", "Protected Object", "attackIpsId"];
pub const SUMMARY_HEADERS: [&str; 2] = ["Date", "Number of Activations"];
pub const TOTAL_LABEL: &str = "Total";

/// Top-left cell of the Summary table, zero-based (B2).
pub const SUMMARY_ANCHOR: (RowNum, ColNum) = (1, 1);

/// Inclusive zero-based cell range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub first_row: RowNum,
    pub first_col: ColNum,
    pub last_row: RowNum,
    pub last_col: ColNum,
}

/// Range of the Summary table: header, data rows, total row.
///
/// An empty summary keeps one blank data row so the table stays valid.
pub fn summary_range(data_rows: usize) -> CellRange {
    let (row, col) = SUMMARY_ANCHOR;
    let data_rows = data_rows.max(1) as RowNum;
    CellRange {
        first_row: row,
        first_col: col,
        last_row: row + data_rows + 1,
        last_col: col + 1,
    }
}

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_text_wrap()
        .set_align(FormatAlign::Top)
        .set_background_color("#D7E4BC")
        .set_border(FormatBorder::Thin)
}

fn column_width(text_len: usize) -> f64 {
    (text_len + 2).max(12) as f64
}

/// Build the `Total` / `Filtered` count workbook.
///
/// Rows follow the matrices' raw-identifier order; the first cell shows the
/// display name from `names`, falling back to the identifier.
pub fn count_workbook(
    total: &CountMatrix,
    filtered: &CountMatrix,
    names: &HashMap<String, String>,
) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    let header = header_format();

    write_matrix_sheet(workbook.add_worksheet(), TOTAL_SHEET, total, names, &header)?;
    write_matrix_sheet(workbook.add_worksheet(), FILTERED_SHEET, filtered, names, &header)?;

    Ok(workbook)
}

fn write_matrix_sheet(
    sheet: &mut Worksheet,
    name: &str,
    matrix: &CountMatrix,
    names: &HashMap<String, String>,
    header: &Format,
) -> Result<(), XlsxError> {
    sheet.set_name(name)?;

    let mut titles = vec![ENTITY_HEADER.to_string()];
    titles.extend(matrix.periods().iter().map(Period::label));
    for (col, title) in titles.iter().enumerate() {
        let col = col as ColNum;
        sheet.write_string_with_format(0, col, title, header)?;
        sheet.set_column_width(col, column_width(title.len()))?;
    }

    let mut widest_label = ENTITY_HEADER.len();
    for (i, entity) in matrix.entities().enumerate() {
        let row = (i + 1) as RowNum;
        let label = names.get(entity).map(String::as_str).unwrap_or(entity);
        widest_label = widest_label.max(label.len());

        sheet.write_string(row, 0, label)?;
        for (j, count) in matrix.row(entity).unwrap_or_default().into_iter().enumerate() {
            sheet.write_number(row, (j + 1) as ColNum, count as f64)?;
        }
    }
    sheet.set_column_width(0, column_width(widest_label))?;

    Ok(())
}

/// Build the activation workbook: `Detail` (when there are records) and
/// `Summary`.
pub fn activation_workbook(
    records: &[ParsedRecord],
    enrichment_columns: &[String],
    summary: &SummaryTable,
) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();

    if !records.is_empty() {
        let header = header_format();
        write_detail_sheet(workbook.add_worksheet(), records, enrichment_columns, &header)?;
    }
    write_summary_sheet(workbook.add_worksheet(), summary)?;

    Ok(workbook)
}

fn write_detail_sheet(
    sheet: &mut Worksheet,
    records: &[ParsedRecord],
    enrichment_columns: &[String],
    header: &Format,
) -> Result<(), XlsxError> {
    sheet.set_name(DETAIL_SHEET)?;

    let titles = DETAIL_HEADERS
        .iter()
        .copied()
        .chain(enrichment_columns.iter().map(String::as_str));
    for (col, title) in titles.enumerate() {
        let col = col as ColNum;
        sheet.write_string_with_format(0, col, title, header)?;
        sheet.set_column_width(col, column_width(title.len()))?;
    }
    sheet.set_column_width(1, 24.0)?;

    let offset = DETAIL_HEADERS.len();
    for (i, record) in records.iter().enumerate() {
        let row = (i + 1) as RowNum;
        sheet.write_string(row, 0, format_date(record.date))?;
        sheet.write_string(row, 1, &record.entity_id)?;
        if let Some(key) = &record.join_key {
            sheet.write_string(row, 2, key)?;
        }

        for (j, column) in enrichment_columns.iter().enumerate() {
            let col = (offset + j) as ColNum;
            match record.field(column) {
                None | Some("") => {}
                Some(value) => match value.parse::<f64>() {
                    Ok(number) if number.is_finite() => {
                        sheet.write_number(row, col, number)?;
                    }
                    _ => {
                        sheet.write_string(row, col, value)?;
                    }
                },
            }
        }
    }

    Ok(())
}

fn write_summary_sheet(sheet: &mut Worksheet, summary: &SummaryTable) -> Result<(), XlsxError> {
    sheet.set_name(SUMMARY_SHEET)?;
    let range = summary_range(summary.len());

    for (i, row) in summary.rows().iter().enumerate() {
        let excel_row = range.first_row + 1 + i as RowNum;
        sheet.write_string(excel_row, range.first_col, &row.label)?;
        sheet.write_number(excel_row, range.first_col + 1, row.activation_count as f64)?;
    }

    // Excel recalculates the SUBTOTAL; the cached result is what viewers
    // without a calc engine show.
    let total = Formula::new(format!("SUBTOTAL(109,[{}])", SUMMARY_HEADERS[1]))
        .set_result(summary.total().to_string());
    let columns = vec![
        TableColumn::new()
            .set_header(SUMMARY_HEADERS[0])
            .set_total_label(TOTAL_LABEL),
        TableColumn::new()
            .set_header(SUMMARY_HEADERS[1])
            .set_total_function(TableFunction::Custom(total)),
    ];
    let table = Table::new()
        .set_style(TableStyle::Medium9)
        .set_banded_rows(true)
        .set_total_row(true)
        .set_columns(&columns);

    sheet.add_table(
        range.first_row,
        range.first_col,
        range.last_row,
        range.last_col,
        &table,
    )?;
    sheet.set_column_width(range.first_col, 14.0)?;
    sheet.set_column_width(range.last_col, 24.0)?;

    Ok(())
}

/// Serialize the workbook and write it to `path` in one step.
pub fn save(workbook: &mut Workbook, path: &Path) -> Result<()> {
    let bytes = workbook
        .save_to_buffer()
        .map_err(|e| anyhow::anyhow!("Failed to render workbook {}: {}", path.display(), e))?;
    write_atomically(path, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::SummaryRow;
    use calamine::{open_workbook_from_rs, Data, Range, Reader, Xlsx};
    use chrono::NaiveDate;
    use std::io::Cursor;

    #[test]
    fn test_summary_range_anchored_at_b2() {
        let range = summary_range(3);
        assert_eq!((range.first_row, range.first_col), (1, 1));
        // header + 3 data rows + total row
        assert_eq!(range.last_row, 5);
        assert_eq!(range.last_col, 2);
    }

    #[test]
    fn test_empty_summary_keeps_one_data_row() {
        let range = summary_range(0);
        assert_eq!(range.last_row, 3);
    }

    fn read_back(workbook: &mut Workbook) -> Xlsx<Cursor<Vec<u8>>> {
        let bytes = workbook.save_to_buffer().unwrap();
        open_workbook_from_rs(Cursor::new(bytes)).unwrap()
    }

    fn cell(range: &Range<Data>, row: u32, col: u32) -> String {
        range
            .get_value((row, col))
            .map(|value| value.to_string())
            .unwrap_or_default()
    }

    fn row(label: &str, count: u64) -> SummaryRow {
        SummaryRow {
            label: label.to_string(),
            activation_count: count,
        }
    }

    #[test]
    fn test_count_sheets_show_explicit_zeros() {
        let sep = Period::new(2025, 9).unwrap();
        let oct = Period::new(2025, 10).unwrap();
        let mut total = CountMatrix::new(vec![sep, oct]);
        total.increment("10.74.224.50", oct);
        total.increment("10.74.224.50", oct);
        total.increment("10.74.224.51", sep);
        total.zero_fill(["10.74.224.50", "10.74.224.51"]);
        let mut filtered = CountMatrix::new(vec![sep, oct]);
        filtered.increment("10.74.224.50", oct);
        filtered.zero_fill(["10.74.224.50", "10.74.224.51"]);

        let mut names = HashMap::new();
        names.insert("10.74.224.50".to_string(), "EU-Edge-1".to_string());

        let mut workbook = count_workbook(&total, &filtered, &names).unwrap();
        let mut xlsx = read_back(&mut workbook);
        assert_eq!(xlsx.sheet_names(), vec![TOTAL_SHEET, FILTERED_SHEET]);

        let sheet = xlsx.worksheet_range(TOTAL_SHEET).unwrap();
        assert_eq!(cell(&sheet, 0, 0), "Device Name");
        assert_eq!(cell(&sheet, 0, 1), "09_2025");
        assert_eq!(cell(&sheet, 0, 2), "10_2025");
        assert_eq!(cell(&sheet, 1, 0), "EU-Edge-1");
        assert_eq!(sheet.get_value((1, 1)), Some(&Data::Float(0.0)));
        assert_eq!(sheet.get_value((1, 2)), Some(&Data::Float(2.0)));
        assert_eq!(cell(&sheet, 2, 0), "10.74.224.51");
        assert_eq!(sheet.get_value((2, 2)), Some(&Data::Float(0.0)));

        let sheet = xlsx.worksheet_range(FILTERED_SHEET).unwrap();
        assert_eq!(sheet.get_value((2, 1)), Some(&Data::Float(0.0)));
        assert_eq!(sheet.get_value((2, 2)), Some(&Data::Float(0.0)));
    }

    #[test]
    fn test_summary_table_at_b2_with_recomputed_total() {
        let summary = SummaryTable::new(vec![
            row("2025-08-01", 3),
            row("2025-08-02", 5),
            row("2025-08-03", 2),
        ]);
        let mut workbook = activation_workbook(&[], &[], &summary).unwrap();
        let mut xlsx = read_back(&mut workbook);
        assert_eq!(xlsx.sheet_names(), vec![SUMMARY_SHEET]);

        let sheet = xlsx.worksheet_range(SUMMARY_SHEET).unwrap();
        assert_eq!(sheet.start(), Some((1, 1)));
        assert_eq!(cell(&sheet, 0, 0), "");
        assert_eq!(cell(&sheet, 1, 1), "Date");
        assert_eq!(cell(&sheet, 1, 2), "Number of Activations");
        assert_eq!(cell(&sheet, 2, 1), "2025-08-01");
        assert_eq!(cell(&sheet, 4, 2), "2");
        assert_eq!(cell(&sheet, 5, 1), "Total");
        assert_eq!(cell(&sheet, 5, 2), "10");
    }

    #[test]
    fn test_detail_columns_follow_fixed_then_enrichment_order() {
        let day = NaiveDate::from_ymd_opt(2025, 8, 2).unwrap();
        let plain = ParsedRecord::new(day, "EA-Store", "act");
        let mut enriched = ParsedRecord::new(day, "EA-Login-Prod", "act")
            .with_join_key(Some("12345-XYZ".to_string()));
        enriched.extra_fields.insert("packetCount".to_string(), "1000".to_string());
        enriched.extra_fields.insert("category".to_string(), "DoS".to_string());
        let records = vec![enriched, plain];

        let summary = SummaryTable::by_date(&records);
        let columns = vec!["packetCount".to_string(), "category".to_string()];
        let mut workbook = activation_workbook(&records, &columns, &summary).unwrap();
        let mut xlsx = read_back(&mut workbook);
        assert_eq!(xlsx.sheet_names(), vec![DETAIL_SHEET, SUMMARY_SHEET]);

        let sheet = xlsx.worksheet_range(DETAIL_SHEET).unwrap();
        let headers: Vec<String> = (0..5).map(|col| cell(&sheet, 0, col)).collect();
        assert_eq!(
            headers,
            vec!["Date", "Protected Object", "attackIpsId", "packetCount", "category"]
        );
        assert_eq!(cell(&sheet, 1, 0), "2025-08-02");
        assert_eq!(cell(&sheet, 1, 1), "EA-Login-Prod");
        assert_eq!(cell(&sheet, 1, 2), "12345-XYZ");
        assert_eq!(sheet.get_value((1, 3)), Some(&Data::Float(1000.0)));
        assert_eq!(cell(&sheet, 1, 4), "DoS");
        // unmatched record: enrichment cells stay blank
        assert_eq!(cell(&sheet, 2, 1), "EA-Store");
        assert_eq!(cell(&sheet, 2, 3), "");

        let totals = xlsx.worksheet_range(SUMMARY_SHEET).unwrap();
        assert_eq!(cell(&totals, 2, 1), "2025-08-02");
        assert_eq!(cell(&totals, 2, 2), "2");
        assert_eq!(cell(&totals, 3, 2), "2");
    }

    #[test]
    fn test_empty_activation_workbook_renders() {
        let mut workbook = activation_workbook(&[], &[], &SummaryTable::default()).unwrap();
        let mut xlsx = read_back(&mut workbook);
        assert_eq!(xlsx.sheet_names(), vec![SUMMARY_SHEET]);

        let sheet = xlsx.worksheet_range(SUMMARY_SHEET).unwrap();
        assert_eq!(cell(&sheet, 1, 1), "Date");
        assert_eq!(cell(&sheet, 3, 1), "Total");
        assert_eq!(cell(&sheet, 3, 2), "0");
    }
}
