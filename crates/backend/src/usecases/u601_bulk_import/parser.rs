use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::NaiveDate;
use contracts::imports::FileKind;

use super::error::ImportError;

/// One spreadsheet cell, typed at the parse boundary. CSV cells are always
/// `Text`; xlsx cells keep their native numeric/date representation so the
/// normalizer can tell a serial date from a formatted string.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

/// A parsed upload: trimmed header row plus data rows of typed cells. Each
/// row keeps its 1-based position in the source file (header is row 1), so
/// error details point at the row the operator actually sees; blank rows
/// are skipped but still occupy their position.
#[derive(Debug)]
pub struct ParsedFile {
    pub kind: FileKind,
    pub headers: Vec<String>,
    pub rows: Vec<(usize, Vec<CellValue>)>,
}

/// Select the parser from the file extension.
pub fn sniff_kind(file_name: &str) -> Result<FileKind, ImportError> {
    let lower = file_name.to_lowercase();
    if lower.ends_with(".xlsx") || lower.ends_with(".xls") {
        Ok(FileKind::Spreadsheet)
    } else if lower.ends_with(".csv") {
        Ok(FileKind::Csv)
    } else {
        Err(ImportError::UnsupportedFile(file_name.to_string()))
    }
}

pub fn parse_bytes(file_name: &str, bytes: &[u8]) -> Result<ParsedFile, ImportError> {
    match sniff_kind(file_name)? {
        FileKind::Csv => parse_csv(bytes),
        FileKind::Spreadsheet => parse_spreadsheet(bytes),
    }
}

fn parse_csv(bytes: &[u8]) -> Result<ParsedFile, ImportError> {
    let text = String::from_utf8_lossy(bytes);
    // Strip UTF-8 BOM if present
    let text = text.trim_start_matches('\u{FEFF}');

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ImportError::Parse(format!("failed to read CSV headers: {}", e)))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record =
            result.map_err(|e| ImportError::Parse(format!("malformed CSV record: {}", e)))?;
        let row_number = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(rows.len() + 2);
        let cells: Vec<CellValue> = record
            .iter()
            .map(|v| {
                let v = v.trim();
                if v.is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(v.to_string())
                }
            })
            .collect();
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        rows.push((row_number, cells));
    }

    if rows.is_empty() {
        return Err(ImportError::EmptyFile);
    }

    Ok(ParsedFile {
        kind: FileKind::Csv,
        headers,
        rows,
    })
}

fn parse_spreadsheet(bytes: &[u8]) -> Result<ParsedFile, ImportError> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = open_workbook_auto_from_rs(cursor)
        .map_err(|e| ImportError::Parse(format!("failed to open workbook: {}", e)))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let first_sheet = sheet_names
        .first()
        .ok_or_else(|| ImportError::Parse("workbook has no sheets".to_string()))?
        .clone();

    let range = workbook
        .worksheet_range(&first_sheet)
        .map_err(|e| ImportError::Parse(format!("failed to read worksheet: {}", e)))?;

    let mut row_iter = range.rows();
    let header_row = row_iter
        .next()
        .ok_or(ImportError::EmptyFile)?;
    let headers: Vec<String> = header_row
        .iter()
        .map(|c| c.to_string().trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (offset, row) in row_iter.enumerate() {
        let cells: Vec<CellValue> = row.iter().map(convert_cell).collect();
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        rows.push((offset + 2, cells));
    }

    if rows.is_empty() {
        return Err(ImportError::EmptyFile);
    }

    Ok(ParsedFile {
        kind: FileKind::Spreadsheet,
        headers,
        rows,
    })
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                CellValue::Empty
            } else {
                CellValue::Text(s.to_string())
            }
        }
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        // Keep the raw serial value; the date normalizer owns the epoch math.
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        // ISO datetime cells carry the calendar date before the 'T'.
        Data::DateTimeIso(s) => {
            let date_part = s.split('T').next().unwrap_or(s.as_str());
            match NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
                Ok(d) => CellValue::Date(d),
                Err(_) => CellValue::Text(s.clone()),
            }
        }
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(_) => CellValue::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniff_selects_parser_by_extension() {
        assert_eq!(sniff_kind("Report.XLSX").unwrap(), FileKind::Spreadsheet);
        assert_eq!(sniff_kind("legacy.xls").unwrap(), FileKind::Spreadsheet);
        assert_eq!(sniff_kind("orders.csv").unwrap(), FileKind::Csv);
        assert!(matches!(
            sniff_kind("notes.txt"),
            Err(ImportError::UnsupportedFile(_))
        ));
    }

    #[test]
    fn csv_parse_strips_bom_and_trims_headers() {
        let bytes = "\u{FEFF}Order ID , Amount\nA-1,100\n".as_bytes();
        let parsed = parse_bytes("orders.csv", bytes).unwrap();
        assert_eq!(parsed.headers, vec!["Order ID", "Amount"]);
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].1[0], CellValue::Text("A-1".to_string()));
    }

    #[test]
    fn csv_skips_fully_blank_rows() {
        let bytes = b"Order ID,Amount\nA-1,100\n,,\nA-2,200\n";
        let parsed = parse_bytes("orders.csv", &bytes[..]).unwrap();
        assert_eq!(parsed.rows.len(), 2);
    }

    #[test]
    fn csv_without_data_rows_is_empty_file() {
        let bytes = b"Order ID,Amount\n";
        assert!(matches!(
            parse_bytes("orders.csv", &bytes[..]),
            Err(ImportError::EmptyFile)
        ));
    }

    #[test]
    fn blank_cells_become_empty() {
        let bytes = b"Order ID,Amount\nA-1,   \n";
        let parsed = parse_bytes("orders.csv", &bytes[..]).unwrap();
        assert!(parsed.rows[0].1[1].is_empty());
    }

    #[test]
    fn row_numbers_survive_blank_lines() {
        let bytes = b"Order ID,Amount\nA-1,100\n\nA-2,200\n,,\nA-3,300\n";
        let parsed = parse_bytes("orders.csv", &bytes[..]).unwrap();
        let numbers: Vec<usize> = parsed.rows.iter().map(|(n, _)| *n).collect();
        assert_eq!(numbers, vec![2, 4, 6]);
    }

    #[test]
    fn iso_datetime_cells_become_dates() {
        assert_eq!(
            convert_cell(&Data::DateTimeIso("2021-03-05T14:30:00".to_string())),
            CellValue::Date(NaiveDate::from_ymd_opt(2021, 3, 5).unwrap())
        );
        assert_eq!(
            convert_cell(&Data::DateTimeIso("not a date".to_string())),
            CellValue::Text("not a date".to_string())
        );
    }

    #[test]
    fn cell_text_rendering() {
        assert_eq!(CellValue::Number(150.0).as_text(), "150");
        assert_eq!(CellValue::Number(1.5).as_text(), "1.5");
        assert_eq!(
            CellValue::Date(NaiveDate::from_ymd_opt(2021, 3, 5).unwrap()).as_text(),
            "2021-03-05"
        );
    }
}
