use crate::error::{PortalError, Result};
use calamine::{DataType, Reader, Xlsx};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;

/// A cell as read from the source file, before any interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Empty,
    Text(String),
    Number(f64),
}

impl RawValue {
    /// Trimmed text rendering. Whole numbers render without a fraction so a
    /// numeric roll number `101` reads back as "101".
    pub fn as_text(&self) -> String {
        match self {
            RawValue::Empty => String::new(),
            RawValue::Text(s) => s.trim().to_string(),
            RawValue::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            RawValue::Empty => true,
            RawValue::Text(s) => s.trim().is_empty(),
            RawValue::Number(_) => false,
        }
    }
}

pub type RawRow = HashMap<String, RawValue>;

#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Xlsx,
}

impl SourceFormat {
    pub fn from_filename(filename: &str) -> Result<Self> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(SourceFormat::Csv),
            "xlsx" => Ok(SourceFormat::Xlsx),
            _ => Err(PortalError::UnsupportedFormat(filename.to_string())),
        }
    }
}

pub fn load_table(filename: &str, bytes: &[u8]) -> Result<RawTable> {
    match SourceFormat::from_filename(filename)? {
        SourceFormat::Csv => read_csv(bytes),
        SourceFormat::Xlsx => read_xlsx(bytes),
    }
}

fn read_csv(bytes: &[u8]) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let cells = headers.iter().enumerate().map(|(idx, _)| {
            match record.get(idx) {
                Some(v) if !v.is_empty() => RawValue::Text(v.to_string()),
                _ => RawValue::Empty,
            }
        });
        push_row(&mut rows, &headers, cells.collect());
    }
    Ok(RawTable { headers, rows })
}

fn read_xlsx(bytes: &[u8]) -> Result<RawTable> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| PortalError::Spreadsheet("workbook has no worksheets".to_string()))??;

    let mut iter = range.rows();
    let headers: Vec<String> = match iter.next() {
        Some(first) => first
            .iter()
            .enumerate()
            .map(|(idx, cell)| match cell_value(cell) {
                RawValue::Empty => format!("Unnamed: {idx}"),
                v => v.as_text(),
            })
            .collect(),
        None => return Ok(RawTable::default()),
    };

    let mut rows = Vec::new();
    for row in iter {
        let cells = (0..headers.len())
            .map(|idx| row.get(idx).map(cell_value).unwrap_or(RawValue::Empty))
            .collect();
        push_row(&mut rows, &headers, cells);
    }
    Ok(RawTable { headers, rows })
}

fn cell_value(cell: &DataType) -> RawValue {
    match cell {
        DataType::Empty => RawValue::Empty,
        DataType::String(s) if s.trim().is_empty() => RawValue::Empty,
        DataType::String(s) => RawValue::Text(s.clone()),
        DataType::Float(f) => RawValue::Number(*f),
        DataType::Int(i) => RawValue::Number(*i as f64),
        DataType::Error(_) => RawValue::Empty,
        other => RawValue::Text(other.to_string()),
    }
}

fn push_row(rows: &mut Vec<RawRow>, headers: &[String], cells: Vec<RawValue>) {
    if cells.iter().all(RawValue::is_blank) {
        return;
    }
    rows.push(headers.iter().cloned().zip(cells).collect());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_dispatch_is_case_insensitive() {
        assert_eq!(
            SourceFormat::from_filename("Roster.CSV").expect("csv"),
            SourceFormat::Csv
        );
        assert_eq!(
            SourceFormat::from_filename("marks.xlsx").expect("xlsx"),
            SourceFormat::Xlsx
        );
    }

    #[test]
    fn other_extensions_are_unsupported() {
        for name in ["marks.xls", "marks.txt", "marks"] {
            let err = load_table(name, b"roll\nR1\n").expect_err("unsupported");
            assert!(matches!(err, PortalError::UnsupportedFormat(_)), "{name}");
        }
    }

    #[test]
    fn csv_rows_keep_raw_text_and_tolerate_ragged_lines() {
        let data = "\u{feff}Roll,Name,Sem\nR1,Alice,3.0\nR2,Bob\n,,\n";
        let table = load_table("students.csv", data.as_bytes()).expect("load csv");
        assert_eq!(table.headers, vec!["Roll", "Name", "Sem"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0]["Sem"], RawValue::Text("3.0".into()));
        assert_eq!(table.rows[1]["Sem"], RawValue::Empty);
    }

    #[test]
    fn xlsx_first_sheet_is_read() {
        let mut wb = rust_xlsxwriter::Workbook::new();
        let ws = wb.add_worksheet();
        ws.write_string(0, 0, "Roll No").expect("header");
        ws.write_string(0, 1, "Marks").expect("header");
        ws.write_number(1, 0, 101.0).expect("cell");
        ws.write_number(1, 1, 88.0).expect("cell");
        let second = wb.add_worksheet();
        second.write_string(0, 0, "ignored").expect("header");
        let bytes = wb.save_to_buffer().expect("save workbook");

        let table = load_table("marks.xlsx", &bytes).expect("load xlsx");
        assert_eq!(table.headers, vec!["Roll No", "Marks"]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0]["Roll No"].as_text(), "101");
        assert_eq!(table.rows[0]["Marks"], RawValue::Number(88.0));
    }

    #[test]
    fn number_rendering_drops_whole_fraction_only() {
        assert_eq!(RawValue::Number(3.0).as_text(), "3");
        assert_eq!(RawValue::Number(3.5).as_text(), "3.5");
        assert_eq!(RawValue::Text("  R7 ".into()).as_text(), "R7");
    }
}
