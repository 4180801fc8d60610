use std::collections::BTreeSet;
use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};

use calamine::{Data, DataType, Range, Reader, Xls, Xlsx};
use thiserror::Error;

use super::model::{CellValue, Column, ColumnType, Table};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Everything that can go wrong turning a spreadsheet file into a [`Table`].
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),
    #[error("failed to parse workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("no sheets found in workbook")]
    NoSheets,
    #[error("header row {header_row} is out of range for a sheet with {rows} rows")]
    HeaderRowOutOfRange { header_row: u32, rows: usize },
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a table from a spreadsheet file. Dispatch by extension.
///
/// `header_row` is 1-based: that row supplies the column names and every
/// row after it becomes a data row.
///
/// Supported formats:
/// * `.xlsx` – Office Open XML workbook
/// * `.xls`  – legacy binary Excel workbook
pub fn load_file(path: &Path, header_row: u32) -> Result<Table, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_bytes(bytes, &ext, header_row)
}

/// Load a table from raw spreadsheet bytes.
///
/// Only the first worksheet is read. No partial load is attempted: any
/// parse problem fails the whole call.
pub fn load_bytes(bytes: Vec<u8>, ext: &str, header_row: u32) -> Result<Table, LoadError> {
    let cursor = Cursor::new(bytes);
    let range = match ext.to_ascii_lowercase().as_str() {
        "xlsx" => first_sheet_range(Xlsx::new(cursor).map_err(calamine::Error::from)?)?,
        "xls" => first_sheet_range(Xls::new(cursor).map_err(calamine::Error::from)?)?,
        other => return Err(LoadError::UnsupportedExtension(other.to_string())),
    };
    table_from_range(&range, header_row)
}

// ---------------------------------------------------------------------------
// Workbook reading
// ---------------------------------------------------------------------------

fn first_sheet_range<RS, R>(mut workbook: R) -> Result<Range<Data>, LoadError>
where
    RS: Read + Seek,
    R: Reader<RS>,
    calamine::Error: From<R::Error>,
{
    match workbook.worksheet_range_at(0) {
        Some(range) => Ok(range.map_err(calamine::Error::from)?),
        None => Err(LoadError::NoSheets),
    }
}

// ---------------------------------------------------------------------------
// Range → Table conversion
// ---------------------------------------------------------------------------

fn table_from_range(range: &Range<Data>, header_row: u32) -> Result<Table, LoadError> {
    let rows: Vec<&[Data]> = range.rows().collect();
    if header_row == 0 || header_row as usize > rows.len() {
        return Err(LoadError::HeaderRowOutOfRange {
            header_row,
            rows: rows.len(),
        });
    }
    let header_idx = (header_row - 1) as usize;
    let names = header_names(rows[header_idx]);
    let data_rows = &rows[header_idx + 1..];

    let columns = names
        .into_iter()
        .enumerate()
        .map(|(c, name)| {
            let cells = data_rows.iter().map(move |row| &row[c]);
            let ty = infer_column_type(cells.clone());
            let values = cells.map(|cell| convert_cell(cell, ty)).collect();
            Column { name, ty, values }
        })
        .collect();

    Ok(Table::new(columns))
}

/// Column names from the header row: trimmed cell text, blanks named by
/// position, duplicates suffixed until unique.
fn header_names(header: &[Data]) -> Vec<String> {
    let mut used = BTreeSet::new();
    let mut names = Vec::with_capacity(header.len());
    for (c, cell) in header.iter().enumerate() {
        let base = match cell {
            Data::Empty => String::new(),
            Data::String(s) => s.trim().to_string(),
            other => other.to_string(),
        };
        let base = if base.is_empty() {
            format!("Column {}", c + 1)
        } else {
            base
        };
        let mut name = base.clone();
        let mut n = 2;
        while !used.insert(name.clone()) {
            name = format!("{base} ({n})");
            n += 1;
        }
        names.push(name);
    }
    names
}

/// Declared type of a column: uniform over the non-blank cells, otherwise
/// text. Error and duration cells count as text.
fn infer_column_type<'a>(cells: impl Iterator<Item = &'a Data>) -> ColumnType {
    let mut saw_number = false;
    let mut saw_bool = false;
    let mut saw_datetime = false;
    let mut saw_text = false;
    for cell in cells {
        match cell {
            Data::Empty => {}
            Data::Int(_) | Data::Float(_) => saw_number = true,
            Data::Bool(_) => saw_bool = true,
            Data::DateTime(_) | Data::DateTimeIso(_) => saw_datetime = true,
            Data::String(_) | Data::Error(_) | Data::DurationIso(_) => saw_text = true,
        }
    }
    match (saw_number, saw_bool, saw_datetime, saw_text) {
        (true, false, false, false) => ColumnType::Number,
        (false, true, false, false) => ColumnType::Bool,
        (false, false, true, false) => ColumnType::DateTime,
        _ => ColumnType::Text,
    }
}

fn convert_cell(cell: &Data, ty: ColumnType) -> CellValue {
    if matches!(cell, Data::Empty) {
        return CellValue::Null;
    }
    match ty {
        ColumnType::Number => match cell {
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            other => CellValue::Text(display_text(other)),
        },
        ColumnType::Bool => match cell {
            Data::Bool(b) => CellValue::Bool(*b),
            other => CellValue::Text(display_text(other)),
        },
        ColumnType::DateTime => match cell.as_datetime() {
            Some(dt) => CellValue::DateTime(dt),
            None => CellValue::Null,
        },
        ColumnType::Date => match cell.as_datetime() {
            Some(dt) => CellValue::Date(dt.date()),
            None => CellValue::Null,
        },
        ColumnType::Text => CellValue::Text(display_text(cell)),
    }
}

fn display_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_datetime()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| cell.to_string()),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_xlsxwriter::{Format, Workbook, Worksheet};

    fn sheet_bytes(build: impl FnOnce(&mut Worksheet)) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        build(worksheet);
        workbook.save_to_buffer().unwrap()
    }

    fn people_sheet() -> Vec<u8> {
        sheet_bytes(|ws| {
            let datetime_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");
            ws.write_string(0, 0, "Name").unwrap();
            ws.write_string(0, 1, "Age").unwrap();
            ws.write_string(0, 2, "Active").unwrap();
            ws.write_string(0, 3, "Joined").unwrap();

            ws.write_string(1, 0, "Ada").unwrap();
            ws.write_number(1, 1, 30).unwrap();
            ws.write_boolean(1, 2, true).unwrap();
            let joined = NaiveDate::from_ymd_opt(2021, 6, 1)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap();
            ws.write_datetime_with_format(1, 3, &joined, &datetime_format)
                .unwrap();

            ws.write_string(2, 0, "Grace").unwrap();
            // Age left blank on purpose
            ws.write_boolean(2, 2, false).unwrap();
            let joined = NaiveDate::from_ymd_opt(2023, 1, 15)
                .unwrap()
                .and_hms_opt(14, 0, 5)
                .unwrap();
            ws.write_datetime_with_format(2, 3, &joined, &datetime_format)
                .unwrap();
        })
    }

    #[test]
    fn loads_headers_types_and_rows() {
        let table = load_bytes(people_sheet(), "xlsx", 1).unwrap();
        assert_eq!(table.row_count(), 2);
        let names: Vec<&str> = table.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Name", "Age", "Active", "Joined"]);

        assert_eq!(table.column("Name").unwrap().ty, ColumnType::Text);
        assert_eq!(table.column("Age").unwrap().ty, ColumnType::Number);
        assert_eq!(table.column("Active").unwrap().ty, ColumnType::Bool);
        assert_eq!(table.column("Joined").unwrap().ty, ColumnType::DateTime);

        assert_eq!(
            table.column("Name").unwrap().values[0],
            CellValue::Text("Ada".into())
        );
        assert_eq!(table.column("Age").unwrap().values[0], CellValue::Number(30.0));
        assert_eq!(table.column("Age").unwrap().values[1], CellValue::Null);
        assert_eq!(table.column("Active").unwrap().values[1], CellValue::Bool(false));

        let expected = NaiveDate::from_ymd_opt(2021, 6, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        assert_eq!(
            table.column("Joined").unwrap().values[0],
            CellValue::DateTime(expected)
        );
    }

    #[test]
    fn header_row_offset_skips_preamble() {
        let bytes = sheet_bytes(|ws| {
            ws.write_string(0, 0, "Quarterly export, do not edit").unwrap();
            ws.write_string(1, 0, "City").unwrap();
            ws.write_string(1, 1, "Population").unwrap();
            ws.write_string(2, 0, "Oslo").unwrap();
            ws.write_number(2, 1, 709_037).unwrap();
            ws.write_string(3, 0, "Bergen").unwrap();
            ws.write_number(3, 1, 291_189).unwrap();
        });
        let table = load_bytes(bytes, "xlsx", 2).unwrap();
        let names: Vec<&str> = table.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["City", "Population"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(
            table.column("City").unwrap().values[1],
            CellValue::Text("Bergen".into())
        );
    }

    #[test]
    fn header_row_out_of_range_is_rejected() {
        let bytes = sheet_bytes(|ws| {
            ws.write_string(0, 0, "Only").unwrap();
            ws.write_string(1, 0, "two rows").unwrap();
        });
        let err = load_bytes(bytes.clone(), "xlsx", 9).unwrap_err();
        assert!(matches!(err, LoadError::HeaderRowOutOfRange { header_row: 9, rows: 2 }));

        let err = load_bytes(bytes, "xlsx", 0).unwrap_err();
        assert!(matches!(err, LoadError::HeaderRowOutOfRange { header_row: 0, .. }));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = load_bytes(Vec::new(), "csv", 1).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedExtension(ext) if ext == "csv"));
    }

    #[test]
    fn unparseable_bytes_are_a_workbook_error() {
        let err = load_bytes(b"definitely not a zip archive".to_vec(), "xlsx", 1).unwrap_err();
        assert!(matches!(err, LoadError::Workbook(_)));
    }

    #[test]
    fn blank_and_duplicate_headers_are_uniquified() {
        let bytes = sheet_bytes(|ws| {
            ws.write_string(0, 0, "Name").unwrap();
            // B1 left blank
            ws.write_string(0, 2, "Name").unwrap();
            ws.write_string(1, 0, "a").unwrap();
            ws.write_string(1, 1, "b").unwrap();
            ws.write_string(1, 2, "c").unwrap();
        });
        let table = load_bytes(bytes, "xlsx", 1).unwrap();
        let names: Vec<&str> = table.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Name", "Column 2", "Name (2)"]);
    }

    #[test]
    fn mixed_cells_fall_back_to_text() {
        let bytes = sheet_bytes(|ws| {
            ws.write_string(0, 0, "Code").unwrap();
            ws.write_number(1, 0, 7).unwrap();
            ws.write_string(2, 0, "n/a").unwrap();
        });
        let table = load_bytes(bytes, "xlsx", 1).unwrap();
        let code = table.column("Code").unwrap();
        assert_eq!(code.ty, ColumnType::Text);
        assert_eq!(code.values[0], CellValue::Text("7".into()));
        assert_eq!(code.values[1], CellValue::Text("n/a".into()));
    }
}
