use std::collections::BTreeSet;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

// ---------------------------------------------------------------------------
// CellValue – a single typed cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring the types a spreadsheet holds.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Bool(bool),
    /// Full timestamp as read from the sheet.
    DateTime(NaiveDateTime),
    /// Calendar date with the time of day already stripped.
    Date(NaiveDate),
    /// Blank cell.
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(v) => write!(f, "{v}"),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::Null => Ok(()),
        }
    }
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Numeric view of the cell, `None` for anything that is not a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Timestamp view of the cell. Date-only cells count as midnight.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::DateTime(dt) => Some(*dt),
            CellValue::Date(d) => d.and_hms_opt(0, 0, 0),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// ColumnType – declared type of a column
// ---------------------------------------------------------------------------

/// Declared type of a column, inferred from its cells at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Number,
    Text,
    Bool,
    DateTime,
    Date,
}

impl ColumnType {
    pub fn label(&self) -> &'static str {
        match self {
            ColumnType::Number => "number",
            ColumnType::Text => "text",
            ColumnType::Bool => "boolean",
            ColumnType::DateTime => "date-time",
            ColumnType::Date => "date",
        }
    }
}

// ---------------------------------------------------------------------------
// Column – one named column of equal-length values
// ---------------------------------------------------------------------------

/// A named column: declared type plus one value per row.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
    pub values: Vec<CellValue>,
}

impl Column {
    /// Sorted, deduplicated display texts of the non-blank values.
    ///
    /// The condition editor uses this for boolean columns, where the value
    /// is picked from the column's own distinct values instead of typed.
    pub fn distinct_display_values(&self) -> Vec<String> {
        let set: BTreeSet<String> = self
            .values
            .iter()
            .filter(|v| !v.is_null())
            .map(|v| v.to_string())
            .collect();
        set.into_iter().collect()
    }
}

// ---------------------------------------------------------------------------
// Table – the loaded spreadsheet
// ---------------------------------------------------------------------------

/// In-memory table with uniquely named columns of equal length.
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Build a table from columns.
    ///
    /// Panics if the columns differ in length or share a name; the loader
    /// and the evaluator only ever construct rectangular tables.
    pub fn new(columns: Vec<Column>) -> Self {
        if let Some(first) = columns.first() {
            let len = first.values.len();
            assert!(
                columns.iter().all(|c| c.values.len() == len),
                "all columns must have the same length"
            );
        }
        let names: BTreeSet<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        assert!(names.len() == columns.len(), "column names must be unique");
        Table { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Look a column up by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    /// Whether the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// Copy of the rows where `mask` is true, all columns, original order.
    pub fn select_rows(&self, mask: &[bool]) -> Table {
        assert!(mask.len() == self.row_count(), "mask length must match row count");
        let columns = self
            .columns
            .iter()
            .map(|col| Column {
                name: col.name.clone(),
                ty: col.ty,
                values: col
                    .values
                    .iter()
                    .zip(mask)
                    .filter(|(_, keep)| **keep)
                    .map(|(v, _)| v.clone())
                    .collect(),
            })
            .collect();
        Table { columns }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_column_table() -> Table {
        Table::new(vec![
            Column {
                name: "name".into(),
                ty: ColumnType::Text,
                values: vec![
                    CellValue::Text("ada".into()),
                    CellValue::Null,
                    CellValue::Text("grace".into()),
                ],
            },
            Column {
                name: "score".into(),
                ty: ColumnType::Number,
                values: vec![
                    CellValue::Number(1.0),
                    CellValue::Number(2.5),
                    CellValue::Number(3.0),
                ],
            },
        ])
    }

    #[test]
    fn select_rows_keeps_order_and_all_columns() {
        let table = two_column_table();
        let picked = table.select_rows(&[true, false, true]);
        assert_eq!(picked.row_count(), 2);
        assert_eq!(picked.column_count(), 2);
        assert_eq!(picked.columns()[0].values[1], CellValue::Text("grace".into()));
        assert_eq!(picked.columns()[1].values[0], CellValue::Number(1.0));
    }

    #[test]
    fn display_is_blank_for_null_and_date_only_for_dates() {
        assert_eq!(CellValue::Null.to_string(), "");
        let d = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(CellValue::Date(d).to_string(), "2024-03-07");
        let dt = d.and_hms_opt(13, 45, 9).unwrap();
        assert_eq!(CellValue::DateTime(dt).to_string(), "2024-03-07 13:45:09");
        assert_eq!(CellValue::Number(30.0).to_string(), "30");
    }

    #[test]
    fn date_cells_compare_as_midnight() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let midnight = d.and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(CellValue::Date(d).as_datetime(), Some(midnight));
    }

    #[test]
    fn distinct_display_values_are_sorted_and_skip_blanks() {
        let col = Column {
            name: "active".into(),
            ty: ColumnType::Bool,
            values: vec![
                CellValue::Bool(true),
                CellValue::Bool(false),
                CellValue::Null,
                CellValue::Bool(true),
            ],
        };
        assert_eq!(col.distinct_display_values(), vec!["false", "true"]);
    }
}
