use std::cmp::Ordering;

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use super::model::{CellValue, Column, ColumnType, Table};

// ---------------------------------------------------------------------------
// Filter conditions: column / operator / value
// ---------------------------------------------------------------------------

/// Comparison operator of a single filter condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Equals,
    NotEquals,
    Greater,
    Less,
    GreaterOrEqual,
    LessOrEqual,
    Contains,
}

impl FilterOp {
    /// Every operator, in the order the condition editor lists them.
    pub const ALL: [FilterOp; 7] = [
        FilterOp::Equals,
        FilterOp::NotEquals,
        FilterOp::Greater,
        FilterOp::Less,
        FilterOp::GreaterOrEqual,
        FilterOp::LessOrEqual,
        FilterOp::Contains,
    ];

    /// The operators offered for boolean columns.
    pub const EQUALITY: [FilterOp; 2] = [FilterOp::Equals, FilterOp::NotEquals];

    pub fn label(&self) -> &'static str {
        match self {
            FilterOp::Equals => "==",
            FilterOp::NotEquals => "!=",
            FilterOp::Greater => ">",
            FilterOp::Less => "<",
            FilterOp::GreaterOrEqual => ">=",
            FilterOp::LessOrEqual => "<=",
            FilterOp::Contains => "contains",
        }
    }

    pub fn is_equality(&self) -> bool {
        matches!(self, FilterOp::Equals | FilterOp::NotEquals)
    }
}

/// How the per-condition masks of a filter set fold together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombineMode {
    And,
    Or,
}

impl CombineMode {
    pub fn label(&self) -> &'static str {
        match self {
            CombineMode::And => "AND",
            CombineMode::Or => "OR",
        }
    }
}

/// A single (column, operator, value) predicate.
///
/// The value is kept exactly as the user supplied it and only coerced to the
/// column's declared type when the filters run.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    pub column: String,
    pub op: FilterOp,
    pub value: String,
}

impl FilterCondition {
    /// The default for a freshly added condition: given column (the editor
    /// passes the table's first), equals, empty value.
    pub fn new(column: impl Into<String>) -> Self {
        FilterCondition {
            column: column.into(),
            op: FilterOp::Equals,
            value: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a filter application was rejected. Every variant ends up as a status
/// message; the user corrects the inputs and re-applies.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("at least one filter required")]
    NoConditions,
    #[error("filter {number} on '{column}' has no value")]
    EmptyValue { number: usize, column: String },
    #[error("'{value}' is not a number, but '{column}' is a number column")]
    NotANumber { value: String, column: String },
    #[error("'{value}' is not true/false, but '{column}' is a boolean column")]
    NotABoolean { value: String, column: String },
    #[error("'{value}' is not a date (use YYYY-MM-DD), but '{column}' holds dates")]
    NotADate { value: String, column: String },
    #[error("no column named '{0}'")]
    UnknownColumn(String),
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Evaluate `conditions` against `table` and return the matching rows.
///
/// The whole set is validated up front: an empty set or a condition with an
/// empty value rejects the application before any row is inspected. Each
/// condition then yields one boolean mask over the rows and the masks fold
/// under the single combine mode. Date-time columns in the result are
/// truncated to date-only values.
pub fn apply_filters(
    table: &Table,
    conditions: &[FilterCondition],
    combine: CombineMode,
) -> Result<Table, FilterError> {
    if conditions.is_empty() {
        return Err(FilterError::NoConditions);
    }
    for (i, cond) in conditions.iter().enumerate() {
        if cond.value.trim().is_empty() {
            return Err(FilterError::EmptyValue {
                number: i + 1,
                column: cond.column.clone(),
            });
        }
    }

    let mut combined = vec![matches!(combine, CombineMode::And); table.row_count()];
    for cond in conditions {
        let mask = condition_mask(table, cond)?;
        match combine {
            CombineMode::And => {
                for (acc, m) in combined.iter_mut().zip(&mask) {
                    *acc &= *m;
                }
            }
            CombineMode::Or => {
                for (acc, m) in combined.iter_mut().zip(&mask) {
                    *acc |= *m;
                }
            }
        }
    }

    Ok(strip_time_of_day(table.select_rows(&combined)))
}

/// Per-row boolean mask for one condition.
fn condition_mask(table: &Table, cond: &FilterCondition) -> Result<Vec<bool>, FilterError> {
    let column = table
        .column(&cond.column)
        .ok_or_else(|| FilterError::UnknownColumn(cond.column.clone()))?;

    // `contains` is pure text matching and never coerces the value, so it
    // cannot fail for any column type.
    if cond.op == FilterOp::Contains {
        return Ok(contains_mask(column, &cond.value));
    }

    let needle = coerce_value(column, &cond.value)?;
    Ok(column
        .values
        .iter()
        .map(|cell| match cell_ordering(cell, &needle) {
            Some(ord) => ordering_matches(cond.op, ord),
            // Blank cells match not-equals and nothing else.
            None => cond.op == FilterOp::NotEquals,
        })
        .collect())
}

/// Condition value coerced once to the column's declared type.
enum Needle {
    Number(f64),
    Bool(bool),
    Moment(NaiveDateTime),
    Text(String),
}

fn coerce_value(column: &Column, raw: &str) -> Result<Needle, FilterError> {
    match column.ty {
        ColumnType::Number => {
            raw.trim()
                .parse::<f64>()
                .map(Needle::Number)
                .map_err(|_| FilterError::NotANumber {
                    value: raw.trim().to_string(),
                    column: column.name.clone(),
                })
        }
        ColumnType::Bool => raw
            .trim()
            .to_ascii_lowercase()
            .parse::<bool>()
            .map(Needle::Bool)
            .map_err(|_| FilterError::NotABoolean {
                value: raw.trim().to_string(),
                column: column.name.clone(),
            }),
        ColumnType::DateTime | ColumnType::Date => parse_moment(raw.trim())
            .map(Needle::Moment)
            .ok_or_else(|| FilterError::NotADate {
                value: raw.trim().to_string(),
                column: column.name.clone(),
            }),
        // Text comparisons use the value exactly as typed.
        ColumnType::Text => Ok(Needle::Text(raw.to_string())),
    }
}

/// Accepted timestamp spellings for conditions on date columns. A date
/// without a time of day means midnight.
fn parse_moment(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)
}

/// Elementwise ordering between one cell and the needle; `None` when the
/// cell is blank or not comparable.
fn cell_ordering(cell: &CellValue, needle: &Needle) -> Option<Ordering> {
    match needle {
        Needle::Number(n) => cell.as_number()?.partial_cmp(n),
        Needle::Bool(b) => Some(cell.as_bool()?.cmp(b)),
        Needle::Moment(m) => Some(cell.as_datetime()?.cmp(m)),
        Needle::Text(t) => match cell {
            CellValue::Null => None,
            CellValue::Text(s) => Some(s.cmp(t)),
            other => Some(other.to_string().cmp(t)),
        },
    }
}

fn ordering_matches(op: FilterOp, ord: Ordering) -> bool {
    match op {
        FilterOp::Equals => ord == Ordering::Equal,
        FilterOp::NotEquals => ord != Ordering::Equal,
        FilterOp::Greater => ord == Ordering::Greater,
        FilterOp::Less => ord == Ordering::Less,
        FilterOp::GreaterOrEqual => ord != Ordering::Less,
        FilterOp::LessOrEqual => ord != Ordering::Greater,
        // contains is handled before coercion
        FilterOp::Contains => false,
    }
}

/// Case-insensitive substring match over the display text of every cell,
/// whatever the column type. Blank cells never match.
fn contains_mask(column: &Column, value: &str) -> Vec<bool> {
    let needle = value.to_lowercase();
    column
        .values
        .iter()
        .map(|cell| !cell.is_null() && cell.to_string().to_lowercase().contains(&needle))
        .collect()
}

/// Truncate every date-time column to date-only values, uniformly for all
/// rows. Display/export normalization only; never a filter criterion.
fn strip_time_of_day(table: Table) -> Table {
    let columns = table
        .columns()
        .iter()
        .map(|col| {
            if col.ty != ColumnType::DateTime {
                return col.clone();
            }
            Column {
                name: col.name.clone(),
                ty: ColumnType::Date,
                values: col
                    .values
                    .iter()
                    .map(|v| match v {
                        CellValue::DateTime(dt) => CellValue::Date(dt.date()),
                        other => other.clone(),
                    })
                    .collect(),
            }
        })
        .collect();
    Table::new(columns)
}
