use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::data::export;
use crate::data::filter::{self, CombineMode, FilterCondition};
use crate::data::loader;
use crate::data::model::Table;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Severity of the status line, decides its colour in the top bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

/// Outcome of the most recent action, shown until the next one.
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded spreadsheet (None until the user opens a file).
    pub table: Option<Table>,

    /// Path of the loaded file, kept so header-row changes can re-read it.
    pub source: Option<PathBuf>,

    /// 1-based row of the sheet that holds the column names.
    pub header_row: u32,

    /// Filter conditions, edited in the side panel.
    pub conditions: Vec<FilterCondition>,

    /// How the conditions combine (AND / OR).
    pub combine: CombineMode,

    /// Rows matching the last applied filters (None until Apply succeeds).
    pub result: Option<Table>,

    /// Status / error message shown in the UI.
    pub status: Option<StatusMessage>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            table: None,
            source: None,
            header_row: 1,
            conditions: Vec::new(),
            combine: CombineMode::And,
            result: None,
            status: None,
        }
    }
}

impl AppState {
    /// Load `path` with the current header row. On success the table replaces
    /// the previous one and all conditions and results are reset; on failure
    /// the previous state stays untouched.
    pub fn load_from(&mut self, path: &Path) {
        match loader::load_file(path, self.header_row) {
            Ok(table) => {
                log::info!(
                    "loaded {}: {} rows × {} columns",
                    path.display(),
                    table.row_count(),
                    table.column_count()
                );
                self.table = Some(table);
                self.source = Some(path.to_path_buf());
                self.conditions.clear();
                self.result = None;
                self.set_status(StatusKind::Info, "File loaded successfully");
            }
            Err(err) => {
                log::error!("failed to load {}: {err}", path.display());
                self.set_status(StatusKind::Error, format!("Error loading file: {err}"));
            }
        }
    }

    /// Re-read the current file, e.g. after the header row changed.
    pub fn reload(&mut self) {
        if let Some(path) = self.source.clone() {
            self.load_from(&path);
        }
    }

    /// Append a fresh condition against the table's first column.
    pub fn add_condition(&mut self) {
        let Some(table) = &self.table else { return };
        if let Some(first) = table.columns().first() {
            self.conditions.push(FilterCondition::new(&first.name));
        }
    }

    /// Remove the condition at `index`; later conditions shift down.
    pub fn remove_condition(&mut self, index: usize) {
        if index < self.conditions.len() {
            self.conditions.remove(index);
        }
    }

    /// Run the current conditions against the loaded table. Success caches
    /// the matching rows and reports their count; a rejected filter set
    /// clears any previous result so the view never shows stale rows.
    pub fn apply_filters(&mut self) {
        let Some(table) = &self.table else { return };
        match filter::apply_filters(table, &self.conditions, self.combine) {
            Ok(result) => {
                let matched = result.row_count();
                log::info!("filters matched {matched} of {} rows", table.row_count());
                self.result = Some(result);
                self.set_status(StatusKind::Info, format!("Rows matched: {matched}"));
            }
            Err(err) => {
                log::error!("filters rejected: {err}");
                self.result = None;
                self.set_status(StatusKind::Error, err.to_string());
            }
        }
    }

    /// Write the filtered rows to `path` as xlsx.
    pub fn export_result(&mut self, path: &Path) {
        let Some(result) = &self.result else { return };
        let rows = result.row_count();
        let outcome = export::write_file(result, path)
            .with_context(|| format!("saving {}", path.display()));
        match outcome {
            Ok(()) => {
                log::info!("exported {rows} rows to {}", path.display());
                self.set_status(StatusKind::Info, format!("Saved {}", path.display()));
            }
            Err(err) => {
                log::error!("{err:#}");
                self.set_status(StatusKind::Error, format!("Error saving file: {err:#}"));
            }
        }
    }

    fn set_status(&mut self, kind: StatusKind, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            kind,
            text: text.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::FilterOp;
    use crate::data::model::{CellValue, Column, ColumnType};

    fn people_state() -> AppState {
        let mut state = AppState::default();
        state.table = Some(Table::new(vec![
            Column {
                name: "Name".into(),
                ty: ColumnType::Text,
                values: vec![
                    CellValue::Text("Ada".into()),
                    CellValue::Text("Bob".into()),
                    CellValue::Text("Carol".into()),
                ],
            },
            Column {
                name: "Age".into(),
                ty: ColumnType::Number,
                values: vec![
                    CellValue::Number(30.0),
                    CellValue::Number(17.0),
                    CellValue::Number(45.0),
                ],
            },
        ]));
        state
    }

    #[test]
    fn new_conditions_default_to_equals_on_the_first_column() {
        let mut state = people_state();
        state.add_condition();
        let cond = &state.conditions[0];
        assert_eq!(cond.column, "Name");
        assert_eq!(cond.op, FilterOp::Equals);
        assert!(cond.value.is_empty());
    }

    #[test]
    fn removing_a_condition_shifts_the_rest_down() {
        let mut state = people_state();
        state.add_condition();
        state.add_condition();
        state.conditions[1].value = "keep".into();
        state.remove_condition(0);
        assert_eq!(state.conditions.len(), 1);
        assert_eq!(state.conditions[0].value, "keep");
        // Out-of-range index is ignored.
        state.remove_condition(5);
        assert_eq!(state.conditions.len(), 1);
    }

    #[test]
    fn applying_filters_caches_result_and_reports_count() {
        let mut state = people_state();
        state.conditions.push(FilterCondition {
            column: "Age".into(),
            op: FilterOp::GreaterOrEqual,
            value: "18".into(),
        });
        state.apply_filters();

        assert_eq!(state.result.as_ref().map(Table::row_count), Some(2));
        let status = state.status.as_ref().unwrap();
        assert_eq!(status.kind, StatusKind::Info);
        assert_eq!(status.text, "Rows matched: 2");
    }

    #[test]
    fn failed_apply_clears_the_previous_result() {
        let mut state = people_state();
        state.conditions.push(FilterCondition {
            column: "Age".into(),
            op: FilterOp::Greater,
            value: "18".into(),
        });
        state.apply_filters();
        assert!(state.result.is_some());

        state.conditions[0].value = "old".into();
        state.apply_filters();
        assert!(state.result.is_none());
        assert_eq!(state.status.as_ref().unwrap().kind, StatusKind::Error);
    }

    #[test]
    fn empty_condition_set_is_reported_as_an_error() {
        let mut state = people_state();
        state.apply_filters();
        assert!(state.result.is_none());
        let status = state.status.unwrap();
        assert_eq!(status.kind, StatusKind::Error);
        assert_eq!(status.text, "at least one filter required");
    }
}
