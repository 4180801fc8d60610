use std::collections::BTreeMap;

use eframe::egui::{self, Color32, DragValue, RichText, ScrollArea, TextEdit, Ui};

use crate::data::export::DEFAULT_EXPORT_NAME;
use crate::data::filter::{CombineMode, FilterCondition, FilterOp};
use crate::data::model::ColumnType;
use crate::state::{AppState, StatusKind};

// ---------------------------------------------------------------------------
// Left side panel – filter editor
// ---------------------------------------------------------------------------

/// Render the left filter panel: one editable row per condition, the
/// AND/OR switch, then Apply and Download.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let Some(table) = &state.table else {
        ui.label("No spreadsheet loaded.");
        return;
    };

    // Clone what the editor needs so we can mutate state inside the loop.
    let columns: Vec<(String, ColumnType)> = table
        .columns()
        .iter()
        .map(|c| (c.name.clone(), c.ty))
        .collect();
    let bool_choices: BTreeMap<String, Vec<String>> = table
        .columns()
        .iter()
        .filter(|c| c.ty == ColumnType::Bool)
        .map(|c| (c.name.clone(), c.distinct_display_values()))
        .collect();

    let mut removed: Option<usize> = None;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (index, cond) in state.conditions.iter_mut().enumerate() {
                condition_editor(ui, index, cond, &columns, &bool_choices, &mut removed);
                ui.separator();
            }

            if ui.button("Add filter").clicked() {
                state.add_condition();
            }

            ui.separator();

            ui.horizontal(|ui: &mut Ui| {
                ui.strong("Combine:");
                ui.radio_value(&mut state.combine, CombineMode::And, CombineMode::And.label());
                ui.radio_value(&mut state.combine, CombineMode::Or, CombineMode::Or.label());
            });

            ui.separator();

            ui.horizontal(|ui: &mut Ui| {
                if ui.button("Apply filters").clicked() {
                    state.apply_filters();
                }
                let can_export = state.result.is_some();
                if ui
                    .add_enabled(can_export, egui::Button::new("Download…"))
                    .on_hover_text("Save the filtered rows as xlsx")
                    .clicked()
                {
                    save_file_dialog(state);
                }
            });
        });

    if let Some(index) = removed {
        state.remove_condition(index);
    }
}

/// One condition: column and operator dropdowns, a value editor suited to
/// the column's type, and a remove button.
fn condition_editor(
    ui: &mut Ui,
    index: usize,
    cond: &mut FilterCondition,
    columns: &[(String, ColumnType)],
    bool_choices: &BTreeMap<String, Vec<String>>,
    removed: &mut Option<usize>,
) {
    let column_type = columns
        .iter()
        .find(|(name, _)| *name == cond.column)
        .map(|(_, ty)| *ty)
        .unwrap_or(ColumnType::Text);

    ui.horizontal(|ui: &mut Ui| {
        egui::ComboBox::from_id_salt(("filter_column", index))
            .width(110.0)
            .selected_text(&cond.column)
            .show_ui(ui, |ui: &mut Ui| {
                for (name, ty) in columns {
                    if ui.selectable_label(cond.column == *name, name).clicked() {
                        cond.column = name.clone();
                        if *ty == ColumnType::Bool {
                            // Boolean columns take equality tests against a
                            // value picked from the sheet.
                            if !cond.op.is_equality() {
                                cond.op = FilterOp::Equals;
                            }
                            cond.value = bool_choices
                                .get(name)
                                .and_then(|choices| choices.first())
                                .cloned()
                                .unwrap_or_default();
                        } else {
                            cond.value.clear();
                        }
                    }
                }
            });

        let ops: &[FilterOp] = if column_type == ColumnType::Bool {
            &FilterOp::EQUALITY
        } else {
            &FilterOp::ALL
        };
        egui::ComboBox::from_id_salt(("filter_op", index))
            .width(80.0)
            .selected_text(cond.op.label())
            .show_ui(ui, |ui: &mut Ui| {
                for op in ops {
                    ui.selectable_value(&mut cond.op, *op, op.label());
                }
            });

        if ui.button("✕").on_hover_text("Remove this filter").clicked() {
            *removed = Some(index);
        }
    });

    // Value editor on its own line so long values stay readable.
    if column_type == ColumnType::Bool {
        let choices = bool_choices.get(&cond.column).cloned().unwrap_or_default();
        egui::ComboBox::from_id_salt(("filter_value", index))
            .selected_text(&cond.value)
            .show_ui(ui, |ui: &mut Ui| {
                for choice in &choices {
                    ui.selectable_value(&mut cond.value, choice.clone(), choice);
                }
            });
    } else {
        ui.add(TextEdit::singleline(&mut cond.value).hint_text(value_hint(column_type)));
    }
}

fn value_hint(ty: ColumnType) -> &'static str {
    match ty {
        ColumnType::Number => "e.g. 42",
        ColumnType::DateTime | ColumnType::Date => "YYYY-MM-DD",
        _ => "value",
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        ui.label("Header row:");
        let drag = ui.add(DragValue::new(&mut state.header_row).range(1..=100_000));
        if drag.changed() && state.source.is_some() {
            // The sheet is parsed against the header row, so re-read it.
            state.reload();
        }

        ui.separator();

        if let Some(table) = &state.table {
            match &state.result {
                Some(result) => ui.label(format!(
                    "{} of {} rows match",
                    result.row_count(),
                    table.row_count()
                )),
                None => ui.label(format!(
                    "{} rows × {} columns",
                    table.row_count(),
                    table.column_count()
                )),
            };
        }

        if let Some(status) = &state.status {
            let color = match status.kind {
                StatusKind::Info => Color32::LIGHT_GREEN,
                StatusKind::Error => Color32::RED,
            };
            ui.label(RichText::new(&status.text).color(color));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open spreadsheet")
        .add_filter("Excel files", &["xlsx", "xls"])
        .pick_file();

    if let Some(path) = file {
        state.load_from(&path);
    }
}

fn save_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Save filtered rows")
        .set_file_name(DEFAULT_EXPORT_NAME)
        .add_filter("Excel workbook", &["xlsx"])
        .save_file();

    if let Some(path) = file {
        state.export_result(&path);
    }
}
