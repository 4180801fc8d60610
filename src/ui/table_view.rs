use eframe::egui::{self, Ui};
use egui_extras::{Column as TableColumn, TableBuilder};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Central panel – table view
// ---------------------------------------------------------------------------

/// Render the central grid: the filtered rows when a result exists, the
/// loaded sheet otherwise. Rows are virtualised, so large sheets stay cheap.
pub fn data_grid(ui: &mut Ui, state: &AppState) {
    let (table, heading) = match (&state.result, &state.table) {
        (Some(result), _) => (result, "Filtered rows"),
        (None, Some(table)) => (table, "Loaded sheet"),
        (None, None) => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.label("No spreadsheet loaded. Use File → Open… to pick an .xlsx or .xls file.");
            });
            return;
        }
    };

    ui.horizontal(|ui: &mut Ui| {
        ui.heading(heading);
        ui.label(format!("{} rows", table.row_count()));
    });
    ui.separator();

    if table.column_count() == 0 {
        ui.label("The sheet has no columns.");
        return;
    }

    egui::ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .columns(TableColumn::auto().at_least(60.0), table.column_count())
            .header(20.0, |mut header| {
                for column in table.columns() {
                    header.col(|ui| {
                        ui.strong(&column.name).on_hover_text(column.ty.label());
                    });
                }
            })
            .body(|body| {
                body.rows(18.0, table.row_count(), |mut row| {
                    let r = row.index();
                    for column in table.columns() {
                        row.col(|ui| {
                            ui.label(column.values[r].to_string());
                        });
                    }
                });
            });
    });
}
