use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, XlsxError};

use super::model::{CellValue, Table};

// ---------------------------------------------------------------------------
// xlsx export
// ---------------------------------------------------------------------------

/// File name suggested when saving a filtered result.
pub const DEFAULT_EXPORT_NAME: &str = "filtered_output.xlsx";

/// Write `table` to an xlsx workbook at `path`.
pub fn write_file(table: &Table, path: &Path) -> Result<(), XlsxError> {
    build_workbook(table)?.save(path)
}

/// Serialize `table` to xlsx bytes.
pub fn to_bytes(table: &Table) -> Result<Vec<u8>, XlsxError> {
    build_workbook(table)?.save_to_buffer()
}

/// One sheet, bold header row, then the data rows in original column order.
/// Dates get a `yyyy-mm-dd` number format so they render date-only.
fn build_workbook(table: &Table) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    let header_format = Format::new().set_bold();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let datetime_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

    for (c, column) in table.columns().iter().enumerate() {
        let c = c as u16;
        worksheet.write_string_with_format(0, c, &column.name, &header_format)?;
        for (r, value) in column.values.iter().enumerate() {
            let r = r as u32 + 1;
            match value {
                CellValue::Number(v) => {
                    worksheet.write_number(r, c, *v)?;
                }
                CellValue::Text(s) => {
                    worksheet.write_string(r, c, s)?;
                }
                CellValue::Bool(b) => {
                    worksheet.write_boolean(r, c, *b)?;
                }
                CellValue::DateTime(dt) => {
                    worksheet.write_datetime_with_format(r, c, dt, &datetime_format)?;
                }
                CellValue::Date(d) => {
                    worksheet.write_datetime_with_format(r, c, d, &date_format)?;
                }
                CellValue::Null => {}
            }
        }
    }
    worksheet.autofit();

    Ok(workbook)
}
