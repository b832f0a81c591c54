use std::path::Path;

use rust_xlsxwriter::Workbook;
use serde_json::Value;

use crate::error::Result;
use crate::io::csv_write::record_rows;
use crate::model::Schema;

/// Name of the worksheet exports are written to.
pub const EXPORT_SHEET: &str = "电池维修记录";

/// Writes records to an `.xlsx` workbook: schema labels in the first row,
/// one string row per record below.
pub fn write_workbook(path: &Path, records: &[Value], schema: &Schema) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(EXPORT_SHEET)?;

    for (col_idx, label) in schema.labels().enumerate() {
        worksheet.write_string(0, col_idx as u16, label)?;
    }

    for (row_idx, row) in record_rows(records, schema).iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            worksheet.write_string((row_idx + 1) as u32, col_idx as u16, cell)?;
        }
    }

    workbook.save(path)?;
    Ok(())
}
