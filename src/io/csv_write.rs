use std::path::Path;

use serde_json::Value;

use crate::error::Result;
use crate::model::Schema;

/// Quotes a cell when it holds a comma, quote or line break, doubling any
/// inner quotes. Other cells are returned unchanged.
pub fn quote_cell(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// Flattens stored records into rows of strings in schema order. Missing or
/// non-string values become empty cells; numbers and booleans keep their
/// JSON text.
pub fn record_rows(records: &[Value], schema: &Schema) -> Vec<Vec<String>> {
    records
        .iter()
        .map(|record| {
            schema
                .fields()
                .iter()
                .map(|field| match record.get(&field.key) {
                    Some(Value::String(value)) => value.clone(),
                    Some(Value::Number(value)) => value.to_string(),
                    Some(Value::Bool(value)) => value.to_string(),
                    _ => String::new(),
                })
                .collect()
        })
        .collect()
}

/// Renders records as CSV text with the schema labels as header row.
pub fn records_to_csv(records: &[Value], schema: &Schema) -> String {
    let mut text = schema
        .labels()
        .map(quote_cell)
        .collect::<Vec<_>>()
        .join(",");
    text.push('\n');
    for row in record_rows(records, schema) {
        let line = row
            .iter()
            .map(|cell| quote_cell(cell))
            .collect::<Vec<_>>()
            .join(",");
        text.push_str(&line);
        text.push('\n');
    }
    text
}

/// Writes records to `path` as UTF-8 CSV.
pub fn write_csv(path: &Path, records: &[Value], schema: &Schema) -> Result<()> {
    std::fs::write(path, records_to_csv(records, schema))?;
    Ok(())
}
