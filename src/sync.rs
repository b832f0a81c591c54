use std::path::Path;

use tracing::{info, instrument};

use crate::error::{Result, ToolError};
use crate::import::Importer;
use crate::io::csv_write;
use crate::io::excel_read::WorkbookReader;
use crate::io::excel_write;
use crate::model::{IdGenerator, Schema};
use crate::store::Store;

/// Counts reported after a successful import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    /// Records parsed from the source file.
    pub parsed: usize,
    /// Entries in the store after the append.
    pub persisted: usize,
}

/// Export file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    /// Infers the format from the output file extension.
    pub fn detect(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("csv") => Ok(ExportFormat::Csv),
            Some("xlsx") => Ok(ExportFormat::Xlsx),
            _ => Err(ToolError::UnknownExportFormat(path.to_path_buf())),
        }
    }
}

/// Imports `input` and appends the resulting records to `store`.
///
/// A failed import leaves the store untouched.
#[instrument(
    level = "info",
    skip_all,
    fields(input = %input.display(), store = %store.path().display())
)]
pub fn import_into_store(
    input: &Path,
    schema: &Schema,
    reader: &dyn WorkbookReader,
    store: &Store,
) -> Result<ImportSummary> {
    if !input.exists() {
        return Err(ToolError::MissingInput(input.to_path_buf()));
    }

    let existing = store.load()?;
    let mut ids = IdGenerator::after_existing(&existing);
    let records = Importer::new(schema, reader).import_file(input, &mut ids)?;
    let persisted = store.append(&records)?;
    info!(parsed = records.len(), persisted, "import complete");
    Ok(ImportSummary {
        parsed: records.len(),
        persisted,
    })
}

/// Writes every stored record to `output` in the given format.
#[instrument(
    level = "info",
    skip_all,
    fields(store = %store.path().display(), output = %output.display(), ?format)
)]
pub fn export_store(
    store: &Store,
    schema: &Schema,
    output: &Path,
    format: ExportFormat,
) -> Result<usize> {
    let entries = store.load()?;
    match format {
        ExportFormat::Csv => csv_write::write_csv(output, &entries, schema)?,
        ExportFormat::Xlsx => excel_write::write_workbook(output, &entries, schema)?,
    }
    info!(record_count = entries.len(), "store exported");
    Ok(entries.len())
}

/// Removes duplicate entries by `key`, keeping the most recent of each.
#[instrument(level = "info", skip(store), fields(store = %store.path().display()))]
pub fn dedupe_store(store: &Store, key: &str) -> Result<(usize, usize)> {
    store.dedupe(key)
}
