//! The delimited-text import engine.
//!
//! Text and workbook inputs share one path: workbooks are first transcoded to
//! CSV text by [`crate::io::excel_read`], then both are split into logical
//! lines, the first non-blank line resolves the header map, and every later
//! non-blank line becomes one [`Record`].

pub mod builder;
pub mod header;
pub mod tokenizer;

use std::path::Path;

use tracing::{debug, info, instrument, warn};

use crate::error::ImportFailure;
use crate::io::excel_read::{self, WorkbookKind, WorkbookReader};
use crate::model::{IdGenerator, Record, Schema};

pub use builder::RecordBuilder;
pub use header::{HeaderMap, resolve_headers};
pub use tokenizer::{split_logical_lines, tokenize_line};

/// Outcome of an import: the parsed records, or why there are none.
pub type ImportResult = std::result::Result<Vec<Record>, ImportFailure>;

/// Input formats recognised by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Workbook(WorkbookKind),
}

impl SourceFormat {
    /// Detects the format from the extension, ignoring case.
    pub fn detect(path: &Path) -> Result<Self, ImportFailure> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Ok(SourceFormat::Csv),
            "xlsx" => Ok(SourceFormat::Workbook(WorkbookKind::Xlsx)),
            "xls" => Ok(SourceFormat::Workbook(WorkbookKind::Xls)),
            _ => Err(ImportFailure::UnsupportedFormat { extension }),
        }
    }
}

/// Drives an import from a file path down to records.
pub struct Importer<'a> {
    schema: &'a Schema,
    reader: &'a dyn WorkbookReader,
}

impl<'a> Importer<'a> {
    pub fn new(schema: &'a Schema, reader: &'a dyn WorkbookReader) -> Self {
        Self { schema, reader }
    }

    /// Imports `path`, picking the text or workbook path by extension.
    ///
    /// Failures are logged and returned; they never abort the caller.
    #[instrument(level = "info", skip_all, fields(input = %path.display()))]
    pub fn import_file(&self, path: &Path, ids: &mut IdGenerator) -> ImportResult {
        let result = SourceFormat::detect(path).and_then(|format| match format {
            SourceFormat::Csv => {
                let text = std::fs::read_to_string(path).map_err(|source| ImportFailure::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                self.import_text(&text, ids)
            }
            SourceFormat::Workbook(kind) => {
                let bytes = std::fs::read(path).map_err(|source| ImportFailure::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                self.import_workbook(&bytes, kind, ids)
            }
        });

        match &result {
            Ok(records) => info!(record_count = records.len(), "parsed records from source"),
            Err(failure) => warn!(%failure, "import produced no records"),
        }
        result
    }

    /// Imports binary workbook bytes through the CSV text path.
    pub fn import_workbook(
        &self,
        bytes: &[u8],
        kind: WorkbookKind,
        ids: &mut IdGenerator,
    ) -> ImportResult {
        let grid = self.reader.read_grid(bytes, kind)?;
        if grid.len() <= 1 {
            return Err(ImportFailure::NoDataRows);
        }
        debug!(row_count = grid.len(), "transcoding workbook grid");
        let text = excel_read::grid_to_csv(&grid);
        self.import_text(&text, ids)
    }

    /// Imports CSV text: first non-blank line is the header row.
    pub fn import_text(&self, text: &str, ids: &mut IdGenerator) -> ImportResult {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut rows = split_logical_lines(text)
            .into_iter()
            .filter(|line| !line.trim().is_empty())
            .map(|line| tokenize_line(&line));

        let header_row = rows.next().ok_or(ImportFailure::NoDataRows)?;
        let headers = resolve_headers(&header_row, self.schema);
        let missing = headers.missing(self.schema);
        if !missing.is_empty() {
            warn!(missing = ?missing, "header row lacks canonical fields");
        }
        debug!(matched = headers.len(), "resolved header row");

        let mut builder = RecordBuilder::new(self.schema, &headers, ids);
        let records: Vec<Record> = rows.map(|row| builder.build(&row)).collect();
        if records.is_empty() {
            return Err(ImportFailure::NoDataRows);
        }
        Ok(records)
    }
}
