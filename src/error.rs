use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Reason an import produced no records.
///
/// The import engine never aborts its caller: every failure degrades to one
/// of these kinds so callers can branch on the condition instead of parsing
/// diagnostic text.
#[derive(Debug, Error)]
pub enum ImportFailure {
    /// The file extension is not one of `.csv`, `.xlsx` or `.xls`.
    #[error("unsupported file format '{extension}', expected .csv, .xlsx or .xls")]
    UnsupportedFormat { extension: String },

    /// The input holds a header row at most.
    #[error("no data rows found beyond the header row")]
    NoDataRows,

    /// Binary workbook support is not available in this build.
    #[error("workbook support is unavailable; rebuild with `--features excel`")]
    CapabilityMissing,

    /// The workbook bytes could not be decoded.
    #[error("unreadable workbook: {0}")]
    UnreadableWorkbook(String),

    /// The source file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Error type covering the operations around the import engine: store
/// persistence, exports and command-line configuration.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// An import that yielded no records.
    #[error("import failed: {0}")]
    Import(#[from] ImportFailure),

    /// Raised when a schema definition is unusable.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// Raised when the store file does not hold a JSON array.
    #[error("store {} does not contain a record array", .0.display())]
    InvalidStore(PathBuf),

    /// Raised when an export target has no recognised extension.
    #[error("cannot infer export format for {}", .0.display())]
    UnknownExportFormat(PathBuf),

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {}", .0.display())]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
