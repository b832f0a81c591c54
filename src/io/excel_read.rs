use crate::error::ImportFailure;
use crate::io::csv_write::quote_cell;

/// Binary workbook container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkbookKind {
    Xlsx,
    Xls,
}

/// Worksheet cells rendered as strings, row by row.
pub type CellGrid = Vec<Vec<String>>;

/// Capability that decodes workbook bytes into the first worksheet's cell
/// grid, with every cell already rendered as a string.
pub trait WorkbookReader {
    fn read_grid(&self, bytes: &[u8], kind: WorkbookKind) -> Result<CellGrid, ImportFailure>;
}

/// Reader used in builds without workbook support.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableReader;

impl WorkbookReader for UnavailableReader {
    fn read_grid(&self, _bytes: &[u8], _kind: WorkbookKind) -> Result<CellGrid, ImportFailure> {
        Err(ImportFailure::CapabilityMissing)
    }
}

/// The workbook reader compiled into this build.
#[cfg(feature = "excel")]
pub fn default_reader() -> &'static dyn WorkbookReader {
    &calamine_reader::CalamineReader
}

/// The workbook reader compiled into this build.
#[cfg(not(feature = "excel"))]
pub fn default_reader() -> &'static dyn WorkbookReader {
    &UnavailableReader
}

#[cfg(feature = "excel")]
pub use calamine_reader::CalamineReader;

#[cfg(feature = "excel")]
mod calamine_reader {
    use std::io::Cursor;

    use calamine::{DataType, Reader, Xls, Xlsx};
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    use super::{CellGrid, WorkbookKind, WorkbookReader};
    use crate::error::ImportFailure;

    /// Reads `.xlsx` and `.xls` workbooks with `calamine`.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct CalamineReader;

    impl WorkbookReader for CalamineReader {
        fn read_grid(&self, bytes: &[u8], kind: WorkbookKind) -> Result<CellGrid, ImportFailure> {
            let cursor = Cursor::new(bytes.to_vec());
            match kind {
                WorkbookKind::Xlsx => first_sheet_grid::<Xlsx<_>>(cursor),
                WorkbookKind::Xls => first_sheet_grid::<Xls<_>>(cursor),
            }
        }
    }

    fn first_sheet_grid<R>(cursor: Cursor<Vec<u8>>) -> Result<CellGrid, ImportFailure>
    where
        R: Reader<Cursor<Vec<u8>>>,
        R::Error: std::fmt::Display,
    {
        let unreadable = |error: R::Error| ImportFailure::UnreadableWorkbook(error.to_string());
        let mut workbook = R::new(cursor).map_err(unreadable)?;
        let range = match workbook.worksheet_range_at(0) {
            Some(range) => range.map_err(unreadable)?,
            None => return Ok(Vec::new()),
        };

        Ok(range
            .rows()
            .map(|row| row.iter().map(|cell| cell_to_string(Some(cell))).collect())
            .collect())
    }

    fn cell_to_string(cell: Option<&DataType>) -> String {
        match cell {
            Some(DataType::String(value)) => value.clone(),
            Some(DataType::Float(value)) => value.to_string(),
            Some(DataType::Int(value)) => value.to_string(),
            Some(DataType::Bool(value)) => value.to_string(),
            Some(DataType::DateTime(serial)) => serial_to_datetime(*serial)
                .map(|datetime| datetime.format(DATETIME_FORMAT).to_string())
                .unwrap_or_else(|| serial.to_string()),
            Some(DataType::DateTimeIso(value)) => {
                NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                    .map(|datetime| datetime.format(DATETIME_FORMAT).to_string())
                    .unwrap_or_else(|_| value.clone())
            }
            Some(DataType::Empty) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }

    /// Date cells render the way a CSV export of the sheet spells them.
    const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    /// Converts a 1900-system Excel serial (days since 1899-12-30) to a
    /// timestamp, rounded to the millisecond.
    fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
        if !serial.is_finite() || serial < 0.0 {
            return None;
        }
        let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
        let millis = (serial * 86_400_000.0).round() as i64;
        epoch.checked_add_signed(Duration::milliseconds(millis))
    }
}

/// Renders a cell grid as CSV text: cells joined by commas, rows by `\n`,
/// cells holding a comma, quote or line break quoted with inner quotes doubled.
pub fn grid_to_csv(grid: &[Vec<String>]) -> String {
    grid.iter()
        .map(|row| {
            row.iter()
                .map(|cell| quote_cell(cell))
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
