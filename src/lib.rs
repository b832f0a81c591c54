//! Core library for the battery-ledger command line application.
//!
//! The library turns spreadsheet exports of battery return/repair logs into
//! canonical records and appends them to a flat JSON store. Parsing lives
//! under [`import`], workbook and export adapters under [`io`], the record
//! schema in [`model`], store persistence in [`store`], and the operations
//! the command line drives in [`sync`].

pub mod error;
pub mod import;
pub mod io;
pub mod model;
pub mod store;
pub mod sync;

pub use error::{ImportFailure, Result, ToolError};
