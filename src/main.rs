use std::path::{Path, PathBuf};

use battery_ledger::io::excel_read;
use battery_ledger::model::Schema;
use battery_ledger::store::{DEFAULT_STORE_PATH, Store, StoreConfig};
use battery_ledger::sync::{self, ExportFormat};
use battery_ledger::{Result, ToolError};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging().and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| ToolError::Logging(error.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Import(args) => execute_import(args),
        Command::Export(args) => execute_export(args),
        Command::Dedupe(args) => execute_dedupe(args),
    }
}

fn execute_import(args: ImportArgs) -> Result<()> {
    let schema = load_schema(args.schema.as_deref())?;
    let seed = match &args.seed {
        Some(path) => load_seed(path)?,
        None => Vec::new(),
    };
    let store = Store::new(
        StoreConfig::new(args.store.clone())
            .with_seed(seed)
            .with_backup(args.backup),
    );

    let reader = excel_read::default_reader();
    let summary = sync::import_into_store(&args.input, &schema, reader, &store)?;
    println!("parsed {} records", summary.parsed);
    println!("store now holds {} records", summary.persisted);
    Ok(())
}

fn execute_export(args: ExportArgs) -> Result<()> {
    let schema = load_schema(args.schema.as_deref())?;
    let format = match args.format {
        Some(kind) => kind.into(),
        None => ExportFormat::detect(&args.output)?,
    };
    let store = Store::new(StoreConfig::new(args.store.clone()));
    let count = sync::export_store(&store, &schema, &args.output, format)?;
    println!("exported {count} records to {}", args.output.display());
    Ok(())
}

fn execute_dedupe(args: DedupeArgs) -> Result<()> {
    let store = Store::new(StoreConfig::new(args.store.clone()).with_backup(args.backup));
    let (before, after) = sync::dedupe_store(&store, &args.key)?;
    println!("kept {after} of {before} records");
    Ok(())
}

fn load_schema(path: Option<&Path>) -> Result<Schema> {
    match path {
        Some(path) => Schema::from_json_file(path),
        None => Ok(Schema::battery_repairs()),
    }
}

fn load_seed(path: &Path) -> Result<Vec<Value>> {
    let data = std::fs::read_to_string(path)?;
    match serde_json::from_str::<Value>(&data)? {
        Value::Array(entries) => Ok(entries),
        _ => Err(ToolError::InvalidStore(path.to_path_buf())),
    }
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Import battery repair spreadsheets into a JSON record store."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Append the records of a CSV or Excel file to the store.
    Import(ImportArgs),
    /// Write the stored records to a CSV or Excel file.
    Export(ExportArgs),
    /// Keep only the latest record per battery BT code.
    Dedupe(DedupeArgs),
}

#[derive(clap::Args)]
struct ImportArgs {
    /// Source file (.csv, .xlsx or .xls).
    input: PathBuf,

    /// Record store to append to.
    #[arg(long, default_value = DEFAULT_STORE_PATH)]
    store: PathBuf,

    /// JSON file overriding the canonical field list.
    #[arg(long)]
    schema: Option<PathBuf>,

    /// JSON array the store starts from when it does not exist yet.
    #[arg(long)]
    seed: Option<PathBuf>,

    /// Copy the store to `<name>_backup.json` before rewriting it.
    #[arg(long)]
    backup: bool,
}

#[derive(clap::Args)]
struct ExportArgs {
    /// Output file path.
    #[arg(long)]
    output: PathBuf,

    /// Record store to read.
    #[arg(long, default_value = DEFAULT_STORE_PATH)]
    store: PathBuf,

    /// JSON file overriding the canonical field list.
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Output format; inferred from the output extension when omitted.
    #[arg(long, value_enum)]
    format: Option<ExportFormatKind>,
}

#[derive(clap::Args)]
struct DedupeArgs {
    /// Record store to rewrite.
    #[arg(long, default_value = DEFAULT_STORE_PATH)]
    store: PathBuf,

    /// Record key identifying duplicates.
    #[arg(long, default_value = "batteryBtCode")]
    key: String,

    /// Copy the store to `<name>_backup.json` before rewriting it.
    #[arg(long)]
    backup: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ExportFormatKind {
    Csv,
    Xlsx,
}

impl From<ExportFormatKind> for ExportFormat {
    fn from(kind: ExportFormatKind) -> Self {
        match kind {
            ExportFormatKind::Csv => ExportFormat::Csv,
            ExportFormatKind::Xlsx => ExportFormat::Xlsx,
        }
    }
}
