use std::collections::HashSet;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::error::{Result, ToolError};
use crate::model::Record;

/// Store location used when none is configured.
pub const DEFAULT_STORE_PATH: &str = "data/batteries.json";

/// How a record store is located and bootstrapped.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// JSON file holding the record array.
    pub path: PathBuf,
    /// Entries a store starts from when its file does not exist yet.
    pub seed: Vec<Value>,
    /// Copy the current file to `<stem>_backup.json` before each rewrite.
    pub backup: bool,
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            seed: Vec::new(),
            backup: false,
        }
    }

    pub fn with_seed(mut self, seed: Vec<Value>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_backup(mut self, backup: bool) -> Self {
        self.backup = backup;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_PATH)
    }
}

/// A JSON array of records on disk.
///
/// Existing entries are kept as raw JSON so fields written by other tools
/// survive a rewrite untouched.
#[derive(Debug, Clone)]
pub struct Store {
    config: StoreConfig,
}

impl Store {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Loads the stored entries.
    ///
    /// A missing file yields the configured seed. An unreadable file or one
    /// that is not valid JSON is treated as empty. Valid JSON that is not an
    /// array is rejected so it is never overwritten.
    pub fn load(&self) -> Result<Vec<Value>> {
        let path = self.path();
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "store missing, starting from seed");
                return Ok(self.config.seed.clone());
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "store unreadable, treating as empty");
                return Ok(Vec::new());
            }
        };

        match serde_json::from_str::<Value>(&data) {
            Ok(Value::Array(entries)) => Ok(entries),
            Ok(_) => Err(ToolError::InvalidStore(path.to_path_buf())),
            Err(error) => {
                warn!(path = %path.display(), %error, "store is not valid JSON, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    /// Appends `records` after the existing entries and rewrites the store.
    /// Returns the total number of entries written.
    pub fn append(&self, records: &[Record]) -> Result<usize> {
        let mut entries = self.load()?;
        let existing = entries.len();
        entries.extend(records.iter().map(Record::to_json));
        self.replace(&entries)?;
        info!(
            existing,
            appended = records.len(),
            total = entries.len(),
            "store updated"
        );
        Ok(entries.len())
    }

    /// Keeps only the last entry for each non-empty value of `key`, dropping
    /// entries without one. Relative order is preserved. Returns the entry
    /// counts before and after.
    pub fn dedupe(&self, key: &str) -> Result<(usize, usize)> {
        let entries = self.load()?;
        let before = entries.len();
        let kept = dedupe_entries(entries, key);
        let after = kept.len();
        self.replace(&kept)?;
        info!(before, after, key, "store deduplicated");
        Ok((before, after))
    }

    /// Rewrites the whole store with `entries`.
    ///
    /// The array is written to a temporary file next to the store and renamed
    /// over it, so readers see either the old or the new content.
    pub fn replace(&self, entries: &[Value]) -> Result<()> {
        let path = self.path();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        if self.config.backup && path.exists() {
            let backup = backup_path(path);
            fs::copy(path, &backup)?;
            debug!(backup = %backup.display(), "store backed up");
        }

        let mut file = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut file, entries)?;
        file.write_all(b"\n")?;
        file.as_file().sync_all()?;
        file.persist(path).map_err(|error| ToolError::Io(error.error))?;
        Ok(())
    }
}

/// Location of the backup copy for a store file: `<stem>_backup.json`.
pub fn backup_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "store".to_string());
    path.with_file_name(format!("{stem}_backup.json"))
}

fn dedupe_entries(entries: Vec<Value>, key: &str) -> Vec<Value> {
    let mut seen = HashSet::new();
    let mut kept: Vec<Value> = entries
        .into_iter()
        .rev()
        .filter(|entry| match entry.get(key).and_then(Value::as_str) {
            Some(code) if !code.is_empty() => seen.insert(code.to_string()),
            _ => false,
        })
        .collect();
    kept.reverse();
    kept
}
