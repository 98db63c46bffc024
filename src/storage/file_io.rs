//! File I/O utilities with atomic writes
//!
//! Provides safe file operations that won't corrupt data on failure.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::BudgetError;

/// Read JSON from a file, returning a default value if file doesn't exist
pub fn read_json<T, P>(path: P) -> Result<T, BudgetError>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if !path.exists() {
        return Ok(T::default());
    }

    let file = File::open(path)
        .map_err(|e| BudgetError::Storage(format!("Failed to open {}: {}", path.display(), e)))?;

    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .map_err(|e| BudgetError::Storage(format!("Failed to parse {}: {}", path.display(), e)))
}

/// A fully serialized and synced payload sitting in a temp file, not yet
/// visible at its final path
///
/// Splitting the write lets multi-file commits stage every payload before
/// any rename happens, so a serialization failure cannot leave one file
/// ahead of the other. An uncommitted stage cleans up its temp file on drop.
#[must_use = "a staged write does nothing until committed"]
pub struct StagedJson {
    temp_path: PathBuf,
    final_path: PathBuf,
}

impl StagedJson {
    /// Atomically move the staged payload into place
    pub fn commit(self) -> Result<(), BudgetError> {
        fs::rename(&self.temp_path, &self.final_path)
            .map_err(|e| BudgetError::Storage(format!("Failed to rename temp file: {}", e)))
    }
}

impl Drop for StagedJson {
    fn drop(&mut self) {
        // Gone already if commit renamed it
        let _ = fs::remove_file(&self.temp_path);
    }
}

/// Serialize JSON to a synced temp file next to `path`, ready to commit
///
/// The temp file lives in the same directory as the target so the final
/// rename is atomic.
pub fn stage_json<T, P>(path: P, data: &T) -> Result<StagedJson, BudgetError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            BudgetError::Storage(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    let temp_path = path.with_extension("json.tmp");

    let file = File::create(&temp_path)
        .map_err(|e| BudgetError::Storage(format!("Failed to create temp file: {}", e)))?;

    let staged = StagedJson {
        temp_path,
        final_path: path.to_path_buf(),
    };

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)
        .map_err(|e| BudgetError::Storage(format!("Failed to serialize data: {}", e)))?;

    writer
        .flush()
        .map_err(|e| BudgetError::Storage(format!("Failed to flush data: {}", e)))?;

    writer
        .get_ref()
        .sync_all()
        .map_err(|e| BudgetError::Storage(format!("Failed to sync data: {}", e)))?;

    Ok(staged)
}

/// Write JSON to a file atomically (write to temp, then rename)
///
/// This ensures that the file is either completely written or not modified at all,
/// preventing corruption on crashes or power failures.
pub fn write_json_atomic<T, P>(path: P, data: &T) -> Result<(), BudgetError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    stage_json(path, data)?.commit()
}
