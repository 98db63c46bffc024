//! Audit logger for append-only audit log
//!
//! Provides the AuditLogger struct that writes audit entries to a log file.
//! Each entry is written as a single JSON line and flushed immediately.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use crate::error::{BudgetError, BudgetResult};

use super::entry::AuditEntry;

/// Handles writing audit entries to the audit log file
///
/// The log file uses a line-delimited JSON format (JSONL) where each line
/// is a complete JSON object representing one audit entry.
pub struct AuditLogger {
    /// Path to the audit log file
    log_path: PathBuf,
}

impl AuditLogger {
    /// Create a new AuditLogger that writes to the specified path
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }

    /// Log an audit entry
    ///
    /// Appends the entry as a JSON line to the audit log file.
    /// Each write is flushed immediately to ensure durability.
    pub fn log(&self, entry: &AuditEntry) -> BudgetResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| BudgetError::Io(format!("Failed to open audit log: {}", e)))?;

        let json = serde_json::to_string(entry)
            .map_err(|e| BudgetError::Json(format!("Failed to serialize audit entry: {}", e)))?;

        writeln!(file, "{}", json)
            .map_err(|e| BudgetError::Io(format!("Failed to write audit entry: {}", e)))?;

        file.flush()
            .map_err(|e| BudgetError::Io(format!("Failed to flush audit log: {}", e)))?;

        Ok(())
    }

    /// Log multiple audit entries in one append
    ///
    /// Writes all entries and flushes once at the end.
    pub fn log_batch(&self, entries: &[AuditEntry]) -> BudgetResult<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| BudgetError::Io(format!("Failed to open audit log: {}", e)))?;

        for entry in entries {
            let json = serde_json::to_string(entry).map_err(|e| {
                BudgetError::Json(format!("Failed to serialize audit entry: {}", e))
            })?;

            writeln!(file, "{}", json)
                .map_err(|e| BudgetError::Io(format!("Failed to write audit entry: {}", e)))?;
        }

        file.flush()
            .map_err(|e| BudgetError::Io(format!("Failed to flush audit log: {}", e)))?;

        Ok(())
    }

    /// Read all audit entries from the log file
    ///
    /// Returns entries in chronological order (oldest first).
    pub fn read_all(&self) -> BudgetResult<Vec<AuditEntry>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.log_path)
            .map_err(|e| BudgetError::Io(format!("Failed to open audit log: {}", e)))?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| {
                BudgetError::Io(format!("Failed to read audit log line {}: {}", line_num + 1, e))
            })?;

            if line.trim().is_empty() {
                continue;
            }

            let entry: AuditEntry = serde_json::from_str(&line).map_err(|e| {
                BudgetError::Json(format!(
                    "Failed to parse audit entry at line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;

            entries.push(entry);
        }

        Ok(entries)
    }

    /// Read the most recent N entries from the log
    pub fn read_recent(&self, count: usize) -> BudgetResult<Vec<AuditEntry>> {
        let all_entries = self.read_all()?;
        let start = all_entries.len().saturating_sub(count);
        Ok(all_entries[start..].to_vec())
    }

    /// Check if the audit log file exists
    pub fn exists(&self) -> bool {
        self.log_path.exists()
    }

    /// Get the path to the audit log file
    pub fn path(&self) -> &PathBuf {
        &self.log_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::entry::{EntityType, Operation};
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_logger() -> (AuditLogger, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("audit.log");
        let logger = AuditLogger::new(log_path);
        (logger, temp_dir)
    }

    fn create_test_entry() -> AuditEntry {
        AuditEntry::create(
            EntityType::BudgetPeriod,
            "per-12345678",
            Some("2025-01-15".to_string()),
            &json!({"key": "2025-01-15", "total_income": 200000}),
        )
    }

    #[test]
    fn test_log_and_read() {
        let (logger, _temp) = create_test_logger();
        let entry = create_test_entry();

        logger.log(&entry).unwrap();

        let entries = logger.read_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].operation, Operation::Create);
        assert_eq!(entries[0].entity_type, EntityType::BudgetPeriod);
    }

    #[test]
    fn test_log_batch() {
        let (logger, _temp) = create_test_logger();

        let entries: Vec<AuditEntry> = (0..3)
            .map(|i| {
                AuditEntry::create(
                    EntityType::Transaction,
                    format!("txn-{}", i),
                    None,
                    &json!({"id": i}),
                )
            })
            .collect();

        logger.log_batch(&entries).unwrap();

        let read_entries = logger.read_all().unwrap();
        assert_eq!(read_entries.len(), 3);
    }

    #[test]
    fn test_read_recent() {
        let (logger, _temp) = create_test_logger();

        for i in 0..10 {
            let entry = AuditEntry::create(
                EntityType::Transaction,
                format!("txn-{}", i),
                None,
                &json!({"index": i}),
            );
            logger.log(&entry).unwrap();
        }

        let recent = logger.read_recent(3).unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].entity_id, "txn-7");
        assert_eq!(recent[2].entity_id, "txn-9");
    }

    #[test]
    fn test_empty_log() {
        let (logger, _temp) = create_test_logger();

        assert!(!logger.exists());
        assert!(logger.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_survives_reopen() {
        let (logger, temp) = create_test_logger();

        let entry = create_test_entry();
        logger.log(&entry).unwrap();

        let logger2 = AuditLogger::new(temp.path().join("audit.log"));

        let entries = logger2.read_all().unwrap();
        assert_eq!(entries.len(), 1);
    }
}
