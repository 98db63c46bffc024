//! Path management for paysplit
//!
//! Provides platform-appropriate path resolution for configuration and data.
//!
//! ## Path Resolution Order
//!
//! 1. `PAYSPLIT_DATA_DIR` environment variable (if set)
//! 2. The platform config directory via `directories::ProjectDirs`
//!    (Linux: `~/.config/paysplit`, macOS: `~/Library/Application Support`,
//!    Windows: `%APPDATA%`)

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::BudgetError;

/// Manages all paths used by paysplit
#[derive(Debug, Clone)]
pub struct BudgetPaths {
    /// Base directory for all paysplit data
    base_dir: PathBuf,
}

impl BudgetPaths {
    /// Create a new BudgetPaths instance
    ///
    /// Path resolution:
    /// 1. `PAYSPLIT_DATA_DIR` env var (explicit override)
    /// 2. Platform config directory from `directories::ProjectDirs`
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn new() -> Result<Self, BudgetError> {
        let base_dir = if let Ok(custom) = std::env::var("PAYSPLIT_DATA_DIR") {
            PathBuf::from(custom)
        } else {
            let dirs = ProjectDirs::from("dev", "paysplit", "paysplit").ok_or_else(|| {
                BudgetError::Config("Could not determine a config directory".into())
            })?;
            dirs.config_dir().to_path_buf()
        };

        Ok(Self { base_dir })
    }

    /// Create BudgetPaths with a custom base directory (useful for testing)
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the data directory
    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join("data")
    }

    /// Get the path to the settings file
    pub fn settings_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the path to the audit log
    pub fn audit_log(&self) -> PathBuf {
        self.base_dir.join("audit.log")
    }

    /// Get the path to periods.json (periods with their allocations)
    pub fn periods_file(&self) -> PathBuf {
        self.data_dir().join("periods.json")
    }

    /// Get the path to transactions.json
    pub fn transactions_file(&self) -> PathBuf {
        self.data_dir().join("transactions.json")
    }

    /// Ensure all required directories exist
    pub fn ensure_directories(&self) -> Result<(), BudgetError> {
        std::fs::create_dir_all(&self.base_dir)
            .map_err(|e| BudgetError::Io(format!("Failed to create base directory: {}", e)))?;

        std::fs::create_dir_all(self.data_dir())
            .map_err(|e| BudgetError::Io(format!("Failed to create data directory: {}", e)))?;

        Ok(())
    }

    /// Check if paysplit has been initialized (config file exists)
    pub fn is_initialized(&self) -> bool {
        self.settings_file().exists()
    }
}
