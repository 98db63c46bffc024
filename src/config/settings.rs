//! User settings for paysplit
//!
//! Manages user preferences including the pay-day schedule and display
//! options.

use serde::{Deserialize, Serialize};

use super::paths::BudgetPaths;
use crate::error::BudgetError;
use crate::models::PaySchedule;

/// User settings for paysplit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// The two pay days of each month, e.g. [1, 15]
    #[serde(default = "default_pay_days")]
    pub pay_days: [u32; 2],

    /// ISO 4217 currency code used for display
    #[serde(default = "default_currency_code")]
    pub currency_code: String,

    /// IANA timezone name used when resolving "today"
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_schema_version() -> u32 {
    1
}

fn default_pay_days() -> [u32; 2] {
    [1, 15]
}

fn default_currency_code() -> String {
    "CAD".to_string()
}

fn default_timezone() -> String {
    "America/Toronto".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            pay_days: default_pay_days(),
            currency_code: default_currency_code(),
            timezone: default_timezone(),
        }
    }
}

impl Settings {
    /// Build the pay schedule from the configured pay days
    ///
    /// # Errors
    ///
    /// Returns a config error when the stored pay days are out of range or
    /// not in ascending order.
    pub fn pay_schedule(&self) -> Result<PaySchedule, BudgetError> {
        PaySchedule::new(self.pay_days)
            .map_err(|e| BudgetError::Config(format!("Invalid pay days in settings: {}", e)))
    }

    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &BudgetPaths) -> Result<Self, BudgetError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| BudgetError::Io(format!("Failed to read settings file: {}", e)))?;

            let settings: Settings = serde_json::from_str(&contents)
                .map_err(|e| BudgetError::Config(format!("Failed to parse settings file: {}", e)))?;

            Ok(settings)
        } else {
            // Don't save yet, let the caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &BudgetPaths) -> Result<(), BudgetError> {
        paths.ensure_directories()?;

        let settings_path = paths.settings_file();
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| BudgetError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(&settings_path, contents)
            .map_err(|e| BudgetError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.pay_days, [1, 15]);
        assert_eq!(settings.currency_code, "CAD");
        assert_eq!(settings.schema_version, 1);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = BudgetPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.pay_days = [5, 20];
        settings.currency_code = "USD".to_string();

        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.pay_days, [5, 20]);
        assert_eq!(loaded.currency_code, "USD");
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.pay_days, [1, 15]);
        assert_eq!(settings.timezone, "America/Toronto");
    }

    #[test]
    fn test_pay_schedule_from_settings() {
        let settings = Settings::default();
        assert!(settings.pay_schedule().is_ok());

        let mut bad = Settings::default();
        bad.pay_days = [15, 1];
        assert!(bad.pay_schedule().is_err());
    }
}
