//! Custom error types for paysplit
//!
//! This module defines the error hierarchy for the budgeting core using
//! thiserror for ergonomic error definitions.

use thiserror::Error;

/// The main error type for paysplit operations
#[derive(Error, Debug)]
pub enum BudgetError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for data models
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Optimistic-concurrency conflict on an atomic commit
    ///
    /// The commit unit observed a different period version (or a different
    /// active-period set) than it expected. The operation left no partial
    /// state and is safe to retry as a whole.
    #[error("Commit conflict: {0}")]
    Conflict(String),

    /// Bank statement import errors
    #[error("Import error: {0}")]
    Import(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),
}

impl BudgetError {
    /// Create a "not found" error for budget periods
    pub fn period_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "BudgetPeriod",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for transactions
    pub fn transaction_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Transaction",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a commit conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for BudgetError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BudgetError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for paysplit operations
pub type BudgetResult<T> = Result<T, BudgetError>;
