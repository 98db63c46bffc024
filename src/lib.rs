//! paysplit - Bi-weekly pay-period budgeting core
//!
//! This library implements a budgeting engine for people paid twice a month.
//! Each month splits into two budget periods at the configured pay days; one
//! period is active at a time, and unspent funds roll forward between periods
//! of the same month.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Core data models (periods, allocations, transactions, money)
//! - `rollover`: Rollover and budget summary calculators
//! - `import`: Bank statement CSV parsing pipeline
//! - `storage`: JSON file storage layer with version-checked commits
//! - `services`: Business logic layer
//! - `audit`: Audit logging system
//!
//! # Example
//!
//! ```rust,ignore
//! use paysplit::config::{paths::BudgetPaths, settings::Settings};
//! use paysplit::services::PeriodLifecycleService;
//! use paysplit::storage::Storage;
//!
//! let paths = BudgetPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let storage = Storage::new(paths)?;
//! storage.load_all()?;
//!
//! let lifecycle = PeriodLifecycleService::new(&storage, settings.pay_schedule()?);
//! let snapshot = lifecycle.active_snapshot()?;
//! ```

pub mod audit;
pub mod config;
pub mod error;
pub mod import;
pub mod models;
pub mod rollover;
pub mod services;
pub mod storage;

pub use error::{BudgetError, BudgetResult};
