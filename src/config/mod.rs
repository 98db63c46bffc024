//! Configuration module for paysplit
//!
//! This module provides configuration management including:
//! - Platform-appropriate path resolution
//! - User settings persistence
//! - The pay-day schedule preference

pub mod paths;
pub mod settings;

pub use paths::BudgetPaths;
pub use settings::Settings;
