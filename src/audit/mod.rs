//! Audit logging system for paysplit
//!
//! Records create, delete, and close operations with before/after values in
//! an append-only audit log.
//!
//! # Architecture
//!
//! The audit system consists of three components:
//!
//! - `AuditEntry`: Represents a single audit log entry with timestamp, operation,
//!   entity information, and optional before/after values.
//! - `AuditLogger`: Handles writing entries to the audit log file using a
//!   line-delimited JSON format (JSONL).
//! - `generate_diff`: Utility function to create human-readable diffs between
//!   entity states.

mod diff;
mod entry;
mod logger;

pub use diff::generate_diff;
pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
