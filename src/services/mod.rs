//! Service layer for paysplit
//!
//! The service layer provides business logic on top of the storage layer,
//! handling validation, rollover policy, and cross-entity commits.

pub mod import;
pub mod lifecycle;

pub use import::{ImportOutcome, ImportSelection, StatementImportService};
pub use lifecycle::{
    ActiveSnapshot, AllocationInput, CreatePeriodInput, PeriodLifecycleService,
    PostTransactionInput,
};
