//! Core data models for paysplit
//!
//! This module contains the data structures that represent the budgeting
//! domain: pay periods, allocations, transactions, and money.

pub mod allocation;
pub mod ids;
pub mod money;
pub mod period;
pub mod schedule;
pub mod transaction;

pub use allocation::BudgetAllocation;
pub use ids::{AllocationId, CategoryId, IncomeSourceId, PeriodId, RecurringId, TransactionId};
pub use money::Money;
pub use period::{BudgetPeriod, IncomeEntry, PeriodStatus};
pub use schedule::{PaySchedule, PeriodBoundaries};
pub use transaction::{Transaction, TransactionKind};
