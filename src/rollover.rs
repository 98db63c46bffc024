//! Rollover and budget summary calculators
//!
//! Pure functions over period records. Rollover policy: unspent funds carry
//! forward only between periods in the same calendar month; an over-spent
//! period contributes zero rollover rather than carrying debt.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{BudgetPeriod, Money};

/// Unspent funds a closing period would carry forward
///
/// Never negative and never more than the period's total available funds.
pub fn calculate_rollover(closing_period: &BudgetPeriod) -> Money {
    let unused = closing_period.total_available() - closing_period.total_spent;
    unused.max(Money::zero())
}

/// Whether rollover may be applied between two adjacent periods
///
/// True only when both dates fall in the same calendar month and year. A
/// surplus crossing a month boundary is forfeited, not carried.
pub fn can_apply_rollover(closing_end: NaiveDate, next_start: NaiveDate) -> bool {
    closing_end.year() == next_start.year() && closing_end.month() == next_start.month()
}

/// Aggregate view of a period's budget position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSummary {
    pub total_income: Money,
    pub rollover_in: Money,
    /// total_income + rollover_in
    pub total_available: Money,
    pub total_allocated: Money,
    pub total_spent: Money,
    /// total_available - total_allocated
    pub remaining_unallocated: Money,
    /// total_available - total_spent
    pub remaining_budget: Money,
    /// Spent as a percentage of available funds; 0 when nothing is available
    pub utilization_percent: f64,
    pub is_over_budget: bool,
}

/// Compute the summary for a period snapshot
///
/// Idempotent over the same snapshot, so it is safe to call on every change
/// notification delivered by the persistence layer.
pub fn calculate_budget_summary(period: &BudgetPeriod) -> BudgetSummary {
    let total_available = period.total_available();
    let utilization_percent = if total_available.is_positive() {
        period.total_spent.cents() as f64 / total_available.cents() as f64 * 100.0
    } else {
        0.0
    };

    BudgetSummary {
        total_income: period.total_income,
        rollover_in: period.rollover_in,
        total_available,
        total_allocated: period.total_allocated,
        total_spent: period.total_spent,
        remaining_unallocated: total_available - period.total_allocated,
        remaining_budget: total_available - period.total_spent,
        utilization_percent,
        is_over_budget: period.total_spent > total_available,
    }
}

/// Spending progress of a single allocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationProgress {
    /// Percent of the budgeted amount spent, capped at 100 for display
    pub percent: f64,
    /// Over-budget detection compares the amounts, not the capped percent
    pub is_over_budget: bool,
}

/// Compute display progress for an allocation's budgeted vs spent amounts
pub fn allocation_progress(budgeted: Money, spent: Money) -> AllocationProgress {
    let percent = if budgeted.is_positive() {
        spent.cents() as f64 / budgeted.cents() as f64 * 100.0
    } else {
        0.0
    };

    AllocationProgress {
        percent: percent.min(100.0),
        is_over_budget: spent > budgeted,
    }
}
