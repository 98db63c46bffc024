//! Budget period representation
//!
//! A period is one half-month budgeting window with running aggregate totals.
//! At most one period is active at a time; the lifecycle service closes the
//! old one before opening the next.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{IncomeSourceId, PeriodId};
use super::money::Money;
use super::schedule::PeriodBoundaries;

/// Lifecycle status of a budget period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodStatus {
    /// The single period currently accepting transactions
    Active,
    /// A finished period; rollover_out has been computed
    Closed,
}

impl fmt::Display for PeriodStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodStatus::Active => write!(f, "active"),
            PeriodStatus::Closed => write!(f, "closed"),
        }
    }
}

/// One income source's contribution to a period, snapshotted at creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeEntry {
    pub source_id: IncomeSourceId,
    pub source_name: String,
    pub amount: Money,
}

/// A half-month budgeting window with running aggregates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetPeriod {
    pub id: PeriodId,

    /// First day of the period
    pub start_date: NaiveDate,

    /// Last day of the period (inclusive)
    pub end_date: NaiveDate,

    pub status: PeriodStatus,

    /// Sum of the income breakdown, fixed at creation
    pub total_income: Money,

    /// Per-source income snapshot
    pub income_breakdown: Vec<IncomeEntry>,

    /// Unspent funds carried in from the previous period (never negative)
    pub rollover_in: Money,

    /// Unspent funds carried out; set when the period closes
    pub rollover_out: Money,

    /// Sum of allocation budgeted amounts
    pub total_allocated: Money,

    /// Running sum of expense transactions
    pub total_spent: Money,

    /// total_income + rollover_in - total_spent; may go negative
    pub remaining_budget: Money,

    /// Optimistic-concurrency counter, bumped on every aggregate mutation
    pub version: u64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BudgetPeriod {
    /// Create a new active period from computed boundaries
    pub fn new(
        boundaries: &PeriodBoundaries,
        income_breakdown: Vec<IncomeEntry>,
        rollover_in: Money,
        total_allocated: Money,
    ) -> Self {
        let now = Utc::now();
        let total_income: Money = income_breakdown.iter().map(|e| e.amount).sum();
        Self {
            id: PeriodId::new(),
            start_date: boundaries.start,
            end_date: boundaries.end,
            status: PeriodStatus::Active,
            total_income,
            income_breakdown,
            rollover_in,
            rollover_out: Money::zero(),
            total_allocated,
            total_spent: Money::zero(),
            remaining_budget: total_income + rollover_in,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check whether this period is the active one
    pub fn is_active(&self) -> bool {
        self.status == PeriodStatus::Active
    }

    /// Total funds available this period (income plus rollover)
    pub fn total_available(&self) -> Money {
        self.total_income + self.rollover_in
    }

    /// Apply an expense of `amount` to the running aggregates
    pub fn apply_expense(&mut self, amount: Money) {
        self.total_spent += amount;
        self.remaining_budget -= amount;
        self.touch();
    }

    /// Reverse a previously applied expense of `amount`
    pub fn revert_expense(&mut self, amount: Money) {
        self.total_spent -= amount;
        self.remaining_budget += amount;
        self.touch();
    }

    /// Flip to closed with the given rollover-out amount
    ///
    /// Idempotent: closing an already closed period just overwrites the same
    /// status and rollover value.
    pub fn close(&mut self, rollover_out: Money) {
        self.status = PeriodStatus::Closed;
        self.rollover_out = rollover_out;
        self.touch();
    }

    fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }

    /// Validate the period's shape
    pub fn validate(&self) -> Result<(), PeriodValidationError> {
        if self.start_date > self.end_date {
            return Err(PeriodValidationError::InvertedDates);
        }
        if self.income_breakdown.is_empty() || !self.total_income.is_positive() {
            return Err(PeriodValidationError::NoIncome);
        }
        if self.income_breakdown.iter().any(|e| !e.amount.is_positive()) {
            return Err(PeriodValidationError::NonPositiveIncomeEntry);
        }
        if self.rollover_in.is_negative() || self.rollover_out.is_negative() {
            return Err(PeriodValidationError::NegativeRollover);
        }
        Ok(())
    }
}

/// Validation errors for budget periods
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodValidationError {
    InvertedDates,
    NoIncome,
    NonPositiveIncomeEntry,
    NegativeRollover,
}

impl fmt::Display for PeriodValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvertedDates => write!(f, "Period start date is after its end date"),
            Self::NoIncome => write!(f, "Period must have at least one income entry"),
            Self::NonPositiveIncomeEntry => {
                write!(f, "Income entry amounts must be positive")
            }
            Self::NegativeRollover => write!(f, "Rollover amounts cannot be negative"),
        }
    }
}

impl std::error::Error for PeriodValidationError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schedule::PaySchedule;

    fn boundaries() -> PeriodBoundaries {
        PaySchedule::default().boundaries_for(NaiveDate::from_ymd_opt(2025, 1, 7).unwrap())
    }

    fn income(cents: i64) -> Vec<IncomeEntry> {
        vec![IncomeEntry {
            source_id: IncomeSourceId::new(),
            source_name: "Salary".into(),
            amount: Money::from_cents(cents),
        }]
    }

    #[test]
    fn test_new_period_aggregates() {
        let period = BudgetPeriod::new(
            &boundaries(),
            income(200_000),
            Money::from_cents(10_000),
            Money::from_cents(150_000),
        );

        assert!(period.is_active());
        assert_eq!(period.total_income.cents(), 200_000);
        assert_eq!(period.total_available().cents(), 210_000);
        assert_eq!(period.remaining_budget.cents(), 210_000);
        assert_eq!(period.total_spent, Money::zero());
        assert_eq!(period.version, 0);
        assert!(period.validate().is_ok());
    }

    #[test]
    fn test_expense_apply_and_revert() {
        let mut period = BudgetPeriod::new(&boundaries(), income(100_000), Money::zero(), Money::zero());

        period.apply_expense(Money::from_cents(5432));
        assert_eq!(period.total_spent.cents(), 5432);
        assert_eq!(period.remaining_budget.cents(), 94_568);
        assert_eq!(period.version, 1);

        period.revert_expense(Money::from_cents(5432));
        assert_eq!(period.total_spent, Money::zero());
        assert_eq!(period.remaining_budget.cents(), 100_000);
        assert_eq!(period.version, 2);
    }

    #[test]
    fn test_remaining_budget_may_go_negative() {
        let mut period = BudgetPeriod::new(&boundaries(), income(1_000), Money::zero(), Money::zero());
        period.apply_expense(Money::from_cents(2_500));
        assert_eq!(period.remaining_budget.cents(), -1_500);
    }

    #[test]
    fn test_close_sets_status_and_rollover() {
        let mut period = BudgetPeriod::new(&boundaries(), income(100_000), Money::zero(), Money::zero());
        period.close(Money::from_cents(40_000));

        assert_eq!(period.status, PeriodStatus::Closed);
        assert_eq!(period.rollover_out.cents(), 40_000);
    }

    #[test]
    fn test_validate_rejects_zero_income() {
        let period = BudgetPeriod::new(&boundaries(), vec![], Money::zero(), Money::zero());
        assert_eq!(period.validate(), Err(PeriodValidationError::NoIncome));
    }

    #[test]
    fn test_serde_round_trip() {
        let period = BudgetPeriod::new(&boundaries(), income(50_000), Money::zero(), Money::zero());
        let json = serde_json::to_string(&period).unwrap();
        let back: BudgetPeriod = serde_json::from_str(&json).unwrap();
        assert_eq!(period.id, back.id);
        assert_eq!(back.status, PeriodStatus::Active);
        assert_eq!(back.total_income.cents(), 50_000);
    }
}
