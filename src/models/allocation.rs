//! Budget allocation model
//!
//! A per-category sub-budget inside a period. Category name and color are
//! denormalized snapshots taken at creation time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AllocationId, CategoryId};
use super::money::Money;

/// A category's budgeted sub-amount within a single period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetAllocation {
    pub id: AllocationId,

    /// The category this allocation is for
    pub category_id: CategoryId,

    /// Category name snapshot at creation time
    pub category_name: String,

    /// Category display color snapshot at creation time
    pub category_color: String,

    /// Amount budgeted to this category this period
    pub budgeted_amount: Money,

    /// Running sum of expense transactions in this category
    pub spent_amount: Money,

    /// budgeted_amount - spent_amount; may go negative
    pub remaining_amount: Money,

    /// Optional note for this allocation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BudgetAllocation {
    /// Create a new allocation with nothing spent yet
    pub fn new(
        category_id: CategoryId,
        category_name: impl Into<String>,
        category_color: impl Into<String>,
        budgeted_amount: Money,
        note: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: AllocationId::new(),
            category_id,
            category_name: category_name.into(),
            category_color: category_color.into(),
            budgeted_amount,
            spent_amount: Money::zero(),
            remaining_amount: budgeted_amount,
            note,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply an expense of `amount` in this category
    pub fn apply_expense(&mut self, amount: Money) {
        self.spent_amount += amount;
        self.remaining_amount -= amount;
        self.updated_at = Utc::now();
    }

    /// Reverse a previously applied expense of `amount`
    pub fn revert_expense(&mut self, amount: Money) {
        self.spent_amount -= amount;
        self.remaining_amount += amount;
        self.updated_at = Utc::now();
    }

    /// Validate the allocation
    pub fn validate(&self) -> Result<(), AllocationValidationError> {
        if self.budgeted_amount.is_negative() {
            return Err(AllocationValidationError::NegativeBudget);
        }
        if self.category_name.trim().is_empty() {
            return Err(AllocationValidationError::EmptyCategoryName);
        }
        Ok(())
    }
}

/// Validation errors for allocations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocationValidationError {
    NegativeBudget,
    EmptyCategoryName,
}

impl fmt::Display for AllocationValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeBudget => write!(f, "Budgeted amount cannot be negative"),
            Self::EmptyCategoryName => write!(f, "Allocation category name cannot be empty"),
        }
    }
}

impl std::error::Error for AllocationValidationError {}
