//! Transaction model
//!
//! A single expense or income event against a budget period. Amounts are
//! always positive; the kind carries the direction.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{CategoryId, PeriodId, RecurringId, TransactionId};
use super::money::Money;

/// Direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Expense,
    Income,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Expense => write!(f, "expense"),
            TransactionKind::Income => write!(f, "income"),
        }
    }
}

/// A single expense or income event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,

    /// The period this transaction belongs to
    pub period_id: PeriodId,

    pub category_id: CategoryId,

    /// Category name snapshot at posting time
    pub category_name: String,

    pub kind: TransactionKind,

    /// Always positive; direction comes from `kind`
    pub amount: Money,

    pub description: String,

    pub date: NaiveDate,

    /// Set when this transaction was generated from a recurring template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_id: Option<RecurringId>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new transaction
    pub fn new(
        period_id: PeriodId,
        category_id: CategoryId,
        category_name: impl Into<String>,
        kind: TransactionKind,
        amount: Money,
        description: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TransactionId::new(),
            period_id,
            category_id,
            category_name: category_name.into(),
            kind,
            amount,
            description: description.into(),
            date,
            recurring_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Validate the transaction
    pub fn validate(&self) -> Result<(), TransactionValidationError> {
        if !self.amount.is_positive() {
            return Err(TransactionValidationError::NonPositiveAmount);
        }
        Ok(())
    }
}

/// Validation errors for transactions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionValidationError {
    NonPositiveAmount,
}

impl fmt::Display for TransactionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveAmount => write!(f, "Transaction amount must be positive"),
        }
    }
}

impl std::error::Error for TransactionValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn txn(cents: i64) -> Transaction {
        Transaction::new(
            PeriodId::new(),
            CategoryId::new(),
            "Groceries",
            TransactionKind::Expense,
            Money::from_cents(cents),
            "Grocery Store",
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
        )
    }

    #[test]
    fn test_validate_positive_amount() {
        assert!(txn(5432).validate().is_ok());
        assert_eq!(
            txn(0).validate(),
            Err(TransactionValidationError::NonPositiveAmount)
        );
        assert_eq!(
            txn(-100).validate(),
            Err(TransactionValidationError::NonPositiveAmount)
        );
    }

    #[test]
    fn test_kind_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&TransactionKind::Expense).unwrap(),
            "\"expense\""
        );
        assert_eq!(
            serde_json::to_string(&TransactionKind::Income).unwrap(),
            "\"income\""
        );
    }

    #[test]
    fn test_serde_round_trip() {
        let t = txn(2500);
        let json = serde_json::to_string(&t).unwrap();
        assert!(!json.contains("recurring_id"));
        let back: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, t.id);
        assert_eq!(back.kind, TransactionKind::Expense);
        assert_eq!(back.amount.cents(), 2500);
    }
}
