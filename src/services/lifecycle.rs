//! Period lifecycle service
//!
//! Owns the active-period lifecycle: opening a new period (closing its
//! predecessor with rollover), posting and deleting transactions against the
//! active period, and producing the active-period snapshot.
//!
//! All writes go through the storage layer's version-checked commit units.
//! A conflicting commit is retried from a fresh observation a bounded number
//! of times before the conflict is surfaced to the caller.

use chrono::NaiveDate;

use crate::audit::{AuditEntry, EntityType};
use crate::error::{BudgetError, BudgetResult};
use crate::models::{
    BudgetAllocation, BudgetPeriod, CategoryId, IncomeEntry, Money, PaySchedule, Transaction,
    TransactionKind,
};
use crate::rollover::{calculate_budget_summary, calculate_rollover, can_apply_rollover, BudgetSummary};
use crate::storage::{PeriodRecord, Storage};

/// How many times a conflicting commit is retried from a fresh observation
const MAX_COMMIT_RETRIES: usize = 5;

/// One allocation to seed a new period with
#[derive(Debug, Clone)]
pub struct AllocationInput {
    pub category_id: CategoryId,
    pub category_name: String,
    pub category_color: String,
    pub budgeted_amount: Money,
    pub note: Option<String>,
}

/// Input for opening a new budget period
#[derive(Debug, Clone)]
pub struct CreatePeriodInput {
    /// Seeds the very first period's boundaries. Once any period exists,
    /// boundaries chain from the predecessor's end date and this field is
    /// ignored.
    pub reference_date: NaiveDate,
    pub income: Vec<IncomeEntry>,
    pub allocations: Vec<AllocationInput>,
    /// Carry the predecessor's unspent funds in, when the policy allows it
    pub apply_rollover: bool,
}

/// Input for posting a transaction to the active period
#[derive(Debug, Clone)]
pub struct PostTransactionInput {
    pub category_id: CategoryId,
    pub category_name: String,
    pub kind: TransactionKind,
    pub amount: Money,
    pub description: String,
    pub date: NaiveDate,
}

/// The active period with its allocations and computed summary
#[derive(Debug, Clone)]
pub struct ActiveSnapshot {
    pub period: BudgetPeriod,
    pub allocations: Vec<BudgetAllocation>,
    pub summary: BudgetSummary,
}

/// Service for period lifecycle management
pub struct PeriodLifecycleService<'a> {
    storage: &'a Storage,
    schedule: PaySchedule,
}

impl<'a> PeriodLifecycleService<'a> {
    /// Create a new lifecycle service
    pub fn new(storage: &'a Storage, schedule: PaySchedule) -> Self {
        Self { storage, schedule }
    }

    /// Open a new period, closing the active one with its rollover
    ///
    /// Boundaries chain through the predecessor's end date, never the
    /// caller's clock, so late or back-filled creation cannot skip or
    /// duplicate a period. The input's reference date only seeds the very
    /// first period.
    ///
    /// The predecessor's rollover-out is computed from its aggregates at
    /// close time. It carries into the new period only when rollover is
    /// requested and both periods fall in the same calendar month.
    pub fn create_period(&self, input: CreatePeriodInput) -> BudgetResult<BudgetPeriod> {
        let allocations: Vec<BudgetAllocation> = input
            .allocations
            .iter()
            .map(|a| {
                BudgetAllocation::new(
                    a.category_id,
                    a.category_name.clone(),
                    a.category_color.clone(),
                    a.budgeted_amount,
                    a.note.clone(),
                )
            })
            .collect();
        for allocation in &allocations {
            allocation
                .validate()
                .map_err(|e| BudgetError::Validation(e.to_string()))?;
        }
        let total_allocated: Money = allocations.iter().map(|a| a.budgeted_amount).sum();

        for attempt in 0..MAX_COMMIT_RETRIES {
            let active = self.storage.periods.active()?;
            let predecessor = match &active {
                Some(current) => Some(current.clone()),
                None => self.storage.periods.previous_before(NaiveDate::MAX)?,
            };

            let boundaries = match &predecessor {
                Some(prev) => self.schedule.next_after(prev.end_date),
                None => self.schedule.boundaries_for(input.reference_date),
            };

            let (expected, rollover_out, rollover_in) = match (&active, &predecessor) {
                (Some(current), _) => {
                    let out = calculate_rollover(current);
                    let carried = if input.apply_rollover
                        && can_apply_rollover(current.end_date, boundaries.start)
                    {
                        out
                    } else {
                        Money::zero()
                    };
                    (Some((current.id, current.version)), out, carried)
                }
                (None, Some(prev)) => {
                    // Resuming after a gap: the already closed predecessor's
                    // rollover still carries when the dates allow it
                    let carried = if input.apply_rollover
                        && can_apply_rollover(prev.end_date, boundaries.start)
                    {
                        prev.rollover_out
                    } else {
                        Money::zero()
                    };
                    (None, Money::zero(), carried)
                }
                (None, None) => (None, Money::zero(), Money::zero()),
            };

            let period = BudgetPeriod::new(
                &boundaries,
                input.income.clone(),
                rollover_in,
                total_allocated,
            );
            period
                .validate()
                .map_err(|e| BudgetError::Validation(e.to_string()))?;

            match self.storage.periods.open_period(
                period,
                allocations.clone(),
                expected,
                rollover_out,
            ) {
                Ok((closed, opened)) => {
                    self.storage.save_all()?;

                    // The close and the create land in the log as one batch
                    let mut entries = Vec::with_capacity(2);
                    if let (Some(before), Some(after)) = (&active, &closed) {
                        entries.push(AuditEntry::close(
                            after.id.to_string(),
                            Some(boundaries_key(before)),
                            before,
                            after,
                        ));
                    }
                    entries.push(AuditEntry::create(
                        EntityType::BudgetPeriod,
                        opened.id.to_string(),
                        Some(boundaries_key(&opened)),
                        &opened,
                    ));
                    self.storage.audit().log_batch(&entries)?;

                    return Ok(opened);
                }
                Err(e) if e.is_conflict() && attempt + 1 < MAX_COMMIT_RETRIES => continue,
                Err(e) => return Err(e),
            }
        }

        Err(BudgetError::Conflict(
            "Could not open the period after repeated conflicts".into(),
        ))
    }

    /// Post a transaction to the active period
    ///
    /// Expense postings fold into the period and allocation aggregates in the
    /// same commit that records the transaction. Income postings are recorded
    /// without an aggregate change, since period income is fixed at creation.
    pub fn post_transaction(&self, input: PostTransactionInput) -> BudgetResult<Transaction> {
        for attempt in 0..MAX_COMMIT_RETRIES {
            let record = self
                .storage
                .periods
                .active_record()?
                .ok_or_else(|| BudgetError::period_not_found("active"))?;

            let txn = Transaction::new(
                record.period.id,
                input.category_id,
                input.category_name.clone(),
                input.kind,
                input.amount,
                input.description.clone(),
                input.date,
            );
            let posted = txn.clone();

            match self.storage.commit_posting(txn, record.period.version) {
                Ok(_) => return Ok(posted),
                Err(e) if e.is_conflict() && attempt + 1 < MAX_COMMIT_RETRIES => continue,
                Err(e) => return Err(e),
            }
        }

        Err(BudgetError::Conflict(
            "Could not post the transaction after repeated conflicts".into(),
        ))
    }

    /// Delete a transaction, reversing its effect on the period's aggregates
    pub fn delete_transaction(&self, txn_id: crate::models::TransactionId) -> BudgetResult<()> {
        for attempt in 0..MAX_COMMIT_RETRIES {
            let txn = self
                .storage
                .transactions
                .get(txn_id)?
                .ok_or_else(|| BudgetError::transaction_not_found(txn_id.to_string()))?;
            let period = self
                .storage
                .periods
                .get(txn.period_id)?
                .ok_or_else(|| BudgetError::period_not_found(txn.period_id.to_string()))?;

            match self.storage.commit_removal(txn_id, period.version) {
                Ok(_) => return Ok(()),
                Err(e) if e.is_conflict() && attempt + 1 < MAX_COMMIT_RETRIES => continue,
                Err(e) => return Err(e),
            }
        }

        Err(BudgetError::Conflict(
            "Could not delete the transaction after repeated conflicts".into(),
        ))
    }

    /// Get the active period with its allocations and computed summary
    ///
    /// Recomputing the summary from the stored aggregates is idempotent, so
    /// this is safe to call on every refresh.
    pub fn active_snapshot(&self) -> BudgetResult<Option<ActiveSnapshot>> {
        let Some(PeriodRecord {
            period,
            allocations,
        }) = self.storage.periods.active_record()?
        else {
            return Ok(None);
        };

        let summary = calculate_budget_summary(&period);
        Ok(Some(ActiveSnapshot {
            period,
            allocations,
            summary,
        }))
    }
}

/// Human-readable label for audit entries: the period's date range
fn boundaries_key(period: &BudgetPeriod) -> String {
    format!("{}..{}", period.start_date, period.end_date)
}
