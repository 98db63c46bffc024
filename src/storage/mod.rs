//! Storage layer for paysplit
//!
//! Provides JSON file storage with atomic writes and automatic directory
//! creation. The coordinator owns the repositories plus the audit log and
//! exposes the multi-entity commit units the services build on.

pub mod file_io;
pub mod periods;
pub mod transactions;

pub use file_io::{read_json, write_json_atomic};
pub use periods::{PeriodRecord, PeriodRepository};
pub use transactions::{TransactionFilter, TransactionPage, TransactionRepository};

use serde::Serialize;

use crate::audit::{AuditEntry, AuditLogger, EntityType};
use crate::config::paths::BudgetPaths;
use crate::error::{BudgetError, BudgetResult};
use crate::models::{Transaction, TransactionId, TransactionKind};

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: BudgetPaths,
    pub periods: PeriodRepository,
    pub transactions: TransactionRepository,
    audit: AuditLogger,
}

impl Storage {
    /// Create a new Storage instance
    pub fn new(paths: BudgetPaths) -> Result<Self, BudgetError> {
        paths.ensure_directories()?;

        Ok(Self {
            periods: PeriodRepository::new(paths.periods_file()),
            transactions: TransactionRepository::new(paths.transactions_file()),
            audit: AuditLogger::new(paths.audit_log()),
            paths,
        })
    }

    /// Get the paths configuration
    pub fn paths(&self) -> &BudgetPaths {
        &self.paths
    }

    /// Get the audit logger
    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Load all data from disk
    pub fn load_all(&self) -> Result<(), BudgetError> {
        self.periods.load()?;
        self.transactions.load()?;
        Ok(())
    }

    /// Save all data to disk
    ///
    /// Both files are staged before either rename so a serialization failure
    /// cannot leave one file written without the other.
    pub fn save_all(&self) -> Result<(), BudgetError> {
        let periods = {
            let data = self.periods.lock_write()?;
            self.periods.stage(&data)?
        };
        let transactions = {
            let tables = self.transactions.lock_write()?;
            self.transactions.stage(tables.records())?
        };
        periods.commit()?;
        transactions.commit()
    }

    /// Record a transaction and fold it into its period's aggregates
    ///
    /// The whole commit runs with the period and transaction write locks held
    /// together, so no reader can observe the aggregate delta without the
    /// transaction record or the other way around. Expense transactions land
    /// through a version-checked delta: when the period's version no longer
    /// equals `expected_version` a conflict is returned and nothing is
    /// recorded. Income transactions are recorded without touching the
    /// aggregates, since period income is fixed at creation from the income
    /// breakdown.
    ///
    /// Returns the period record as of after the commit.
    pub fn commit_posting(
        &self,
        txn: Transaction,
        expected_version: u64,
    ) -> BudgetResult<PeriodRecord> {
        txn.validate()
            .map_err(|e| BudgetError::Validation(e.to_string()))?;

        // Lock order is always periods before transactions
        let mut periods = self.periods.lock_write()?;
        let mut transactions = self.transactions.lock_write()?;

        let record = match txn.kind {
            TransactionKind::Expense => PeriodRepository::apply_delta(
                &mut periods,
                txn.period_id,
                expected_version,
                txn.category_id,
                txn.amount,
            )?,
            TransactionKind::Income => periods
                .get(&txn.period_id)
                .cloned()
                .ok_or_else(|| BudgetError::period_not_found(txn.period_id.to_string()))?,
        };

        let audited = txn.clone();
        transactions.insert(txn);

        // Stage both files before either rename; the locks stay held until
        // both are on disk
        let staged_periods = self.periods.stage(&periods)?;
        let staged_transactions = self.transactions.stage(transactions.records())?;
        staged_periods.commit()?;
        staged_transactions.commit()?;

        drop(transactions);
        drop(periods);

        self.log_create(
            EntityType::Transaction,
            audited.id.to_string(),
            Some(audited.description.clone()),
            &audited,
        )?;

        Ok(record)
    }

    /// Remove a transaction and fold the reversal into its period's aggregates
    ///
    /// The mirror image of [`commit_posting`](Self::commit_posting), under
    /// the same pair of write locks and in the opposite order: the version is
    /// checked first, then the transaction record is dropped, then the
    /// aggregates revert.
    pub fn commit_removal(
        &self,
        txn_id: TransactionId,
        expected_version: u64,
    ) -> BudgetResult<PeriodRecord> {
        let mut periods = self.periods.lock_write()?;
        let mut transactions = self.transactions.lock_write()?;

        let txn = transactions
            .get(txn_id)
            .cloned()
            .ok_or_else(|| BudgetError::transaction_not_found(txn_id.to_string()))?;

        let record = match txn.kind {
            TransactionKind::Expense => {
                // Conflicts surface before either table mutates
                PeriodRepository::ensure_version(&periods, txn.period_id, expected_version)?;
                transactions.remove(txn_id);
                PeriodRepository::revert_delta(
                    &mut periods,
                    txn.period_id,
                    expected_version,
                    txn.category_id,
                    txn.amount,
                )?
            }
            TransactionKind::Income => {
                let record = periods
                    .get(&txn.period_id)
                    .cloned()
                    .ok_or_else(|| BudgetError::period_not_found(txn.period_id.to_string()))?;
                transactions.remove(txn_id);
                record
            }
        };

        let staged_periods = self.periods.stage(&periods)?;
        let staged_transactions = self.transactions.stage(transactions.records())?;
        staged_periods.commit()?;
        staged_transactions.commit()?;

        drop(transactions);
        drop(periods);

        self.log_delete(
            EntityType::Transaction,
            txn.id.to_string(),
            Some(txn.description.clone()),
            &txn,
        )?;

        Ok(record)
    }

    /// Log a create operation to the audit log
    pub fn log_create<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> BudgetResult<()> {
        self.audit
            .log(&AuditEntry::create(entity_type, entity_id, entity_name, entity))
    }

    /// Log a delete operation to the audit log
    pub fn log_delete<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> BudgetResult<()> {
        self.audit
            .log(&AuditEntry::delete(entity_type, entity_id, entity_name, entity))
    }
}
