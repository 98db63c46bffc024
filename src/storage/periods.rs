//! Budget period repository for JSON storage
//!
//! Manages loading and saving periods (with their allocations) to
//! periods.json. All aggregate mutations go through version-checked commit
//! methods so that concurrent writers cannot apply a delta against stale
//! aggregates.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{BudgetError, BudgetResult};
use crate::models::{BudgetAllocation, BudgetPeriod, CategoryId, Money, PeriodId};

use super::file_io::{read_json, stage_json, StagedJson};

/// In-memory period table, keyed by period ID
pub(crate) type PeriodMap = HashMap<PeriodId, PeriodRecord>;

/// A period together with its allocations, stored as one unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodRecord {
    pub period: BudgetPeriod,
    pub allocations: Vec<BudgetAllocation>,
}

/// Serializable period data structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PeriodData {
    periods: Vec<PeriodRecord>,
}

/// Repository for period persistence
pub struct PeriodRepository {
    path: PathBuf,
    data: RwLock<PeriodMap>,
}

impl PeriodRepository {
    /// Create a new period repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    fn read_guard(&self) -> BudgetResult<RwLockReadGuard<'_, PeriodMap>> {
        self.data
            .read()
            .map_err(|e| BudgetError::Storage(format!("Failed to acquire read lock: {}", e)))
    }

    /// Take the period table's write lock
    ///
    /// The storage coordinator holds this together with the transaction
    /// table's lock while a posting or removal commits.
    pub(crate) fn lock_write(&self) -> BudgetResult<RwLockWriteGuard<'_, PeriodMap>> {
        self.data
            .write()
            .map_err(|e| BudgetError::Storage(format!("Failed to acquire write lock: {}", e)))
    }

    /// Load periods from disk
    pub fn load(&self) -> BudgetResult<()> {
        let file_data: PeriodData = read_json(&self.path)?;

        let mut data = self.lock_write()?;

        data.clear();
        for record in file_data.periods {
            data.insert(record.period.id, record);
        }

        Ok(())
    }

    /// Stage the given table for disk, newest first
    pub(crate) fn stage(&self, data: &PeriodMap) -> BudgetResult<StagedJson> {
        let mut periods: Vec<_> = data.values().cloned().collect();
        periods.sort_by(|a, b| b.period.start_date.cmp(&a.period.start_date));

        stage_json(&self.path, &PeriodData { periods })
    }

    /// Save periods to disk, newest first
    pub fn save(&self) -> BudgetResult<()> {
        let staged = {
            let data = self.read_guard()?;
            self.stage(&data)?
        };
        staged.commit()
    }

    /// Get a period by ID
    pub fn get(&self, id: PeriodId) -> BudgetResult<Option<BudgetPeriod>> {
        let data = self.read_guard()?;

        Ok(data.get(&id).map(|r| r.period.clone()))
    }

    /// Get a period together with its allocations
    pub fn get_record(&self, id: PeriodId) -> BudgetResult<Option<PeriodRecord>> {
        let data = self.read_guard()?;

        Ok(data.get(&id).cloned())
    }

    /// Get the allocations of a period
    pub fn get_allocations(&self, id: PeriodId) -> BudgetResult<Vec<BudgetAllocation>> {
        Ok(self
            .get_record(id)?
            .map(|r| r.allocations)
            .unwrap_or_default())
    }

    /// Get the currently active period, if any
    pub fn active(&self) -> BudgetResult<Option<BudgetPeriod>> {
        let data = self.read_guard()?;

        Ok(data
            .values()
            .find(|r| r.period.is_active())
            .map(|r| r.period.clone()))
    }

    /// Get the currently active period with its allocations, if any
    pub fn active_record(&self) -> BudgetResult<Option<PeriodRecord>> {
        let data = self.read_guard()?;

        Ok(data.values().find(|r| r.period.is_active()).cloned())
    }

    /// Get all periods, newest first
    pub fn get_all(&self) -> BudgetResult<Vec<BudgetPeriod>> {
        let data = self.read_guard()?;

        let mut periods: Vec<_> = data.values().map(|r| r.period.clone()).collect();
        periods.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(periods)
    }

    /// Get the most recent period that ended before the given date
    pub fn previous_before(&self, date: NaiveDate) -> BudgetResult<Option<BudgetPeriod>> {
        let data = self.read_guard()?;

        Ok(data
            .values()
            .filter(|r| r.period.end_date < date)
            .max_by_key(|r| r.period.end_date)
            .map(|r| r.period.clone()))
    }

    /// Close the current active period and open a new one, as one unit
    ///
    /// `expected_active` carries the observed active period's ID and version,
    /// or None when the caller observed no active period. The swap only
    /// happens when that observation still holds under the write lock;
    /// otherwise a conflict is returned and nothing changes.
    ///
    /// Returns the closed predecessor (if there was one) and the new period.
    pub fn open_period(
        &self,
        new_period: BudgetPeriod,
        allocations: Vec<BudgetAllocation>,
        expected_active: Option<(PeriodId, u64)>,
        rollover_out: Money,
    ) -> BudgetResult<(Option<BudgetPeriod>, BudgetPeriod)> {
        let mut data = self.lock_write()?;

        let current_active = data.values().find(|r| r.period.is_active()).map(|r| {
            (r.period.id, r.period.version)
        });

        if current_active != expected_active {
            return Err(BudgetError::Conflict(
                "Active period changed while opening a new one".into(),
            ));
        }

        let closed = if let Some((active_id, _)) = current_active {
            let record = data.get_mut(&active_id).ok_or_else(|| {
                BudgetError::period_not_found(active_id.to_string())
            })?;
            record.period.close(rollover_out);
            Some(record.period.clone())
        } else {
            None
        };

        let opened = new_period.clone();
        data.insert(
            new_period.id,
            PeriodRecord {
                period: new_period,
                allocations,
            },
        );

        Ok((closed, opened))
    }

    /// Check that a period exists and its version matches the observation
    pub(crate) fn ensure_version(
        data: &PeriodMap,
        period_id: PeriodId,
        expected_version: u64,
    ) -> BudgetResult<()> {
        let record = data
            .get(&period_id)
            .ok_or_else(|| BudgetError::period_not_found(period_id.to_string()))?;

        if record.period.version != expected_version {
            return Err(BudgetError::Conflict(format!(
                "Period version is {} but the commit expected {}",
                record.period.version, expected_version
            )));
        }
        Ok(())
    }

    /// Apply an expense to a locked period table
    ///
    /// The delta only lands when the period's version still equals
    /// `expected_version`; otherwise a conflict is returned and nothing
    /// changes. When no allocation matches the category the period aggregates
    /// still update, mirroring uncategorized spending.
    pub(crate) fn apply_delta(
        data: &mut PeriodMap,
        period_id: PeriodId,
        expected_version: u64,
        category_id: CategoryId,
        amount: Money,
    ) -> BudgetResult<PeriodRecord> {
        Self::ensure_version(data, period_id, expected_version)?;

        let record = data
            .get_mut(&period_id)
            .ok_or_else(|| BudgetError::period_not_found(period_id.to_string()))?;

        record.period.apply_expense(amount);

        if let Some(allocation) = record
            .allocations
            .iter_mut()
            .find(|a| a.category_id == category_id)
        {
            allocation.apply_expense(amount);
        }

        Ok(record.clone())
    }

    /// Reverse a previously applied expense on a locked period table, with
    /// the same version check as [`apply_delta`](Self::apply_delta)
    pub(crate) fn revert_delta(
        data: &mut PeriodMap,
        period_id: PeriodId,
        expected_version: u64,
        category_id: CategoryId,
        amount: Money,
    ) -> BudgetResult<PeriodRecord> {
        Self::ensure_version(data, period_id, expected_version)?;

        let record = data
            .get_mut(&period_id)
            .ok_or_else(|| BudgetError::period_not_found(period_id.to_string()))?;

        record.period.revert_expense(amount);

        if let Some(allocation) = record
            .allocations
            .iter_mut()
            .find(|a| a.category_id == category_id)
        {
            allocation.revert_expense(amount);
        }

        Ok(record.clone())
    }

    /// Apply an expense of `amount` to a period and its matching allocation
    ///
    /// Returns the updated record.
    pub fn commit_expense_delta(
        &self,
        period_id: PeriodId,
        expected_version: u64,
        category_id: CategoryId,
        amount: Money,
    ) -> BudgetResult<PeriodRecord> {
        let mut data = self.lock_write()?;
        Self::apply_delta(&mut data, period_id, expected_version, category_id, amount)
    }

    /// Reverse an expense of `amount` on a period and its matching allocation
    pub fn commit_expense_reversal(
        &self,
        period_id: PeriodId,
        expected_version: u64,
        category_id: CategoryId,
        amount: Money,
    ) -> BudgetResult<PeriodRecord> {
        let mut data = self.lock_write()?;
        Self::revert_delta(&mut data, period_id, expected_version, category_id, amount)
    }

    /// Count stored periods
    pub fn count(&self) -> BudgetResult<usize> {
        let data = self.read_guard()?;

        Ok(data.len())
    }
}
