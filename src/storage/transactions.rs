//! Transaction repository for JSON storage
//!
//! Manages loading and saving transactions to transactions.json

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{RwLock, RwLockWriteGuard};

use crate::error::{BudgetError, BudgetResult};
use crate::models::{CategoryId, PeriodId, Transaction, TransactionId, TransactionKind};

use super::file_io::{read_json, stage_json, StagedJson};

/// Serializable transaction data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct TransactionData {
    transactions: Vec<Transaction>,
}

/// Query filter for listing transactions
///
/// Unset fields match everything. Results are always newest first.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub period_id: Option<PeriodId>,
    pub category_id: Option<CategoryId>,
    pub kind: Option<TransactionKind>,
    /// Page size; None returns everything
    pub limit: Option<usize>,
    /// Number of matching transactions to skip before the page starts
    pub offset: usize,
}

impl TransactionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn period(mut self, period_id: PeriodId) -> Self {
        self.period_id = Some(period_id);
        self
    }

    pub fn category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    fn matches(&self, txn: &Transaction) -> bool {
        if let Some(period_id) = self.period_id {
            if txn.period_id != period_id {
                return false;
            }
        }
        if let Some(category_id) = self.category_id {
            if txn.category_id != category_id {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if txn.kind != kind {
                return false;
            }
        }
        true
    }
}

/// One page of transaction query results
#[derive(Debug, Clone)]
pub struct TransactionPage {
    pub items: Vec<Transaction>,
    /// True when more matching transactions exist past this page
    pub has_more: bool,
}

/// Repository for transaction persistence with a per-period index
pub struct TransactionRepository {
    path: PathBuf,
    data: RwLock<HashMap<TransactionId, Transaction>>,
    /// Index: period_id -> transaction_ids
    by_period: RwLock<HashMap<PeriodId, Vec<TransactionId>>>,
}

/// Both transaction tables held under their write locks
///
/// Keeps the record map and the per-period index mutating in step while the
/// storage coordinator commits a posting or removal.
pub(crate) struct TransactionTables<'a> {
    data: RwLockWriteGuard<'a, HashMap<TransactionId, Transaction>>,
    by_period: RwLockWriteGuard<'a, HashMap<PeriodId, Vec<TransactionId>>>,
}

impl TransactionTables<'_> {
    pub(crate) fn get(&self, id: TransactionId) -> Option<&Transaction> {
        self.data.get(&id)
    }

    pub(crate) fn insert(&mut self, txn: Transaction) {
        self.by_period.entry(txn.period_id).or_default().push(txn.id);
        self.data.insert(txn.id, txn);
    }

    pub(crate) fn remove(&mut self, id: TransactionId) -> Option<Transaction> {
        let txn = self.data.remove(&id)?;
        if let Some(ids) = self.by_period.get_mut(&txn.period_id) {
            ids.retain(|&tid| tid != id);
        }
        Some(txn)
    }

    /// The record map, for staging to disk
    pub(crate) fn records(&self) -> &HashMap<TransactionId, Transaction> {
        &self.data
    }
}

impl TransactionRepository {
    /// Create a new transaction repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
            by_period: RwLock::new(HashMap::new()),
        }
    }

    /// Load transactions from disk and build the period index
    pub fn load(&self) -> BudgetResult<()> {
        let file_data: TransactionData = read_json(&self.path)?;

        let mut data = self
            .data
            .write()
            .map_err(|e| BudgetError::Storage(format!("Failed to acquire write lock: {}", e)))?;
        let mut by_period = self
            .by_period
            .write()
            .map_err(|e| BudgetError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        data.clear();
        by_period.clear();

        for txn in file_data.transactions {
            by_period.entry(txn.period_id).or_default().push(txn.id);
            data.insert(txn.id, txn);
        }

        Ok(())
    }

    /// Take both transaction tables' write locks
    pub(crate) fn lock_write(&self) -> BudgetResult<TransactionTables<'_>> {
        let data = self
            .data
            .write()
            .map_err(|e| BudgetError::Storage(format!("Failed to acquire write lock: {}", e)))?;
        let by_period = self
            .by_period
            .write()
            .map_err(|e| BudgetError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        Ok(TransactionTables { data, by_period })
    }

    /// Stage the given record map for disk, newest first
    pub(crate) fn stage(
        &self,
        data: &HashMap<TransactionId, Transaction>,
    ) -> BudgetResult<StagedJson> {
        let mut transactions: Vec<_> = data.values().cloned().collect();
        transactions.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));

        stage_json(&self.path, &TransactionData { transactions })
    }

    /// Save transactions to disk, newest first
    pub fn save(&self) -> BudgetResult<()> {
        let staged = {
            let data = self
                .data
                .read()
                .map_err(|e| BudgetError::Storage(format!("Failed to acquire read lock: {}", e)))?;
            self.stage(&data)?
        };
        staged.commit()
    }

    /// Get a transaction by ID
    pub fn get(&self, id: TransactionId) -> BudgetResult<Option<Transaction>> {
        let data = self
            .data
            .read()
            .map_err(|e| BudgetError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.get(&id).cloned())
    }

    /// Insert a new transaction
    pub fn insert(&self, txn: Transaction) -> BudgetResult<()> {
        let mut tables = self.lock_write()?;
        tables.insert(txn);
        Ok(())
    }

    /// Remove a transaction, returning it when it existed
    pub fn remove(&self, id: TransactionId) -> BudgetResult<Option<Transaction>> {
        let mut tables = self.lock_write()?;
        Ok(tables.remove(id))
    }

    /// Query transactions matching a filter, newest first
    ///
    /// Fetches one row past the page size to decide `has_more` without a
    /// second pass.
    pub fn query(&self, filter: &TransactionFilter) -> BudgetResult<TransactionPage> {
        let data = self
            .data
            .read()
            .map_err(|e| BudgetError::Storage(format!("Failed to acquire read lock: {}", e)))?;
        let by_period = self
            .by_period
            .read()
            .map_err(|e| BudgetError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        // Walk the period index when a period is given, the whole map otherwise
        let mut matched: Vec<Transaction> = match filter.period_id {
            Some(period_id) => by_period
                .get(&period_id)
                .map(|v| v.as_slice())
                .unwrap_or(&[])
                .iter()
                .filter_map(|id| data.get(id))
                .filter(|t| filter.matches(t))
                .cloned()
                .collect(),
            None => data.values().filter(|t| filter.matches(t)).cloned().collect(),
        };

        matched.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));

        let page: Vec<Transaction> = match filter.limit {
            Some(limit) => matched
                .into_iter()
                .skip(filter.offset)
                .take(limit + 1)
                .collect(),
            None => matched.into_iter().skip(filter.offset).collect(),
        };

        let (items, has_more) = match filter.limit {
            Some(limit) if page.len() > limit => (page[..limit].to_vec(), true),
            _ => (page, false),
        };

        Ok(TransactionPage { items, has_more })
    }

    /// Count stored transactions
    pub fn count(&self) -> BudgetResult<usize> {
        let data = self
            .data
            .read()
            .map_err(|e| BudgetError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, TransactionRepository) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("transactions.json");
        let repo = TransactionRepository::new(path);
        (temp_dir, repo)
    }

    fn txn(period_id: PeriodId, day: u32, cents: i64) -> Transaction {
        Transaction::new(
            period_id,
            CategoryId::new(),
            "Groceries",
            TransactionKind::Expense,
            Money::from_cents(cents),
            "Grocery Store",
            NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
        )
    }

    #[test]
    fn test_empty_load() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_insert_and_get() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let t = txn(PeriodId::new(), 15, 5432);
        let id = t.id;
        repo.insert(t).unwrap();

        let retrieved = repo.get(id).unwrap().unwrap();
        assert_eq!(retrieved.amount.cents(), 5432);
    }

    #[test]
    fn test_query_by_period_newest_first() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let period1 = PeriodId::new();
        let period2 = PeriodId::new();

        repo.insert(txn(period1, 3, 100)).unwrap();
        repo.insert(txn(period1, 12, 200)).unwrap();
        repo.insert(txn(period2, 20, 300)).unwrap();

        let page = repo
            .query(&TransactionFilter::new().period(period1))
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(!page.has_more);
        assert_eq!(page.items[0].amount.cents(), 200);
        assert_eq!(page.items[1].amount.cents(), 100);
    }

    #[test]
    fn test_query_by_kind() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let period = PeriodId::new();
        repo.insert(txn(period, 5, 100)).unwrap();

        let mut income = txn(period, 6, 250_000);
        income.kind = TransactionKind::Income;
        repo.insert(income).unwrap();

        let page = repo
            .query(&TransactionFilter::new().period(period).kind(TransactionKind::Income))
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].amount.cents(), 250_000);
    }

    #[test]
    fn test_query_pagination() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let period = PeriodId::new();
        for day in 1..=5 {
            repo.insert(txn(period, day, day as i64 * 100)).unwrap();
        }

        let first = repo
            .query(&TransactionFilter::new().period(period).limit(2))
            .unwrap();
        assert_eq!(first.items.len(), 2);
        assert!(first.has_more);
        assert_eq!(first.items[0].date.to_string(), "2025-01-05");

        let last = repo
            .query(&TransactionFilter::new().period(period).limit(3).offset(2))
            .unwrap();
        assert_eq!(last.items.len(), 3);
        assert!(!last.has_more);
    }

    #[test]
    fn test_remove() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let period = PeriodId::new();
        let t = txn(period, 15, 5000);
        let id = t.id;
        repo.insert(t).unwrap();

        let removed = repo.remove(id).unwrap().unwrap();
        assert_eq!(removed.amount.cents(), 5000);
        assert_eq!(repo.count().unwrap(), 0);
        assert!(repo.remove(id).unwrap().is_none());

        let page = repo
            .query(&TransactionFilter::new().period(period))
            .unwrap();
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_save_and_reload() {
        let (temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let period = PeriodId::new();
        let t = txn(period, 15, 5000);
        let id = t.id;
        repo.insert(t).unwrap();
        repo.save().unwrap();

        let repo2 = TransactionRepository::new(temp_dir.path().join("transactions.json"));
        repo2.load().unwrap();

        assert_eq!(repo2.count().unwrap(), 1);
        let retrieved = repo2.get(id).unwrap().unwrap();
        assert_eq!(retrieved.amount.cents(), 5000);

        // The period index is rebuilt on load
        let page = repo2
            .query(&TransactionFilter::new().period(period))
            .unwrap();
        assert_eq!(page.items.len(), 1);
    }
}
