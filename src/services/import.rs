//! Statement import service
//!
//! Bridges the CSV parsing pipeline and the period lifecycle: parses a
//! statement, then posts the rows the user confirmed (each with a category
//! assignment) to the active period. Row failures are collected rather than
//! aborting the batch.

use crate::error::BudgetResult;
use crate::import::{parse_statement, ParseResult, ParsedTransaction};
use crate::models::CategoryId;

use super::lifecycle::{PeriodLifecycleService, PostTransactionInput};

/// One parsed row confirmed for import, with its category assignment
#[derive(Debug, Clone)]
pub struct ImportSelection {
    pub transaction: ParsedTransaction,
    pub category_id: CategoryId,
    pub category_name: String,
}

/// Outcome of importing a batch of confirmed rows
#[derive(Debug, Clone, Default)]
pub struct ImportOutcome {
    /// Rows posted successfully
    pub imported: usize,
    /// Rows skipped because they were still marked excluded
    pub skipped: usize,
    /// Rows that failed to post
    pub failed: usize,
    /// One message per failed row
    pub errors: Vec<String>,
}

/// Service for importing bank statements
pub struct StatementImportService<'a> {
    lifecycle: &'a PeriodLifecycleService<'a>,
}

impl<'a> StatementImportService<'a> {
    /// Create a new import service
    pub fn new(lifecycle: &'a PeriodLifecycleService<'a>) -> Self {
        Self { lifecycle }
    }

    /// Parse statement content without posting anything
    pub fn parse(&self, content: &str) -> ParseResult {
        parse_statement(content)
    }

    /// Post a batch of confirmed rows to the active period
    ///
    /// Rows still flagged excluded are skipped; the caller clears the flag to
    /// force-include a row. A failing row does not stop the rest of the batch.
    pub fn import(&self, selections: Vec<ImportSelection>) -> BudgetResult<ImportOutcome> {
        let mut outcome = ImportOutcome::default();

        for selection in selections {
            let row = selection.transaction;
            if row.excluded {
                outcome.skipped += 1;
                continue;
            }

            let result = self.lifecycle.post_transaction(PostTransactionInput {
                category_id: selection.category_id,
                category_name: selection.category_name,
                kind: row.kind,
                amount: row.amount,
                description: row.description.clone(),
                date: row.date,
            });

            match result {
                Ok(_) => outcome.imported += 1,
                Err(e) => {
                    outcome.failed += 1;
                    outcome.errors.push(format!("{}: {}", row.description, e));
                }
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::BudgetPaths;
    use crate::import::BankProfile;
    use crate::models::{
        IncomeEntry, IncomeSourceId, Money, PaySchedule, TransactionKind,
    };
    use crate::services::lifecycle::{AllocationInput, CreatePeriodInput};
    use crate::storage::Storage;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = BudgetPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn open_january_period(service: &PeriodLifecycleService, category_id: CategoryId) {
        service
            .create_period(CreatePeriodInput {
                reference_date: NaiveDate::from_ymd_opt(2025, 1, 7).unwrap(),
                income: vec![IncomeEntry {
                    source_id: IncomeSourceId::new(),
                    source_name: "Salary".into(),
                    amount: Money::from_cents(200_000),
                }],
                allocations: vec![AllocationInput {
                    category_id,
                    category_name: "Groceries".into(),
                    category_color: "#4caf50".into(),
                    budgeted_amount: Money::from_cents(50_000),
                    note: None,
                }],
                apply_rollover: true,
            })
            .unwrap();
    }

    #[test]
    fn test_import_statement_end_to_end() {
        let (_temp, storage) = create_test_storage();
        let lifecycle = PeriodLifecycleService::new(&storage, PaySchedule::default());
        let service = StatementImportService::new(&lifecycle);

        let category_id = CategoryId::new();
        open_january_period(&lifecycle, category_id);

        let csv = "Date,Description,Withdrawals,Deposits,Balance\n\
                   01/10/2025,Grocery Store,54.32,,1000.00\n\
                   01/12/2025,INTERAC e-Transfer to John,100.00,,900.00";
        let parsed = service.parse(csv);
        assert_eq!(parsed.bank, BankProfile::Td);
        assert_eq!(parsed.transactions.len(), 2);

        let selections: Vec<ImportSelection> = parsed
            .transactions
            .into_iter()
            .map(|t| ImportSelection {
                transaction: t,
                category_id,
                category_name: "Groceries".into(),
            })
            .collect();

        let outcome = service.import(selections).unwrap();
        assert_eq!(outcome.imported, 1);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.failed, 0);

        let snapshot = lifecycle.active_snapshot().unwrap().unwrap();
        assert_eq!(snapshot.period.total_spent.cents(), 5432);
        assert_eq!(snapshot.allocations[0].spent_amount.cents(), 5432);
    }

    #[test]
    fn test_force_included_row_imports() {
        let (_temp, storage) = create_test_storage();
        let lifecycle = PeriodLifecycleService::new(&storage, PaySchedule::default());
        let service = StatementImportService::new(&lifecycle);

        let category_id = CategoryId::new();
        open_january_period(&lifecycle, category_id);

        let csv = "Date,Description,Withdrawals,Deposits,Balance\n\
                   01/12/2025,INTERAC e-Transfer to John,100.00,,900.00";
        let mut parsed = service.parse(csv);
        let mut row = parsed.transactions.remove(0);
        assert!(row.excluded);
        row.excluded = false;

        let outcome = service
            .import(vec![ImportSelection {
                transaction: row,
                category_id,
                category_name: "Transfers".into(),
            }])
            .unwrap();

        assert_eq!(outcome.imported, 1);
        assert_eq!(outcome.skipped, 0);
    }

    #[test]
    fn test_failures_reported_per_row() {
        let (_temp, storage) = create_test_storage();
        let lifecycle = PeriodLifecycleService::new(&storage, PaySchedule::default());
        let service = StatementImportService::new(&lifecycle);

        // No active period, so every row fails to post
        let csv = "Date,Description,Withdrawals,Deposits,Balance\n\
                   01/10/2025,Grocery Store,54.32,,1000.00";
        let parsed = service.parse(csv);

        let selections: Vec<ImportSelection> = parsed
            .transactions
            .into_iter()
            .map(|t| ImportSelection {
                transaction: t,
                category_id: CategoryId::new(),
                category_name: "Groceries".into(),
            })
            .collect();

        let outcome = service.import(selections).unwrap();
        assert_eq!(outcome.imported, 0);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].contains("Grocery Store"));
    }

    #[test]
    fn test_imported_kinds_follow_statement_signs() {
        let (_temp, storage) = create_test_storage();
        let lifecycle = PeriodLifecycleService::new(&storage, PaySchedule::default());
        let service = StatementImportService::new(&lifecycle);

        let category_id = CategoryId::new();
        open_january_period(&lifecycle, category_id);

        let csv = "Date,Description,Withdrawals,Deposits,Balance\n\
                   01/10/2025,Grocery Store,54.32,,1000.00\n\
                   01/11/2025,Payroll,,2500.00,3445.68";
        let parsed = service.parse(csv);

        let selections: Vec<ImportSelection> = parsed
            .transactions
            .into_iter()
            .map(|t| ImportSelection {
                transaction: t,
                category_id,
                category_name: "Groceries".into(),
            })
            .collect();

        let outcome = service.import(selections).unwrap();
        assert_eq!(outcome.imported, 2);

        // Only the expense moved the aggregates
        let snapshot = lifecycle.active_snapshot().unwrap().unwrap();
        assert_eq!(snapshot.period.total_spent.cents(), 5432);

        let page = storage
            .transactions
            .query(
                &crate::storage::TransactionFilter::new()
                    .period(snapshot.period.id)
                    .kind(TransactionKind::Income),
            )
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].amount.cents(), 250_000);
    }
}
