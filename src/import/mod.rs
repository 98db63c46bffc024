//! Bank statement CSV import pipeline
//!
//! A single stateless pass over an exported statement: tokenize, detect the
//! bank profile from the header row, extract rows through the profile's
//! column map, normalize dates and amounts, classify transfer/payment rows
//! for exclusion, and sort newest-first.
//!
//! Malformed rows never abort the import; they are skipped. The only fatal
//! condition is a file too short to contain any data.

pub mod exclude;
pub mod profile;

use chrono::NaiveDate;

use crate::models::{Money, TransactionKind};

pub use exclude::ExcludeReason;
pub use profile::BankProfile;

use exclude::exclude_reason;
use profile::{header_is_data_row, AmountColumns, ColumnMap};

/// One statement row, normalized but not yet persisted
///
/// Becomes a real `Transaction` only when the user confirms the import.
#[derive(Debug, Clone)]
pub struct ParsedTransaction {
    pub date: NaiveDate,
    pub description: String,
    /// Always positive; direction is in `kind`
    pub amount: Money,
    pub kind: TransactionKind,
    /// The raw cells this row came from, for display in the review UI
    pub original_row: Vec<String>,
    /// Pre-deselected on import when true; still visible and toggleable
    pub excluded: bool,
    pub exclude_reason: Option<ExcludeReason>,
}

/// Outcome of parsing one statement file
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub bank: BankProfile,
    /// Sorted by date descending
    pub transactions: Vec<ParsedTransaction>,
    pub errors: Vec<String>,
}

/// Parse a full bank statement CSV already read into memory
pub fn parse_statement(content: &str) -> ParseResult {
    let rows = tokenize(content);

    if rows.len() < 2 {
        return ParseResult {
            bank: BankProfile::Generic,
            transactions: Vec::new(),
            errors: vec!["CSV file is empty or has no data rows".to_string()],
        };
    }

    let header = &rows[0];
    let bank = BankProfile::detect(header);
    let map = bank.column_map(header);

    // Headerless exports start straight into data, so row 0 is a row too
    let data_start = if header_is_data_row(header) { 0 } else { 1 };

    let mut transactions: Vec<ParsedTransaction> = rows[data_start..]
        .iter()
        .filter_map(|row| extract_row(row, &map))
        .collect();

    transactions.sort_by(|a, b| b.date.cmp(&a.date));

    ParseResult {
        bank,
        transactions,
        errors: Vec::new(),
    }
}

/// Extract one data row through a profile's column map
///
/// Returns None for rows that are too short, have an unparseable date, or
/// net out to a zero amount.
fn extract_row(row: &[String], map: &ColumnMap) -> Option<ParsedTransaction> {
    if row.len() < 2 {
        return None;
    }

    let date = parse_date(field(row, map.date, 0))?;

    let mut description = field(row, map.description, 1).trim().to_string();
    if let Some(idx) = map.description2 {
        let extra = cell(row, idx).trim();
        if !extra.is_empty() {
            description.push(' ');
            description.push_str(extra);
        }
    }

    let (amount, kind) = match &map.amounts {
        AmountColumns::DebitCredit { debit, credit } => {
            let debit = parse_amount(cell(row, *debit));
            let credit = parse_amount(cell(row, *credit));
            if debit.is_positive() {
                (debit, TransactionKind::Expense)
            } else {
                (credit, TransactionKind::Income)
            }
        }
        AmountColumns::Signed {
            amount,
            charges_positive,
        } => {
            let value = parse_amount(field(row, *amount, 2));
            let expense = if *charges_positive {
                value.is_positive()
            } else {
                value.is_negative()
            };
            let kind = if expense {
                TransactionKind::Expense
            } else {
                TransactionKind::Income
            };
            (value, kind)
        }
        AmountColumns::Probe => probe_amount(row, map.date)?,
    };

    if amount.is_zero() {
        return None;
    }

    let reason = exclude_reason(&description);

    Some(ParsedTransaction {
        date,
        description,
        amount: amount.abs(),
        kind,
        original_row: row.to_vec(),
        excluded: reason.is_some(),
        exclude_reason: reason,
    })
}

/// Find the first non-zero numeric cell when no amount header was recognized
fn probe_amount(row: &[String], date_col: usize) -> Option<(Money, TransactionKind)> {
    for (idx, raw) in row.iter().enumerate() {
        if idx == date_col {
            continue;
        }
        let value = parse_amount(raw);
        if !value.is_zero() {
            let kind = if value.is_negative() {
                TransactionKind::Expense
            } else {
                TransactionKind::Income
            };
            return Some((value, kind));
        }
    }
    None
}

/// Split statement text into trimmed rows, dropping blank lines
///
/// Comma-delimited with RFC4180 double-quote escaping; unreadable records are
/// skipped rather than failing the whole file.
fn tokenize(content: &str) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records().flatten() {
        let row: Vec<String> = record.iter().map(|s| s.to_string()).collect();
        if row.iter().all(|c| c.is_empty()) {
            continue;
        }
        rows.push(row);
    }
    rows
}

/// Parse a statement date in any of the formats banks actually ship
pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != '\'' && *c != '"').collect();
    if cleaned.is_empty() {
        return None;
    }

    for format in ["%m/%d/%Y", "%Y-%m-%d", "%b %d, %Y", "%b %d %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(&cleaned, format) {
            return Some(date);
        }
    }
    None
}

/// Parse an amount cell, tolerating currency symbols, thousands separators,
/// and accounting-style parenthesized negatives; unparseable cells are zero
pub(crate) fn parse_amount(raw: &str) -> Money {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '(' | ')'))
        .collect();

    if cleaned.is_empty() || cleaned == "-" {
        return Money::zero();
    }

    let (negative, value) = if cleaned.starts_with('(') && cleaned.ends_with(')') {
        (true, &cleaned[1..cleaned.len() - 1])
    } else if let Some(stripped) = cleaned.strip_prefix('-') {
        (true, stripped)
    } else {
        (false, cleaned.as_str())
    };

    match Money::parse(value) {
        Ok(amount) => {
            let amount = amount.abs();
            if negative {
                -amount
            } else {
                amount
            }
        }
        Err(_) => Money::zero(),
    }
}

/// Cell by index, empty string when the row is short
fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

/// Mapped cell, falling back to a fixed position when empty or missing
fn field<'a>(row: &'a [String], idx: usize, fallback: usize) -> &'a str {
    let value = cell(row, idx);
    if value.is_empty() {
        cell(row, fallback)
    } else {
        value
    }
}
