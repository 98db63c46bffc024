//! Bank profile detection and column mapping
//!
//! Each supported bank export is one variant of a closed profile set. A
//! single ordered-priority classifier inspects the header row, and each
//! profile is a pure headers-to-column-map function; the extraction loop in
//! the parent module is shared by all profiles.

use std::fmt;

/// A column-layout and sign-convention template for one bank's CSV export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankProfile {
    Td,
    Rbc,
    Amex,
    Generic,
}

impl fmt::Display for BankProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BankProfile::Td => write!(f, "TD"),
            BankProfile::Rbc => write!(f, "RBC"),
            BankProfile::Amex => write!(f, "Amex"),
            BankProfile::Generic => write!(f, "Generic"),
        }
    }
}

/// Where each field lives in a data row
#[derive(Debug, Clone)]
pub(crate) struct ColumnMap {
    pub date: usize,
    pub description: usize,
    /// RBC splits descriptions across two columns
    pub description2: Option<usize>,
    pub amounts: AmountColumns,
}

/// How a row's amount and direction are encoded
#[derive(Debug, Clone)]
pub(crate) enum AmountColumns {
    /// Separate outflow/inflow columns: a non-zero debit is an expense,
    /// otherwise a non-zero credit is income
    DebitCredit { debit: usize, credit: usize },
    /// One signed amount column. Banks disagree on the sign: most use
    /// negative-for-expense, Amex inverts it (a positive charge is an
    /// expense, a negative credit or payment is income)
    Signed { amount: usize, charges_positive: bool },
    /// No recognizable amount header; probe for the first non-zero numeric
    /// cell in each row
    Probe,
}

impl BankProfile {
    /// Classify a header row into a profile
    ///
    /// Checked in priority order; anything unrecognized falls through to
    /// `Generic` rather than guessing.
    pub fn detect(header: &[String]) -> Self {
        let lower = lowercase(header);
        let joined = lower.join(",");

        // TD: withdrawal/deposit columns, debit/credit alongside a balance,
        // or the degenerate headerless "accountactivity" export
        if (joined.contains("withdrawal") && joined.contains("deposit"))
            || (joined.contains("debit") && joined.contains("credit") && joined.contains("balance"))
            || (lower.len() == 1 && joined.contains("accountactivity"))
            || header_is_data_row(header)
        {
            return BankProfile::Td;
        }

        if joined.contains("account type") || joined.contains("description 1") {
            return BankProfile::Rbc;
        }

        if joined.contains("card member")
            || (joined.contains("reference") && joined.contains("amount"))
        {
            return BankProfile::Amex;
        }

        // Amex exports are also recognizable by their bare 3-5 column shape
        if (3..=5).contains(&lower.len())
            && lower.iter().any(|h| h.contains("date"))
            && lower.iter().any(|h| h.contains("amount"))
        {
            return BankProfile::Amex;
        }

        BankProfile::Generic
    }

    /// Locate this profile's columns in the header row
    pub(crate) fn column_map(&self, header: &[String]) -> ColumnMap {
        let lower = lowercase(header);

        match self {
            BankProfile::Td => {
                // Headerless export: fixed positions 0=date, 1=description,
                // 2=debit, 3=credit
                ColumnMap {
                    date: find(&lower, &["date"]).unwrap_or(0),
                    description: find(&lower, &["description"]).unwrap_or(1),
                    description2: None,
                    amounts: AmountColumns::DebitCredit {
                        debit: find(&lower, &["withdrawal", "debit"]).unwrap_or(2),
                        credit: find(&lower, &["deposit", "credit"]).unwrap_or(3),
                    },
                }
            }
            BankProfile::Rbc => {
                let withdrawal = find(&lower, &["withdrawal"]);
                let deposit = find(&lower, &["deposit"]);
                let amounts = match (withdrawal, deposit) {
                    (Some(debit), Some(credit)) => AmountColumns::DebitCredit { debit, credit },
                    _ => AmountColumns::Signed {
                        // RBC lists a currency-qualified amount column
                        amount: find(&lower, &["cad"])
                            .or_else(|| find(&lower, &["amount"]))
                            .unwrap_or(2),
                        charges_positive: false,
                    },
                };
                ColumnMap {
                    date: find(&lower, &["date"]).unwrap_or(0),
                    description: lower
                        .iter()
                        .position(|h| h == "description 1")
                        .or_else(|| find(&lower, &["description"]))
                        .unwrap_or(1),
                    description2: lower.iter().position(|h| h == "description 2"),
                    amounts,
                }
            }
            BankProfile::Amex => ColumnMap {
                date: find(&lower, &["date"]).unwrap_or(0),
                description: find(&lower, &["description"]).unwrap_or(1),
                description2: None,
                amounts: AmountColumns::Signed {
                    amount: find(&lower, &["amount"]).unwrap_or(2),
                    charges_positive: true,
                },
            },
            BankProfile::Generic => {
                let debit = find(&lower, &["debit", "withdrawal", "out"]);
                let credit = find(&lower, &["credit", "deposit", "in"]);
                let amounts = match (debit, credit) {
                    (Some(debit), Some(credit)) => AmountColumns::DebitCredit { debit, credit },
                    _ => match find(&lower, &["amount"]) {
                        Some(amount) => AmountColumns::Signed {
                            amount,
                            charges_positive: false,
                        },
                        None => AmountColumns::Probe,
                    },
                };
                ColumnMap {
                    date: find(&lower, &["date"]).unwrap_or(0),
                    description: find(&lower, &["description", "memo", "payee"]).unwrap_or(1),
                    description2: None,
                    amounts,
                }
            }
        }
    }
}

/// Check whether the supposed header row is actually transaction data
/// (headerless exports start straight into rows)
pub(crate) fn header_is_data_row(header: &[String]) -> bool {
    let Some(first) = header.first() else {
        return false;
    };
    super::parse_date(first).is_some() && header.len() >= 4
}

fn lowercase(header: &[String]) -> Vec<String> {
    header.iter().map(|h| h.trim().to_lowercase()).collect()
}

/// First column whose lowercased header contains any of the needles
fn find(lower: &[String], needles: &[&str]) -> Option<usize> {
    lower
        .iter()
        .position(|h| needles.iter().any(|n| h.contains(n)))
}
