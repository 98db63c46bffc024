//! Transfer and payment exclusion classification
//!
//! Bank statements mix real spending with account-to-account noise: transfers,
//! credit card payments, and moves between a user's own accounts. These rows
//! are flagged for pre-deselection on import, never dropped outright.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Why a parsed transaction was pre-deselected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExcludeReason {
    Transfer,
    CreditCardPayment,
    InternalTransfer,
}

impl fmt::Display for ExcludeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExcludeReason::Transfer => write!(f, "Transfer"),
            ExcludeReason::CreditCardPayment => write!(f, "Credit Card Payment"),
            ExcludeReason::InternalTransfer => write!(f, "Internal Transfer"),
        }
    }
}

static TRANSFER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)transfer\s*(to|from|between)",
        r"(?i)tfr\s*(to|from)",
        r"(?i)e-?transfer",
        r"(?i)interac\s*e-?transfer",
        r"(?i)internal\s*transfer",
        r"(?i)xfer",
        r"(?i)moving\s*money",
    ])
});

static CC_PAYMENT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)payment\s*-?\s*thank\s*you",
        r"(?i)payment\s*received",
        r"(?i)cc\s*payment",
        r"(?i)credit\s*card\s*payment",
        r"(?i)online\s*payment",
        r"(?i)payment\s*from\s*(chequing|savings|checking)",
        r"(?i)pymt",
        r"(?i)autopay",
        r"(?i)pre-authorized\s*payment",
        r"(?i)pmt\s*rcvd",
    ])
});

static INTERNAL_ACCOUNT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)^(to|from)\s*(chequing|savings|checking|tfsa|rrsp)",
        r"(?i)account\s*transfer",
        r"(?i)between\s*accounts",
    ])
});

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
}

fn matches_any(patterns: &[Regex], description: &str) -> bool {
    patterns.iter().any(|re| re.is_match(description))
}

/// Classify a description against the exclusion pattern families
///
/// Checked in priority order: transfer, then credit card payment, then
/// internal account transfer. First match wins.
pub fn exclude_reason(description: &str) -> Option<ExcludeReason> {
    if matches_any(&TRANSFER_PATTERNS, description) {
        return Some(ExcludeReason::Transfer);
    }
    if matches_any(&CC_PAYMENT_PATTERNS, description) {
        return Some(ExcludeReason::CreditCardPayment);
    }
    if matches_any(&INTERNAL_ACCOUNT_PATTERNS, description) {
        return Some(ExcludeReason::InternalTransfer);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_patterns() {
        assert_eq!(
            exclude_reason("INTERAC e-Transfer to John"),
            Some(ExcludeReason::Transfer)
        );
        assert_eq!(
            exclude_reason("TFR TO 1234567"),
            Some(ExcludeReason::Transfer)
        );
        assert_eq!(exclude_reason("XFER SAVINGS"), Some(ExcludeReason::Transfer));
    }

    #[test]
    fn test_cc_payment_patterns() {
        assert_eq!(
            exclude_reason("PAYMENT - THANK YOU"),
            Some(ExcludeReason::CreditCardPayment)
        );
        assert_eq!(
            exclude_reason("AUTOPAY PYMT"),
            Some(ExcludeReason::CreditCardPayment)
        );
        assert_eq!(
            exclude_reason("Pre-Authorized Payment Visa"),
            Some(ExcludeReason::CreditCardPayment)
        );
    }

    #[test]
    fn test_internal_account_patterns() {
        assert_eq!(
            exclude_reason("To Savings Account"),
            Some(ExcludeReason::InternalTransfer)
        );
        assert_eq!(
            exclude_reason("from TFSA contribution"),
            Some(ExcludeReason::InternalTransfer)
        );
    }

    #[test]
    fn test_transfer_wins_over_cc_payment() {
        // Matches both a transfer pattern and a payment pattern; transfer is
        // checked first.
        assert_eq!(
            exclude_reason("e-Transfer payment received"),
            Some(ExcludeReason::Transfer)
        );
    }

    #[test]
    fn test_ordinary_descriptions_pass() {
        assert_eq!(exclude_reason("Grocery Store"), None);
        assert_eq!(exclude_reason("Coffee Shop"), None);
        assert_eq!(exclude_reason("Monthly rent"), None);
    }
}
