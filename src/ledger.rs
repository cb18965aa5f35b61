//! Balance derivation: a fold over the fetched ledger.
//!
//! Nothing here touches the network or keeps state; callers fetch the
//! transaction list and hand it in.

use crate::errors::{Result, WalletError};
use crate::models::{Transaction, TxKind, TxStatus};
use rust_decimal::Decimal;
use tracing::warn;

/// Balance = completed credits − completed debits.
///
/// Non-completed rows are skipped. Rows with an unrecognised kind are
/// skipped with a warning rather than failing the whole ledger.
pub fn calculate_balance(transactions: &[Transaction]) -> Decimal {
    transactions
        .iter()
        .filter(|tx| tx.is_completed())
        .fold(Decimal::ZERO, |acc, tx| match tx.kind.sign() {
            1 => acc + tx.amount,
            -1 => acc - tx.amount,
            _ => {
                warn!(id = %tx.id, kind = %tx.kind, "skipping unrecognised transaction kind");
                acc
            }
        })
}

/// Like [`calculate_balance`], but refuses a completed row whose kind is
/// not recognised.
pub fn try_calculate_balance(transactions: &[Transaction]) -> Result<Decimal> {
    if let Some(tx) = transactions
        .iter()
        .find(|tx| tx.is_completed() && matches!(tx.kind, TxKind::Other(_)))
    {
        return Err(WalletError::UnrecognizedKind(tx.kind.to_string()));
    }
    Ok(calculate_balance(transactions))
}

/// Per-kind breakdown of a ledger.
///
/// * `deposits`, `withdrawals`, `payments`, `refunds` – completed totals
/// * `pending`, `failed` – row counts by status
/// * `balance` – same value [`calculate_balance`] returns
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LedgerSummary {
    pub deposits: Decimal,
    pub withdrawals: Decimal,
    pub payments: Decimal,
    pub refunds: Decimal,
    pub pending: usize,
    pub failed: usize,
    pub balance: Decimal,
}

impl LedgerSummary {
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let mut summary = Self::default();
        for tx in transactions {
            match tx.status {
                TxStatus::Completed => {}
                TxStatus::Pending => {
                    summary.pending += 1;
                    continue;
                }
                TxStatus::Failed => {
                    summary.failed += 1;
                    continue;
                }
                TxStatus::Unknown => continue,
            }
            match tx.kind {
                TxKind::Deposit => summary.deposits += tx.amount,
                TxKind::Withdrawal => summary.withdrawals += tx.amount,
                TxKind::Payment => summary.payments += tx.amount,
                TxKind::Refund => summary.refunds += tx.amount,
                TxKind::Other(_) => {}
            }
        }
        summary.balance = summary.deposits + summary.refunds - summary.withdrawals - summary.payments;
        summary
    }
}
