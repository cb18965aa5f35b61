//! Common domain types: transactions as the store returns them and the
//! request body the gateway accepts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Transaction kinds found in the ledger.
///
/// Anything the store sends that we do not recognise lands in `Other`
/// with the raw value kept, so deserialising a ledger never fails on kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TxKind {
    Deposit,
    Withdrawal,
    Payment,
    Refund,
    Other(String),
}

impl TxKind {
    /// Direction of the kind in the balance fold: credit, debit or nothing.
    pub fn sign(&self) -> i8 {
        match self {
            TxKind::Deposit | TxKind::Refund => 1,
            TxKind::Withdrawal | TxKind::Payment => -1,
            TxKind::Other(_) => 0,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TxKind::Deposit => "deposit",
            TxKind::Withdrawal => "withdrawal",
            TxKind::Payment => "payment",
            TxKind::Refund => "refund",
            TxKind::Other(raw) => raw,
        }
    }
}

impl From<String> for TxKind {
    fn from(raw: String) -> Self {
        let key = raw.trim().to_ascii_lowercase();
        match key.as_str() {
            "deposit" => TxKind::Deposit,
            "withdrawal" => TxKind::Withdrawal,
            "payment" => TxKind::Payment,
            "refund" => TxKind::Refund,
            _ => TxKind::Other(raw),
        }
    }
}

impl From<TxKind> for String {
    fn from(kind: TxKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settlement state. Only `Completed` rows count towards a balance.
///
/// Parsed like [`TxKind`]: case-insensitive, and anything unrecognised
/// becomes `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum TxStatus {
    Pending,
    Completed,
    Failed,
    Unknown,
}

impl From<String> for TxStatus {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => TxStatus::Pending,
            "completed" => TxStatus::Completed,
            "failed" => TxStatus::Failed,
            _ => TxStatus::Unknown,
        }
    }
}

/// One ledger row, as read from the transaction store.
///
/// The core never builds or edits these; they come from the store or as
/// the gateway's echo of a freshly recorded request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    /// Wallet owner.
    #[serde(rename = "user_id")]
    pub owner_id: String,
    #[serde(rename = "type")]
    pub kind: TxKind,
    /// Always positive; the kind carries the direction.
    pub amount: Decimal,
    /// Payment channel label (e.g. a mobile-money provider).
    #[serde(default, alias = "payment_method")]
    pub method: Option<String>,
    pub status: TxStatus,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Present only for peer-directed transactions.
    #[serde(default)]
    pub recipient_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn is_completed(&self) -> bool {
        self.status == TxStatus::Completed
    }
}

/// What a client may ask the gateway to record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Deposit,
    Withdrawal,
}

impl RequestKind {
    fn label(self) -> &'static str {
        match self {
            RequestKind::Deposit => "Deposit",
            RequestKind::Withdrawal => "Withdrawal",
        }
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<RequestKind> for TxKind {
    fn from(kind: RequestKind) -> Self {
        match kind {
            RequestKind::Deposit => TxKind::Deposit,
            RequestKind::Withdrawal => TxKind::Withdrawal,
        }
    }
}

/// Body of a gateway `POST`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRequest {
    /// Sent as a JSON number.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: RequestKind,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TransactionRequest {
    /// Build a request, filling in `"<Kind> via <method>"` when no
    /// description is given.
    pub fn new(
        kind: RequestKind,
        amount: Decimal,
        method: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        let method = method.into();
        let description = description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| format!("{kind} via {method}"));
        Self {
            amount,
            kind,
            method,
            description: Some(description),
        }
    }
}
