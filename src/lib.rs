//! Public API for the Huduma wallet crate.

pub mod auth;
pub mod config;
pub mod context;
pub mod errors;
pub mod gateway;
pub mod ledger;
pub mod models;
pub mod session;
pub mod statement;
pub mod store;
pub mod wallet;

pub use crate::config::Config;
pub use context::WalletContext;
pub use errors::{Result, WalletError};
pub use ledger::{LedgerSummary, calculate_balance, try_calculate_balance};
pub use models::{RequestKind, Transaction, TransactionRequest, TxKind, TxStatus};
pub use session::Session;
pub use wallet::{Wallet, parse_amount};
