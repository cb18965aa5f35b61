//! Error taxonomy for wallet operations, plus the `Result<T>` alias used
//! throughout the crate.

use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, WalletError>;

const INSUFFICIENT_FUNDS_MESSAGE: &str = "Insufficient balance for this withdrawal.";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WalletError {
    #[error("authentication required")]
    AuthenticationRequired,

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Local pre-check against the last fetched balance. Advisory only.
    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: Decimal, available: Decimal },

    #[error("gateway rejected request ({status}): {message}")]
    GatewayRejected { status: u16, message: String },

    #[error("transaction store rejected query ({status}): {message}")]
    StoreRejected { status: u16, message: String },

    #[error("sign-in rejected: {0}")]
    SignInRejected(String),

    #[error("network failure: {0}")]
    NetworkFailure(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("unrecognized transaction kind: {0}")]
    UnrecognizedKind(String),
}

impl WalletError {
    /// True for the local pre-check and for a gateway refusal on the same
    /// grounds; callers should not distinguish the two.
    pub fn is_insufficient_funds(&self) -> bool {
        match self {
            WalletError::InsufficientBalance { .. } => true,
            WalletError::GatewayRejected { message, .. } => {
                let message = message.to_ascii_lowercase();
                message.contains("insufficient")
            }
            _ => false,
        }
    }

    /// Short text suitable for showing to the wallet owner.
    pub fn user_message(&self) -> String {
        if self.is_insufficient_funds() {
            return INSUFFICIENT_FUNDS_MESSAGE.to_string();
        }
        match self {
            WalletError::AuthenticationRequired => "Please sign in to continue.".to_string(),
            WalletError::InvalidAmount(_) => "Please enter an amount greater than zero.".to_string(),
            WalletError::GatewayRejected { message, .. } => message.clone(),
            WalletError::SignInRejected(message) => message.clone(),
            WalletError::NetworkFailure(_) => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for WalletError {
    fn from(err: reqwest::Error) -> Self {
        WalletError::NetworkFailure(err.to_string())
    }
}
