//! Read side of the ledger: the managed database's REST query interface.

use crate::config::Config;
use crate::errors::{Result, WalletError};
use crate::models::Transaction;
use crate::session::Session;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info};

#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Every transaction owned by the session's user, newest first.
    async fn fetch_transactions(&self, session: &Session) -> Result<Vec<Transaction>>;
}

pub struct RestStore {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl RestStore {
    pub fn new(config: &Config, http: reqwest::Client) -> Self {
        Self {
            http,
            url: format!("{}/rest/v1/{}", config.base_url(), config.transactions_table),
            api_key: config.api_key(),
        }
    }
}

#[async_trait]
impl TransactionStore for RestStore {
    async fn fetch_transactions(&self, session: &Session) -> Result<Vec<Transaction>> {
        debug!(url = %self.url, owner = %session.user_id, "fetching transactions");

        let mut req = self
            .http
            .get(&self.url)
            .query(&[
                ("select", "*".to_string()),
                ("user_id", format!("eq.{}", session.user_id)),
                ("order", "created_at.desc".to_string()),
            ])
            .bearer_auth(&session.access_token);
        if let Some(key) = &self.api_key {
            req = req.header("apikey", key);
        }
        let response = req.send().await?;

        let status = response.status();
        let body = response.text().await?;
        let transactions = parse_store_response(status, &body)?;

        info!(count = transactions.len(), "fetched transactions");
        Ok(transactions)
    }
}

#[derive(Debug, Deserialize)]
struct StoreError {
    message: Option<String>,
    error: Option<String>,
}

pub fn parse_store_response(status: StatusCode, body: &str) -> Result<Vec<Transaction>> {
    if status == StatusCode::UNAUTHORIZED {
        return Err(WalletError::AuthenticationRequired);
    }
    if !status.is_success() {
        let message = serde_json::from_str::<StoreError>(body)
            .ok()
            .and_then(|e| e.message.or(e.error))
            .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("query failed").to_string());
        return Err(WalletError::StoreRejected {
            status: status.as_u16(),
            message,
        });
    }
    serde_json::from_str(body).map_err(|e| WalletError::MalformedResponse(e.to_string()))
}
