//! Client for the transaction request gateway: the remote endpoint that
//! authenticates a request and records the transaction.

use crate::config::Config;
use crate::errors::{Result, WalletError};
use crate::models::{Transaction, TransactionRequest};
use crate::session::Session;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info};

#[async_trait]
pub trait TransactionGateway: Send + Sync {
    /// Record `request` for the session's owner and return the created row.
    async fn submit(&self, session: &Session, request: &TransactionRequest) -> Result<Transaction>;
}

/// Gateway reached over HTTPS as a JSON `POST`.
pub struct HttpGateway {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpGateway {
    pub fn new(config: &Config, http: reqwest::Client) -> Self {
        Self {
            http,
            url: format!("{}{}", config.base_url(), config.gateway_path),
            api_key: config.api_key(),
        }
    }
}

#[async_trait]
impl TransactionGateway for HttpGateway {
    async fn submit(&self, session: &Session, request: &TransactionRequest) -> Result<Transaction> {
        debug!(url = %self.url, kind = %request.kind, amount = %request.amount, "gateway request");

        let mut req = self
            .http
            .post(&self.url)
            .bearer_auth(&session.access_token)
            .json(request);
        if let Some(key) = &self.api_key {
            req = req.header("apikey", key);
        }
        let response = req.send().await?;

        let status = response.status();
        let body = response.text().await?;
        let tx = parse_gateway_response(status, &body)?;

        info!(id = %tx.id, reference = ?tx.reference, status = ?tx.status, "gateway recorded transaction");
        Ok(tx)
    }
}

#[derive(Debug, Deserialize)]
struct GatewayEnvelope {
    #[serde(default)]
    success: bool,
    data: Option<Transaction>,
    error: Option<String>,
}

/// Map a gateway HTTP response onto the wallet's error taxonomy. Only a
/// `200` carrying a confirmed transaction counts as success.
pub fn parse_gateway_response(status: StatusCode, body: &str) -> Result<Transaction> {
    if status == StatusCode::UNAUTHORIZED {
        return Err(WalletError::AuthenticationRequired);
    }

    let envelope = serde_json::from_str::<GatewayEnvelope>(body);

    if status != StatusCode::OK {
        let message = envelope
            .ok()
            .and_then(|e| e.error)
            .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
        return Err(WalletError::GatewayRejected {
            status: status.as_u16(),
            message,
        });
    }

    let envelope = envelope.map_err(|e| WalletError::MalformedResponse(e.to_string()))?;
    match envelope {
        GatewayEnvelope {
            success: true,
            data: Some(tx),
            ..
        } => Ok(tx),
        GatewayEnvelope { error, .. } => Err(WalletError::GatewayRejected {
            status: status.as_u16(),
            message: error.unwrap_or_else(|| "gateway did not confirm the transaction".to_string()),
        }),
    }
}
