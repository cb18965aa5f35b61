//! Password sign-in against the backend's token endpoint.

use crate::config::Config;
use crate::errors::{Result, WalletError};
use crate::session::Session;
use chrono::{DateTime, Duration, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::info;

pub struct AuthClient {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    user: TokenUser,
}

#[derive(Deserialize)]
struct TokenUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Deserialize)]
struct TokenError {
    error_description: Option<String>,
    msg: Option<String>,
    error: Option<String>,
}

impl AuthClient {
    pub fn new(config: &Config, http: reqwest::Client) -> Self {
        Self {
            http,
            url: format!("{}/auth/v1/token", config.base_url()),
            api_key: config.api_key(),
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(WalletError::SignInRejected(
                "email and password are required".to_string(),
            ));
        }

        let mut req = self
            .http
            .post(&self.url)
            .query(&[("grant_type", "password")])
            .json(&Credentials { email, password });
        if let Some(key) = &self.api_key {
            req = req.header("apikey", key);
        }
        let response = req.send().await?;

        let status = response.status();
        let body = response.text().await?;
        let session = parse_token_response(status, &body, email, Utc::now())?;

        info!(user = %session.user_id, expires_at = %session.expires_at, "signed in");
        Ok(session)
    }
}

/// Turn a token endpoint response into a [`Session`] issued at `now`.
pub fn parse_token_response(
    status: StatusCode,
    body: &str,
    email: &str,
    now: DateTime<Utc>,
) -> Result<Session> {
    if !status.is_success() {
        let message = serde_json::from_str::<TokenError>(body)
            .ok()
            .and_then(|e| e.error_description.or(e.msg).or(e.error))
            .unwrap_or_else(|| format!("sign-in failed with status {}", status.as_u16()));
        return Err(WalletError::SignInRejected(message));
    }

    let token: TokenResponse =
        serde_json::from_str(body).map_err(|e| WalletError::MalformedResponse(e.to_string()))?;

    Ok(Session {
        access_token: token.access_token,
        user_id: token.user.id,
        email: token.user.email.unwrap_or_else(|| email.to_string()),
        expires_at: now + Duration::seconds(token.expires_in),
    })
}
