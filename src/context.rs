//! Application-wide wallet context with an explicit lifecycle.
//!
//! `init` reads the persisted session, `sign_in` issues and stores a new
//! one, `teardown` forgets it. Everything that needs the wallet is handed
//! this context rather than reaching for global state.

use crate::auth::AuthClient;
use crate::config::Config;
use crate::gateway::HttpGateway;
use crate::session::SessionFile;
use crate::store::RestStore;
use crate::wallet::Wallet;
use anyhow::Result;
use tracing::{info, warn};

pub type HttpWallet = Wallet<HttpGateway, RestStore>;

pub struct WalletContext {
    config: Config,
    session_file: SessionFile,
    auth: AuthClient,
    wallet: HttpWallet,
}

impl WalletContext {
    pub fn init(config: Config) -> Result<Self> {
        let http = config.http_client()?;
        let session_file = SessionFile::new(config.session_path.clone());
        let session = session_file.load()?;
        if let Some(s) = &session {
            info!(user = %s.user_id, "restored session");
        }

        let wallet = Wallet::new(
            HttpGateway::new(&config, http.clone()),
            RestStore::new(&config, http.clone()),
            session,
        );
        Ok(Self {
            auth: AuthClient::new(&config, http),
            session_file,
            wallet,
            config,
        })
    }

    /// Issue a credential, persist it and load the owner's ledger.
    ///
    /// Once the credential is saved the sign-in stands; a failed ledger
    /// fetch is only logged and leaves `wallet().is_fetched()` false.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<()> {
        let session = self.auth.sign_in(email, password).await?;
        self.session_file.save(&session)?;
        self.wallet.set_session(Some(session));
        if let Err(e) = self.wallet.refresh().await {
            warn!(error = %e, "signed in but the ledger could not be fetched");
        }
        Ok(())
    }

    pub fn teardown(&mut self) -> Result<()> {
        self.session_file.clear()?;
        self.wallet.set_session(None);
        info!("signed out");
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn wallet(&self) -> &HttpWallet {
        &self.wallet
    }

    pub fn wallet_mut(&mut self) -> &mut HttpWallet {
        &mut self.wallet
    }
}
