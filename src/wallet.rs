//! Wallet state and the deposit / withdraw flow.
//!
//! The balance is never adjusted in place. After every acknowledged write
//! the full ledger is fetched again and refolded, so what the wallet shows
//! is always a fold over the store's history.

use crate::errors::{Result, WalletError};
use crate::gateway::TransactionGateway;
use crate::ledger::{LedgerSummary, calculate_balance};
use crate::models::{RequestKind, Transaction, TransactionRequest};
use crate::session::Session;
use crate::store::TransactionStore;
use chrono::Utc;
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::{info, warn};

/// One owner's wallet: session, last fetched ledger and its balance.
///
/// ```rust,ignore
/// let mut wallet = Wallet::new(gateway, store, Some(session));
/// wallet.refresh().await?;
/// wallet.deposit(dec!(10000), "M-Pesa", None).await?;
/// println!("{}", wallet.balance());
/// ```
pub struct Wallet<G, S> {
    gateway: G,
    store: S,
    session: Option<Session>,
    transactions: Vec<Transaction>,
    balance: Decimal,
    stale: bool,
    /// Whether `transactions` holds a fetched ledger for this session.
    fetched: bool,
}

impl<G: TransactionGateway, S: TransactionStore> Wallet<G, S> {
    pub fn new(gateway: G, store: S, session: Option<Session>) -> Self {
        Self {
            gateway,
            store,
            session,
            transactions: Vec::new(),
            balance: Decimal::ZERO,
            stale: false,
            fetched: false,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Install or drop the session. Cached ledger data always goes with it.
    pub fn set_session(&mut self, session: Option<Session>) {
        self.session = session;
        self.transactions.clear();
        self.balance = Decimal::ZERO;
        self.stale = false;
        self.fetched = false;
    }

    /// Balance as of the last successful fetch.
    pub fn balance(&self) -> Decimal {
        self.balance
    }

    /// Last fetched ledger, in store order (newest first).
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn summary(&self) -> LedgerSummary {
        LedgerSummary::from_transactions(&self.transactions)
    }

    /// True once a ledger has been fetched for the current session.
    pub fn is_fetched(&self) -> bool {
        self.fetched
    }

    /// True when a write was acknowledged but the follow-up fetch failed.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    fn active_session(&self) -> Result<Session> {
        self.session
            .as_ref()
            .filter(|s| s.is_active(Utc::now()))
            .cloned()
            .ok_or(WalletError::AuthenticationRequired)
    }

    /// Replace the cached ledger with the store's copy and refold.
    pub async fn refresh(&mut self) -> Result<Decimal> {
        let session = self.active_session()?;
        let transactions = self.store.fetch_transactions(&session).await?;

        self.balance = calculate_balance(&transactions);
        self.transactions = transactions;
        self.stale = false;
        self.fetched = true;
        Ok(self.balance)
    }

    /// Ask the gateway to record a deposit or withdrawal, then refetch.
    ///
    /// Preconditions are checked before any request goes out:
    /// * signed in, else [`WalletError::AuthenticationRequired`]
    /// * `amount > 0`, else [`WalletError::InvalidAmount`]
    /// * withdrawals: `amount <= balance()`, else
    ///   [`WalletError::InsufficientBalance`]. This only reflects the last
    ///   fetch (taken now if nothing has been fetched yet); the gateway may
    ///   still refuse.
    ///
    /// A gateway error leaves the wallet untouched.
    pub async fn request_transaction(
        &mut self,
        kind: RequestKind,
        amount: Decimal,
        method: &str,
        description: Option<String>,
    ) -> Result<Transaction> {
        let session = self.active_session()?;
        if amount <= Decimal::ZERO {
            return Err(WalletError::InvalidAmount(amount.to_string()));
        }
        if kind == RequestKind::Withdrawal && !self.fetched {
            self.refresh().await?;
        }
        if kind == RequestKind::Withdrawal && amount > self.balance {
            return Err(WalletError::InsufficientBalance {
                requested: amount,
                available: self.balance,
            });
        }

        let request = TransactionRequest::new(kind, amount, method, description);
        let tx = self.gateway.submit(&session, &request).await?;
        info!(id = %tx.id, %kind, %amount, "transaction acknowledged");

        if let Err(e) = self.refresh().await {
            warn!(error = %e, "refetch after acknowledged write failed; keeping previous ledger");
            self.stale = true;
        }
        Ok(tx)
    }

    pub async fn deposit(
        &mut self,
        amount: Decimal,
        method: &str,
        description: Option<String>,
    ) -> Result<Transaction> {
        self.request_transaction(RequestKind::Deposit, amount, method, description)
            .await
    }

    pub async fn withdraw(
        &mut self,
        amount: Decimal,
        method: &str,
        description: Option<String>,
    ) -> Result<Transaction> {
        self.request_transaction(RequestKind::Withdrawal, amount, method, description)
            .await
    }
}

/// Parse user input into a positive amount.
pub fn parse_amount(raw: &str) -> Result<Decimal> {
    let amount = Decimal::from_str(raw.trim())
        .map_err(|_| WalletError::InvalidAmount(raw.trim().to_string()))?;
    if amount <= Decimal::ZERO {
        return Err(WalletError::InvalidAmount(raw.trim().to_string()));
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::tx;
    use crate::models::{TxKind, TxStatus};
    use crate::session::tests::active_session;
    use async_trait::async_trait;
    use chrono::Duration;
    use rust_decimal_macros::dec;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Backend {
        ledger: Vec<Transaction>,
        events: Vec<&'static str>,
        reject: Option<WalletError>,
        fail_fetch: bool,
    }

    type Shared = Arc<Mutex<Backend>>;

    struct FakeGateway(Shared);
    struct FakeStore(Shared);

    #[async_trait]
    impl TransactionGateway for FakeGateway {
        async fn submit(&self, session: &Session, request: &TransactionRequest) -> Result<Transaction> {
            let mut backend = self.0.lock().unwrap();
            backend.events.push("submit");
            if let Some(err) = backend.reject.clone() {
                return Err(err);
            }
            let mut created = tx(
                &format!("gw-{}", backend.ledger.len() + 1),
                request.kind.into(),
                request.amount,
                TxStatus::Completed,
            );
            created.owner_id = session.user_id.clone();
            created.method = Some(request.method.clone());
            created.description = request.description.clone();
            backend.ledger.insert(0, created.clone());
            Ok(created)
        }
    }

    #[async_trait]
    impl TransactionStore for FakeStore {
        async fn fetch_transactions(&self, _session: &Session) -> Result<Vec<Transaction>> {
            let mut backend = self.0.lock().unwrap();
            backend.events.push("fetch");
            if backend.fail_fetch {
                return Err(WalletError::NetworkFailure("connection reset".into()));
            }
            Ok(backend.ledger.clone())
        }
    }

    fn wallet_with(ledger: Vec<Transaction>) -> (Wallet<FakeGateway, FakeStore>, Shared) {
        let backend = Arc::new(Mutex::new(Backend {
            ledger,
            ..Backend::default()
        }));
        let wallet = Wallet::new(
            FakeGateway(backend.clone()),
            FakeStore(backend.clone()),
            Some(active_session()),
        );
        (wallet, backend)
    }

    fn events(backend: &Shared) -> Vec<&'static str> {
        backend.lock().unwrap().events.clone()
    }

    #[tokio::test]
    async fn refresh_folds_fetched_ledger() {
        let (mut wallet, _) = wallet_with(vec![
            tx("1", TxKind::Deposit, dec!(50000), TxStatus::Completed),
            tx("2", TxKind::Payment, dec!(20000), TxStatus::Completed),
            tx("3", TxKind::Withdrawal, dec!(1000), TxStatus::Pending),
        ]);

        assert_eq!(wallet.refresh().await.unwrap(), dec!(30000));
        assert_eq!(wallet.balance(), dec!(30000));
        assert_eq!(wallet.transactions().len(), 3);
        assert_eq!(wallet.summary().pending, 1);
    }

    #[tokio::test]
    async fn withdrawal_above_balance_never_reaches_gateway() {
        let (mut wallet, backend) =
            wallet_with(vec![tx("1", TxKind::Deposit, dec!(500), TxStatus::Completed)]);
        wallet.refresh().await.unwrap();

        let err = wallet.withdraw(dec!(501), "M-Pesa", None).await.unwrap_err();
        assert_eq!(
            err,
            WalletError::InsufficientBalance {
                requested: dec!(501),
                available: dec!(500)
            }
        );
        assert_eq!(events(&backend), vec!["fetch"]);
    }

    #[tokio::test]
    async fn withdrawal_before_first_refresh_checks_fetched_balance() {
        let (mut wallet, backend) =
            wallet_with(vec![tx("1", TxKind::Deposit, dec!(1000), TxStatus::Completed)]);

        wallet.withdraw(dec!(10), "M-Pesa", None).await.unwrap();

        assert_eq!(wallet.balance(), dec!(990));
        assert_eq!(events(&backend), vec!["fetch", "submit", "fetch"]);
    }

    #[tokio::test]
    async fn withdrawal_before_first_refresh_still_enforces_balance() {
        let (mut wallet, backend) =
            wallet_with(vec![tx("1", TxKind::Deposit, dec!(1000), TxStatus::Completed)]);

        let err = wallet.withdraw(dec!(1001), "M-Pesa", None).await.unwrap_err();
        assert_eq!(
            err,
            WalletError::InsufficientBalance {
                requested: dec!(1001),
                available: dec!(1000)
            }
        );
        assert_eq!(events(&backend), vec!["fetch"]);
    }

    #[tokio::test]
    async fn zero_deposit_is_invalid() {
        let (mut wallet, backend) = wallet_with(vec![]);

        let err = wallet.deposit(Decimal::ZERO, "M-Pesa", None).await.unwrap_err();
        assert!(matches!(err, WalletError::InvalidAmount(_)));

        let err = wallet.deposit(dec!(-5), "M-Pesa", None).await.unwrap_err();
        assert!(matches!(err, WalletError::InvalidAmount(_)));
        assert!(events(&backend).is_empty());
    }

    #[tokio::test]
    async fn signed_out_wallet_requires_authentication() {
        let (mut wallet, backend) = wallet_with(vec![]);
        wallet.set_session(None);

        assert_eq!(
            wallet.deposit(dec!(100), "M-Pesa", None).await.unwrap_err(),
            WalletError::AuthenticationRequired
        );
        assert_eq!(wallet.refresh().await.unwrap_err(), WalletError::AuthenticationRequired);
        assert!(events(&backend).is_empty());
    }

    #[tokio::test]
    async fn expired_session_requires_authentication() {
        let (mut wallet, backend) = wallet_with(vec![]);
        let mut session = active_session();
        session.expires_at = Utc::now() - Duration::seconds(1);
        wallet.set_session(Some(session));

        assert_eq!(
            wallet.deposit(dec!(100), "M-Pesa", None).await.unwrap_err(),
            WalletError::AuthenticationRequired
        );
        assert!(events(&backend).is_empty());
    }

    #[tokio::test]
    async fn deposit_refetches_after_write_and_grows_balance() {
        let (mut wallet, backend) = wallet_with(vec![
            tx("1", TxKind::Deposit, dec!(50000), TxStatus::Completed),
            tx("2", TxKind::Payment, dec!(20000), TxStatus::Completed),
        ]);
        let before = wallet.refresh().await.unwrap();

        let created = wallet.deposit(dec!(10000), "M-Pesa", None).await.unwrap();

        assert_eq!(created.kind, TxKind::Deposit);
        assert_eq!(created.description.as_deref(), Some("Deposit via M-Pesa"));
        assert_eq!(wallet.balance() - before, dec!(10000));
        assert_eq!(wallet.transactions()[0].id, created.id);
        assert_eq!(events(&backend), vec!["fetch", "submit", "fetch"]);
        assert!(!wallet.is_stale());
    }

    #[tokio::test]
    async fn withdrawal_within_balance_goes_through() {
        let (mut wallet, _) =
            wallet_with(vec![tx("1", TxKind::Deposit, dec!(800), TxStatus::Completed)]);
        wallet.refresh().await.unwrap();

        wallet
            .withdraw(dec!(800), "Airtel Money", Some("Cash out".into()))
            .await
            .unwrap();
        assert_eq!(wallet.balance(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn gateway_rejection_leaves_state_untouched() {
        let (mut wallet, backend) =
            wallet_with(vec![tx("1", TxKind::Deposit, dec!(800), TxStatus::Completed)]);
        wallet.refresh().await.unwrap();

        let rejection = WalletError::GatewayRejected {
            status: 400,
            message: "Insufficient funds".into(),
        };
        backend.lock().unwrap().reject = Some(rejection.clone());

        // local check passes against the cached balance; the gateway has the final say
        let err = wallet.withdraw(dec!(700), "M-Pesa", None).await.unwrap_err();
        assert_eq!(err, rejection);
        assert!(err.is_insufficient_funds());
        assert_eq!(wallet.balance(), dec!(800));
        assert_eq!(wallet.transactions().len(), 1);
        assert_eq!(events(&backend), vec!["fetch", "submit"]);
    }

    #[tokio::test]
    async fn failed_refetch_marks_wallet_stale() {
        let (mut wallet, backend) =
            wallet_with(vec![tx("1", TxKind::Deposit, dec!(100), TxStatus::Completed)]);
        wallet.refresh().await.unwrap();
        backend.lock().unwrap().fail_fetch = true;

        let created = wallet.deposit(dec!(50), "M-Pesa", None).await.unwrap();

        assert_eq!(created.amount, dec!(50));
        assert!(wallet.is_stale());
        assert_eq!(wallet.balance(), dec!(100));

        backend.lock().unwrap().fail_fetch = false;
        assert_eq!(wallet.refresh().await.unwrap(), dec!(150));
        assert!(!wallet.is_stale());
    }

    #[tokio::test]
    async fn clearing_session_drops_cached_ledger() {
        let (mut wallet, _) =
            wallet_with(vec![tx("1", TxKind::Deposit, dec!(100), TxStatus::Completed)]);
        wallet.refresh().await.unwrap();

        wallet.set_session(None);
        assert!(!wallet.is_fetched());
        assert!(wallet.session().is_none());
        assert_eq!(wallet.balance(), Decimal::ZERO);
        assert!(wallet.transactions().is_empty());
    }

    #[test]
    fn amount_parsing() {
        assert_eq!(parse_amount(" 10000 ").unwrap(), dec!(10000));
        assert_eq!(parse_amount("2500.50").unwrap(), dec!(2500.50));
        for bad in ["0", "-1", "", "abc", "NaN", "inf"] {
            assert!(
                matches!(parse_amount(bad), Err(WalletError::InvalidAmount(_))),
                "{bad} should be rejected"
            );
        }
    }
}
