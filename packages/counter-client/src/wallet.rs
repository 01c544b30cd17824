//! Wallet adapters: the signing side of the client.
//!
//! A [`WalletAdapter`] owns the user's identity. The client only ever
//! references it: it asks for the public key and for signatures, never for
//! key material.

use std::{
    fmt,
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{read_keypair_file, Keypair, Signer},
    transaction::Transaction,
};
use thiserror::Error;

/// Errors surfaced by wallet adapters.
#[derive(Debug, Error)]
pub enum WalletError {
    #[error("wallet `{0}` is not connected")]
    NotConnected(String),

    #[error("wallet rejected the request: {0}")]
    Rejected(String),

    #[error("failed to sign transaction: {0}")]
    Signing(String),

    #[error("failed to load keypair from `{path}`: {reason}")]
    Keypair {
        /// Keypair file path
        path: String,
        /// Loader error
        reason: String,
    },
}

/// Interface of a wallet able to sign transactions for the connected user.
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    /// Display name of the adapter.
    fn name(&self) -> &str;

    /// Public key of the connected account, `None` while disconnected.
    fn public_key(&self) -> Option<Pubkey>;

    /// Whether the adapter currently has a connected account.
    fn connected(&self) -> bool {
        self.public_key().is_some()
    }

    /// Whether [`WalletAdapter::sign_transaction`] is available.
    fn supports_sign_transaction(&self) -> bool {
        true
    }

    /// Whether [`WalletAdapter::sign_all_transactions`] is available.
    fn supports_sign_all_transactions(&self) -> bool {
        true
    }

    /// Connects the wallet and returns the account's public key.
    async fn connect(&self) -> Result<Pubkey, WalletError>;

    /// Disconnects the wallet.
    async fn disconnect(&self) -> Result<(), WalletError>;

    /// Adds the wallet's signature to `tx`, preserving existing signatures.
    async fn sign_transaction(&self, tx: Transaction) -> Result<Transaction, WalletError>;

    /// Signs a batch of transactions.
    async fn sign_all_transactions(
        &self,
        txs: Vec<Transaction>,
    ) -> Result<Vec<Transaction>, WalletError>;
}

/// A wallet backed by a local keypair, such as a Solana CLI `id.json`.
pub struct KeypairWallet {
    name: String,
    keypair: Keypair,
    connected: AtomicBool,
}

impl KeypairWallet {
    /// Name reported by keypair-file wallets.
    pub const NAME: &'static str = "Keypair";

    /// Wraps an in-memory keypair. The wallet starts disconnected.
    #[must_use]
    pub fn new(keypair: Keypair) -> Self {
        Self {
            name: Self::NAME.to_string(),
            keypair,
            connected: AtomicBool::new(false),
        }
    }

    /// Loads a keypair in Solana CLI JSON format.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, WalletError> {
        let path_ref = path.as_ref();
        let keypair = read_keypair_file(path_ref).map_err(|e| WalletError::Keypair {
            path: path_ref.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::new(keypair))
    }

    /// Overrides the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn ensure_connected(&self) -> Result<(), WalletError> {
        if self.connected.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(WalletError::NotConnected(self.name.clone()))
        }
    }

    fn sign(&self, mut tx: Transaction) -> Result<Transaction, WalletError> {
        self.ensure_connected()?;
        let blockhash = tx.message.recent_blockhash;
        tx.try_partial_sign(&[&self.keypair], blockhash)
            .map_err(|e| WalletError::Signing(e.to_string()))?;
        Ok(tx)
    }
}

impl fmt::Debug for KeypairWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeypairWallet")
            .field("name", &self.name)
            .field("pubkey", &self.keypair.pubkey())
            .field("connected", &self.connected.load(Ordering::Acquire))
            .finish()
    }
}

#[async_trait]
impl WalletAdapter for KeypairWallet {
    fn name(&self) -> &str {
        &self.name
    }

    fn public_key(&self) -> Option<Pubkey> {
        self.connected
            .load(Ordering::Acquire)
            .then(|| self.keypair.pubkey())
    }

    async fn connect(&self) -> Result<Pubkey, WalletError> {
        self.connected.store(true, Ordering::Release);
        let pubkey = self.keypair.pubkey();
        tracing::info!(wallet = %self.name, %pubkey, "wallet connected");
        Ok(pubkey)
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        self.connected.store(false, Ordering::Release);
        tracing::info!(wallet = %self.name, "wallet disconnected");
        Ok(())
    }

    async fn sign_transaction(&self, tx: Transaction) -> Result<Transaction, WalletError> {
        self.sign(tx)
    }

    async fn sign_all_transactions(
        &self,
        txs: Vec<Transaction>,
    ) -> Result<Vec<Transaction>, WalletError> {
        txs.into_iter().map(|tx| self.sign(tx)).collect()
    }
}

/// The wallet context handed down from the provider shell.
#[derive(Clone, Default)]
pub struct WalletContext {
    wallet: Option<Arc<dyn WalletAdapter>>,
}

impl WalletContext {
    /// Context with a selected wallet adapter.
    #[must_use]
    pub fn new(wallet: Arc<dyn WalletAdapter>) -> Self {
        Self {
            wallet: Some(wallet),
        }
    }

    /// Context without any wallet.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The selected wallet adapter, if any.
    #[must_use]
    pub fn wallet(&self) -> Option<&Arc<dyn WalletAdapter>> {
        self.wallet.as_ref()
    }

    /// Public key of the connected account.
    #[must_use]
    pub fn public_key(&self) -> Option<Pubkey> {
        self.wallet.as_ref().and_then(|w| w.public_key())
    }

    /// Whether a wallet is selected and connected.
    #[must_use]
    pub fn connected(&self) -> bool {
        self.wallet.as_ref().is_some_and(|w| w.connected())
    }
}

impl fmt::Debug for WalletContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletContext")
            .field("wallet", &self.wallet.as_ref().map(|w| w.name().to_string()))
            .field("public_key", &self.public_key())
            .finish()
    }
}
