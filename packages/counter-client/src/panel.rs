//! The counter panel: user intents turned into counter program calls.

use std::sync::Arc;

use solana_sdk::{instruction::Instruction, pubkey::Pubkey};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::{
    idl::CounterProgram,
    ledger::{LedgerClient, LedgerError, SendOptions},
    provider::{ProviderError, SigningProvider},
    session::CounterSession,
    state::{BaseAccount, StateError},
    view::ViewState,
    wallet::WalletContext,
};

/// Errors surfaced by counter operations.
#[derive(Debug, Error)]
pub enum PanelError {
    #[error("wallet is not ready to sign")]
    WalletNotReady,

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("counter account {0} does not exist")]
    AccountNotFound(Pubkey),

    #[error("failed to decode counter account: {0}")]
    Decode(#[from] StateError),
}

/// Bridges user actions to the counter program and tracks the displayed value.
///
/// Operations are not serialized: concurrent calls each submit and fetch
/// independently, and the display value ends up as whichever fetch resolved
/// last.
pub struct CounterPanel {
    ledger: Arc<dyn LedgerClient>,
    wallet: WalletContext,
    program: CounterProgram,
    session: CounterSession,
    options: SendOptions,
    display: RwLock<Option<u64>>,
}

impl CounterPanel {
    /// Creates a panel over the shell's ledger and wallet context.
    #[must_use]
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        wallet: WalletContext,
        program: CounterProgram,
        session: CounterSession,
        options: SendOptions,
    ) -> Self {
        Self {
            ledger,
            wallet,
            program,
            session,
            options,
            display: RwLock::new(None),
        }
    }

    /// The session's counter account reference.
    #[must_use]
    pub const fn session(&self) -> &CounterSession {
        &self.session
    }

    /// The last fetched counter value.
    pub async fn display_value(&self) -> Option<u64> {
        *self.display.read().await
    }

    /// The current view.
    pub async fn view(&self) -> ViewState {
        ViewState::new(self.wallet.connected(), self.display_value().await)
    }

    /// Builds a signing provider from the wallet context.
    ///
    /// Returns `None` unless a wallet is selected, connected, and able to
    /// sign both single transactions and batches.
    pub fn acquire_signing_context(&self) -> Option<SigningProvider> {
        let Some(wallet) = self.wallet.wallet() else {
            tracing::debug!("no wallet selected");
            return None;
        };
        let Some(payer) = wallet.public_key() else {
            tracing::debug!(wallet = wallet.name(), "wallet has no public key");
            return None;
        };
        if !wallet.supports_sign_transaction() || !wallet.supports_sign_all_transactions() {
            tracing::debug!(wallet = wallet.name(), "wallet cannot sign");
            return None;
        }

        Some(SigningProvider::new(
            self.ledger.clone(),
            wallet.clone(),
            payer,
            self.options,
        ))
    }

    /// Creates the counter account and displays its initial value.
    ///
    /// A missing signing context is a silent no-op. Failures are logged and
    /// leave the display value unchanged.
    #[tracing::instrument(skip_all, fields(account = %self.session.address()))]
    pub async fn create_counter_account(&self) -> Option<u64> {
        let provider = self.acquire_signing_context()?;

        let ix = self
            .program
            .create_instruction(self.session.address(), provider.payer());

        match self.submit_and_fetch(&provider, ix, true).await {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Transaction error: {e}");
                None
            }
        }
    }

    /// Increments the counter and displays the new value.
    #[tracing::instrument(skip_all, fields(account = %self.session.address()))]
    pub async fn increment_counter(&self) -> Result<u64, PanelError> {
        let provider = self
            .acquire_signing_context()
            .ok_or(PanelError::WalletNotReady)?;
        let ix = self.program.increment_instruction(self.session.address());
        self.submit_and_fetch(&provider, ix, false).await
    }

    /// Decrements the counter and displays the new value.
    #[tracing::instrument(skip_all, fields(account = %self.session.address()))]
    pub async fn decrement_counter(&self) -> Result<u64, PanelError> {
        let provider = self
            .acquire_signing_context()
            .ok_or(PanelError::WalletNotReady)?;
        let ix = self.program.decrement_instruction(self.session.address());
        self.submit_and_fetch(&provider, ix, false).await
    }

    /// Re-reads the counter account without submitting anything.
    ///
    /// Returns `Ok(None)` and keeps the display value if the account does
    /// not exist yet.
    pub async fn refresh(&self) -> Result<Option<u64>, PanelError> {
        let address = self.session.address();
        let Some(data) = self
            .ledger
            .account_data(&address, self.options.commitment)
            .await?
        else {
            return Ok(None);
        };

        let value = self.apply(&data).await?;
        Ok(Some(value))
    }

    async fn submit_and_fetch(
        &self,
        provider: &SigningProvider,
        ix: Instruction,
        co_sign: bool,
    ) -> Result<u64, PanelError> {
        let account = self.session.keypair();
        let co_signers = if co_sign { vec![account] } else { vec![] };
        provider.send(&[ix], &co_signers).await?;

        let address = self.session.address();
        let data = provider
            .fetch_account(&address)
            .await?
            .ok_or(PanelError::AccountNotFound(address))?;

        self.apply(&data).await
    }

    async fn apply(&self, data: &[u8]) -> Result<u64, PanelError> {
        let account = BaseAccount::decode(data, self.program.base_account_discriminator())?;
        tracing::info!(count = account.count, "counter account fetched");
        *self.display.write().await = Some(account.count);
        Ok(account.count)
    }
}
