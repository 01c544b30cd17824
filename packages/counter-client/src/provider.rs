//! The signing provider: a ledger connection bound to a connected wallet.

use std::sync::Arc;

use solana_sdk::{
    instruction::Instruction,
    message::Message,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    transaction::Transaction,
};
use thiserror::Error;

use crate::{
    ledger::{LedgerClient, LedgerError, SendOptions},
    wallet::{WalletAdapter, WalletError},
};

/// Errors raised while submitting through the provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error("failed to co-sign transaction: {0}")]
    CoSign(String),

    #[error("no instructions to submit")]
    Empty,
}

/// Everything needed to submit transactions on behalf of the connected wallet.
#[derive(Clone)]
pub struct SigningProvider {
    ledger: Arc<dyn LedgerClient>,
    wallet: Arc<dyn WalletAdapter>,
    payer: Pubkey,
    options: SendOptions,
}

impl SigningProvider {
    /// Binds `ledger` to `wallet`, paying fees from `payer`.
    #[must_use]
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        wallet: Arc<dyn WalletAdapter>,
        payer: Pubkey,
        options: SendOptions,
    ) -> Self {
        Self {
            ledger,
            wallet,
            payer,
            options,
        }
    }

    /// The wallet's public key, used as fee payer.
    #[must_use]
    pub const fn payer(&self) -> Pubkey {
        self.payer
    }

    /// Commitment settings.
    #[must_use]
    pub const fn options(&self) -> SendOptions {
        self.options
    }

    /// Builds a transaction from `instructions`, co-signs it with
    /// `co_signers`, has the wallet sign it, then submits and confirms it.
    #[tracing::instrument(skip_all, fields(payer = %self.payer, instructions = instructions.len()))]
    pub async fn send(
        &self,
        instructions: &[Instruction],
        co_signers: &[&Keypair],
    ) -> Result<Signature, ProviderError> {
        if instructions.is_empty() {
            return Err(ProviderError::Empty);
        }

        let blockhash = self
            .ledger
            .latest_blockhash(self.options.preflight_commitment)
            .await?;
        let message = Message::new_with_blockhash(instructions, Some(&self.payer), &blockhash);
        let mut tx = Transaction::new_unsigned(message);

        if !co_signers.is_empty() {
            tx.try_partial_sign(co_signers, blockhash)
                .map_err(|e| ProviderError::CoSign(e.to_string()))?;
        }

        let tx = self.wallet.sign_transaction(tx).await?;
        let signature = self.ledger.send_and_confirm(&tx, self.options).await?;

        tracing::info!(%signature, "transaction confirmed");

        Ok(signature)
    }

    /// Raw account data at the provider's commitment.
    pub async fn fetch_account(&self, pubkey: &Pubkey) -> Result<Option<Vec<u8>>, LedgerError> {
        self.ledger
            .account_data(pubkey, self.options.commitment)
            .await
    }
}
