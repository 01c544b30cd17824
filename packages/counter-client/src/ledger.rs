//! Access to the remote ledger: blockhashes, submission and account reads.

use std::{future::Future, time::Duration};

use async_trait::async_trait;
use solana_client::{nonblocking::rpc_client::RpcClient, rpc_config::RpcSendTransactionConfig};
use solana_sdk::{
    commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey, signature::Signature,
    transaction::Transaction,
};
use thiserror::Error;

/// Errors raised while talking to the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("RPC request failed: {0}")]
    Rpc(String),

    #[error("transaction failed: {0}")]
    Transaction(String),
}

/// Status polls before a submitted transaction counts as dropped.
const CONFIRM_ATTEMPTS: usize = 60;
const CONFIRM_INTERVAL: Duration = Duration::from_millis(500);

/// Commitment settings used when submitting transactions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SendOptions {
    /// Level the transaction must reach before it counts as confirmed.
    pub commitment: CommitmentConfig,
    /// Level used for the preflight simulation.
    pub preflight_commitment: CommitmentConfig,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            commitment: CommitmentConfig::processed(),
            preflight_commitment: CommitmentConfig::processed(),
        }
    }
}

/// The subset of ledger RPC the client needs.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Endpoint description, for logging.
    fn endpoint(&self) -> String;

    /// A recent blockhash to anchor new transactions.
    async fn latest_blockhash(&self, commitment: CommitmentConfig) -> Result<Hash, LedgerError>;

    /// Submits a fully signed transaction and waits for `options.commitment`.
    async fn send_and_confirm(
        &self,
        tx: &Transaction,
        options: SendOptions,
    ) -> Result<Signature, LedgerError>;

    /// Raw data of an account, `None` if the account does not exist.
    async fn account_data(
        &self,
        pubkey: &Pubkey,
        commitment: CommitmentConfig,
    ) -> Result<Option<Vec<u8>>, LedgerError>;
}

/// [`LedgerClient`] backed by a Solana JSON-RPC endpoint.
pub struct RpcLedger {
    client: RpcClient,
}

impl RpcLedger {
    /// Creates a client for `url`.
    #[must_use]
    pub fn new(url: impl Into<String>, commitment: CommitmentConfig) -> Self {
        Self {
            client: RpcClient::new_with_commitment(url.into(), commitment),
        }
    }
}

#[async_trait]
impl LedgerClient for RpcLedger {
    fn endpoint(&self) -> String {
        self.client.url()
    }

    async fn latest_blockhash(&self, commitment: CommitmentConfig) -> Result<Hash, LedgerError> {
        self.client
            .get_latest_blockhash_with_commitment(commitment)
            .await
            .map(|(hash, _)| hash)
            .map_err(|e| LedgerError::Rpc(format!("failed to get blockhash: {e}")))
    }

    async fn send_and_confirm(
        &self,
        tx: &Transaction,
        options: SendOptions,
    ) -> Result<Signature, LedgerError> {
        let config = RpcSendTransactionConfig {
            preflight_commitment: Some(options.preflight_commitment.commitment),
            ..RpcSendTransactionConfig::default()
        };

        let signature = self
            .client
            .send_transaction_with_config(tx, config)
            .await
            .map_err(|e| LedgerError::Transaction(e.to_string()))?;

        await_confirmation(
            || async move {
                self.client
                    .get_signature_status_with_commitment(&signature, options.commitment)
                    .await
                    .map(|status| status.map(|result| result.map_err(|e| e.to_string())))
                    .map_err(|e| LedgerError::Rpc(format!("failed to get status of {signature}: {e}")))
            },
            CONFIRM_ATTEMPTS,
            CONFIRM_INTERVAL,
        )
        .await?;

        Ok(signature)
    }

    async fn account_data(
        &self,
        pubkey: &Pubkey,
        commitment: CommitmentConfig,
    ) -> Result<Option<Vec<u8>>, LedgerError> {
        let response = self
            .client
            .get_account_with_commitment(pubkey, commitment)
            .await
            .map_err(|e| LedgerError::Rpc(format!("failed to fetch account {pubkey}: {e}")))?;

        Ok(response.value.map(|account| account.data))
    }
}

/// Polls `status` until the transaction lands, fails, or `attempts` run out.
///
/// `status` yields `None` while the transaction is unknown at the requested
/// commitment.
async fn await_confirmation<F, Fut>(
    mut status: F,
    attempts: usize,
    interval: Duration,
) -> Result<(), LedgerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<Result<(), String>>, LedgerError>>,
{
    for attempt in 0..attempts {
        match status().await? {
            Some(Ok(())) => return Ok(()),
            Some(Err(e)) => return Err(LedgerError::Transaction(e)),
            None => {
                tracing::trace!(attempt, "transaction not yet confirmed");
                tokio::time::sleep(interval).await;
            }
        }
    }

    Err(LedgerError::Transaction(format!(
        "transaction not confirmed after {attempts} status checks"
    )))
}
