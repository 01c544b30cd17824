//! In-memory doubles for the ledger and the wallet.

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    hash::Hash,
    instruction::CompiledInstruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    transaction::Transaction,
};
use tokio::sync::{mpsc, oneshot, Mutex};

use crate::{
    idl::{AccountRole, CounterInstruction, CounterProgram},
    ledger::{LedgerClient, LedgerError, SendOptions},
    state::BaseAccount,
    wallet::{KeypairWallet, WalletAdapter, WalletError},
};

/// Bytes allocated for a counter account, as in the on-chain program.
const ACCOUNT_SPACE: usize = 16 + 16;

/// Notification that a gated account read has taken its snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadStarted {
    /// Index of the gate holding the read.
    pub gate: usize,
    /// Counter value captured by the read, if the account decoded.
    pub count: Option<u64>,
}

/// Handles controlling gated account reads.
pub struct ReadGates {
    /// Receives one message per gated read once its snapshot is taken.
    pub started: mpsc::UnboundedReceiver<ReadStarted>,
    releases: Vec<Option<oneshot::Sender<()>>>,
}

impl ReadGates {
    /// Lets the read held by `gate` return.
    pub fn release(&mut self, gate: usize) {
        if let Some(tx) = self.releases.get_mut(gate).and_then(Option::take) {
            let _ = tx.send(());
        }
    }
}

struct Gate {
    index: usize,
    release: oneshot::Receiver<()>,
}

#[derive(Default)]
struct GateQueue {
    pending: VecDeque<Gate>,
    started: Option<mpsc::UnboundedSender<ReadStarted>>,
}

/// A ledger executing the counter program in memory.
pub struct MemoryLedger {
    program: CounterProgram,
    blockhash: Hash,
    accounts: Mutex<HashMap<Pubkey, Vec<u8>>>,
    fail_next_send: Mutex<Option<String>>,
    gates: Mutex<GateQueue>,
    sent: Mutex<Vec<Transaction>>,
}

impl MemoryLedger {
    /// An empty ledger hosting `program`.
    #[must_use]
    pub fn new(program: CounterProgram) -> Self {
        Self {
            program,
            blockhash: Hash::new_unique(),
            accounts: Mutex::new(HashMap::new()),
            fail_next_send: Mutex::new(None),
            gates: Mutex::new(GateQueue::default()),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Makes the next submission fail with `reason`.
    pub async fn fail_next_send(&self, reason: impl Into<String>) {
        *self.fail_next_send.lock().await = Some(reason.into());
    }

    /// Holds the next `count` account reads until released.
    pub async fn gate_reads(&self, count: usize) -> ReadGates {
        let (started_tx, started_rx) = mpsc::unbounded_channel();
        let mut releases = Vec::with_capacity(count);
        let mut queue = self.gates.lock().await;
        for index in 0..count {
            let (tx, rx) = oneshot::channel();
            releases.push(Some(tx));
            queue.pending.push_back(Gate { index, release: rx });
        }
        queue.started = Some(started_tx);

        ReadGates {
            started: started_rx,
            releases,
        }
    }

    /// Counter value stored on the ledger.
    pub async fn count(&self, pubkey: &Pubkey) -> Option<u64> {
        let accounts = self.accounts.lock().await;
        let data = accounts.get(pubkey)?;
        BaseAccount::decode(data, self.program.base_account_discriminator())
            .ok()
            .map(|a| a.count)
    }

    /// Transactions accepted so far.
    pub async fn sent(&self) -> Vec<Transaction> {
        self.sent.lock().await.clone()
    }

    fn execute(
        &self,
        tx: &Transaction,
        ix: &CompiledInstruction,
        accounts: &mut HashMap<Pubkey, Vec<u8>>,
    ) -> Result<(), LedgerError> {
        let keys = &tx.message.account_keys;
        let program_id = keys
            .get(usize::from(ix.program_id_index))
            .ok_or_else(|| failure("invalid program index"))?;
        if *program_id != self.program.program_id() {
            return Err(failure(format!("unsupported program {program_id}")));
        }

        let kind = self
            .program
            .classify(&ix.data)
            .ok_or_else(|| failure("unknown instruction"))?;
        let account_index = |position: usize| -> Result<usize, LedgerError> {
            ix.accounts
                .get(position)
                .map(|i| usize::from(*i))
                .ok_or_else(|| failure("missing account"))
        };
        let discriminator = self.program.base_account_discriminator();

        match kind {
            CounterInstruction::Create => {
                let index = account_index(self.program.create_account_index(AccountRole::BaseAccount))?;
                let base = keys[index];
                if !tx.message.is_signer(index) {
                    return Err(failure("base account must sign its creation"));
                }
                if accounts.contains_key(&base) {
                    return Err(failure(format!("account {base} already in use")));
                }
                let mut data = BaseAccount { count: 0 }.encode(discriminator);
                data.resize(ACCOUNT_SPACE, 0);
                accounts.insert(base, data);
            }
            CounterInstruction::Increment | CounterInstruction::Decrement => {
                let base = keys[account_index(0)?];
                let data = accounts
                    .get_mut(&base)
                    .ok_or_else(|| failure("AccountNotInitialized"))?;
                let current = BaseAccount::decode(data, discriminator)
                    .map_err(|e| failure(e.to_string()))?
                    .count;
                let next = if kind == CounterInstruction::Increment {
                    current.checked_add(1).ok_or_else(|| failure("CounterOverflow"))?
                } else {
                    current.checked_sub(1).ok_or_else(|| failure("CounterUnderflow"))?
                };
                let mut encoded = BaseAccount { count: next }.encode(discriminator);
                encoded.resize(data.len().max(encoded.len()), 0);
                *data = encoded;
            }
        }
        Ok(())
    }
}

fn failure(reason: impl Into<String>) -> LedgerError {
    LedgerError::Transaction(reason.into())
}

#[async_trait]
impl LedgerClient for MemoryLedger {
    fn endpoint(&self) -> String {
        "memory".to_string()
    }

    async fn latest_blockhash(&self, _commitment: CommitmentConfig) -> Result<Hash, LedgerError> {
        Ok(self.blockhash)
    }

    async fn send_and_confirm(
        &self,
        tx: &Transaction,
        _options: SendOptions,
    ) -> Result<Signature, LedgerError> {
        if let Some(reason) = self.fail_next_send.lock().await.take() {
            return Err(failure(reason));
        }
        tx.verify()
            .map_err(|e| failure(format!("signature verification failed: {e}")))?;

        let mut accounts = self.accounts.lock().await;
        let mut staged = accounts.clone();
        for ix in &tx.message.instructions {
            self.execute(tx, ix, &mut staged)?;
        }
        *accounts = staged;
        drop(accounts);

        self.sent.lock().await.push(tx.clone());
        Ok(tx.signatures[0])
    }

    async fn account_data(
        &self,
        pubkey: &Pubkey,
        _commitment: CommitmentConfig,
    ) -> Result<Option<Vec<u8>>, LedgerError> {
        let snapshot = self.accounts.lock().await.get(pubkey).cloned();

        let gate = {
            let mut queue = self.gates.lock().await;
            let gate = queue.pending.pop_front();
            if let (Some(gate), Some(started)) = (&gate, &queue.started) {
                let count = snapshot.as_deref().and_then(|data| {
                    BaseAccount::decode(data, self.program.base_account_discriminator())
                        .ok()
                        .map(|a| a.count)
                });
                let _ = started.send(ReadStarted {
                    gate: gate.index,
                    count,
                });
            }
            gate
        };

        if let Some(gate) = gate {
            let _ = gate.release.await;
        }

        Ok(snapshot)
    }
}

/// A keypair wallet whose capabilities and approval can be toggled.
pub struct TestWallet {
    inner: KeypairWallet,
    rejecting: AtomicBool,
    batch_signing: bool,
}

impl TestWallet {
    /// A wallet with a random keypair that approves every request.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: KeypairWallet::new(Keypair::new()).with_name("Test"),
            rejecting: AtomicBool::new(false),
            batch_signing: true,
        }
    }

    /// A wallet lacking batch signing.
    #[must_use]
    pub fn without_batch_signing() -> Self {
        Self {
            batch_signing: false,
            ..Self::new()
        }
    }

    /// Makes the wallet reject signing requests.
    pub fn set_rejecting(&self, rejecting: bool) {
        self.rejecting.store(rejecting, Ordering::Release);
    }

    /// Connected wallet wrapped for a [`crate::WalletContext`].
    pub async fn connected() -> Arc<Self> {
        let wallet = Arc::new(Self::new());
        wallet.connect().await.expect("test wallet connects");
        wallet
    }

    fn check_approval(&self) -> Result<(), WalletError> {
        if self.rejecting.load(Ordering::Acquire) {
            Err(WalletError::Rejected("User rejected the request.".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Default for TestWallet {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WalletAdapter for TestWallet {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn public_key(&self) -> Option<Pubkey> {
        self.inner.public_key()
    }

    fn supports_sign_all_transactions(&self) -> bool {
        self.batch_signing
    }

    async fn connect(&self) -> Result<Pubkey, WalletError> {
        self.inner.connect().await
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        self.inner.disconnect().await
    }

    async fn sign_transaction(&self, tx: Transaction) -> Result<Transaction, WalletError> {
        self.check_approval()?;
        self.inner.sign_transaction(tx).await
    }

    async fn sign_all_transactions(
        &self,
        txs: Vec<Transaction>,
    ) -> Result<Vec<Transaction>, WalletError> {
        self.check_approval()?;
        self.inner.sign_all_transactions(txs).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connected_wallet_exposes_public_key() {
        let wallet = TestWallet::connected().await;
        assert!(wallet.connected());
        assert!(wallet.public_key().is_some());
        assert_eq!(wallet.name(), "Test");
    }
}
