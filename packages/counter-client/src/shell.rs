//! The provider shell: network connection plus wallet context.

use std::sync::Arc;

use crate::{
    idl::CounterProgram,
    ledger::{LedgerClient, RpcLedger, SendOptions},
    network::Network,
    panel::CounterPanel,
    session::CounterSession,
    wallet::{WalletAdapter, WalletContext, WalletError},
};

/// Supplies a ledger connection and exactly one wallet adapter to the panel.
pub struct ProviderShell {
    network: Network,
    ledger: Arc<dyn LedgerClient>,
    wallet: Arc<dyn WalletAdapter>,
    options: SendOptions,
}

impl ProviderShell {
    /// Connects to the public endpoint of `network` with `wallet` registered.
    #[must_use]
    pub fn new(network: Network, wallet: Arc<dyn WalletAdapter>) -> Self {
        Self::with_endpoint(network, network.rpc_url(), wallet)
    }

    /// Like [`ProviderShell::new`] but against an explicit RPC URL.
    #[must_use]
    pub fn with_endpoint(
        network: Network,
        url: impl Into<String>,
        wallet: Arc<dyn WalletAdapter>,
    ) -> Self {
        let options = SendOptions::default();
        let ledger = Arc::new(RpcLedger::new(url, options.commitment));
        Self::with_ledger(network, ledger, wallet)
    }

    /// Uses an existing ledger client.
    #[must_use]
    pub fn with_ledger(
        network: Network,
        ledger: Arc<dyn LedgerClient>,
        wallet: Arc<dyn WalletAdapter>,
    ) -> Self {
        tracing::debug!(
            %network,
            endpoint = %ledger.endpoint(),
            wallet = wallet.name(),
            "provider shell ready"
        );
        Self {
            network,
            ledger,
            wallet,
            options: SendOptions::default(),
        }
    }

    /// Overrides the commitment settings handed to the panel.
    #[must_use]
    pub fn with_options(mut self, options: SendOptions) -> Self {
        self.options = options;
        self
    }

    /// The selected network.
    #[must_use]
    pub const fn network(&self) -> Network {
        self.network
    }

    /// The shared ledger client.
    #[must_use]
    pub fn ledger(&self) -> Arc<dyn LedgerClient> {
        self.ledger.clone()
    }

    /// The wallet context seen by descendants.
    #[must_use]
    pub fn wallet_context(&self) -> WalletContext {
        WalletContext::new(self.wallet.clone())
    }

    /// Connects the registered wallet.
    pub async fn autoconnect(&self) -> Result<(), WalletError> {
        self.wallet.connect().await.map(|_| ())
    }

    /// Disconnects the registered wallet.
    pub async fn disconnect(&self) -> Result<(), WalletError> {
        self.wallet.disconnect().await
    }

    /// Builds the counter panel for this shell.
    #[must_use]
    pub fn panel(&self, program: CounterProgram, session: CounterSession) -> CounterPanel {
        CounterPanel::new(
            self.ledger(),
            self.wallet_context(),
            program,
            session,
            self.options,
        )
    }
}
