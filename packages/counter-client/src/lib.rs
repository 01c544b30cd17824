//! Off-chain client for the Anchor counter program.
//!
//! The [`ProviderShell`] owns the ledger connection and the wallet adapter;
//! the [`CounterPanel`] it builds turns create / increment / decrement
//! requests into signed transactions and keeps the last fetched counter
//! value for display.

pub mod idl;
pub mod ledger;
pub mod network;
pub mod panel;
pub mod provider;
pub mod session;
pub mod shell;
pub mod state;
pub mod view;
pub mod wallet;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use idl::{CounterProgram, IdlError};
pub use ledger::{LedgerClient, LedgerError, RpcLedger, SendOptions};
pub use network::{Commitment, Network};
pub use panel::{CounterPanel, PanelError};
pub use provider::{ProviderError, SigningProvider};
pub use session::{CounterSession, SessionError};
pub use shell::ProviderShell;
pub use view::{Action, ViewState};
pub use wallet::{KeypairWallet, WalletAdapter, WalletContext, WalletError};
