//! Defines the top level configuration for the counter app.
use std::{
    env, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use counter_client::{Commitment, Network, SendOptions};
use thiserror::Error;
use tracing::Level;

/// The top level configuration for the counter app.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct AppConfig {
    /// The cluster to connect to.
    #[serde(default)]
    pub network: Network,
    /// Explicit RPC endpoint, overriding the cluster's public one.
    #[serde(default)]
    pub rpc_url: Option<String>,
    /// Commitment used both for preflight and confirmation.
    #[serde(default)]
    pub commitment: Commitment,
    /// The log level for the app.
    #[serde(default)]
    pub log_level: String,
    /// The wallet to sign with.
    pub wallet: WalletConfig,
    /// The counter program.
    pub program: ProgramConfig,
    /// Counter account reference handling.
    #[serde(default)]
    pub session: SessionConfig,
}

/// The configuration for the wallet adapter.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct WalletConfig {
    /// Path to a Solana CLI keypair file.
    pub keypair: PathBuf,
    /// Display name of the wallet.
    #[serde(default = "default_wallet_name")]
    pub name: String,
}

/// The configuration for the counter program.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct ProgramConfig {
    /// Path to the program's Anchor IDL.
    pub idl: PathBuf,
}

/// The configuration for the counter account reference.
#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct SessionConfig {
    /// Where to persist the counter keypair. A fresh one is generated per
    /// run when unset.
    #[serde(default)]
    pub counter_keypair: Option<PathBuf>,
}

/// Errors that can occur loading the app config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error reading `{0}`: {1}")]
    Io(String, #[source] std::io::Error),

    #[error("invalid TOML in config: {0}")]
    Toml(#[from] toml::de::Error),
}

fn default_wallet_name() -> String {
    "Keypair".to_string()
}

impl AppConfig {
    /// Load an `AppConfig` from a TOML file on disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .map_err(|e| ConfigError::Io(path_ref.display().to_string(), e))?;
        contents.parse()
    }

    /// Returns the log level for the app.
    #[must_use]
    pub fn log_level(&self) -> Level {
        Level::from_str(&self.log_level).unwrap_or(Level::INFO)
    }

    /// The RPC endpoint to use.
    #[must_use]
    pub fn endpoint(&self) -> String {
        self.rpc_url
            .clone()
            .unwrap_or_else(|| self.network.rpc_url().to_string())
    }

    /// Commitment settings for submissions and reads.
    #[must_use]
    pub fn send_options(&self) -> SendOptions {
        SendOptions {
            commitment: self.commitment.into(),
            preflight_commitment: self.commitment.into(),
        }
    }

    /// The wallet keypair path with `~` expanded.
    #[must_use]
    pub fn wallet_keypair(&self) -> PathBuf {
        expand_home(&self.wallet.keypair)
    }

    /// The counter keypair path with `~` expanded.
    #[must_use]
    pub fn counter_keypair(&self) -> Option<PathBuf> {
        self.session.counter_keypair.as_deref().map(expand_home)
    }
}

impl FromStr for AppConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), env::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
