//! Cluster selection and commitment levels.

use std::{fmt, str::FromStr};

use solana_sdk::commitment_config::CommitmentConfig;

/// The Solana cluster the client talks to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Network {
    /// The public development cluster.
    #[default]
    Devnet,
    /// The public test cluster.
    Testnet,
    /// The production cluster.
    MainnetBeta,
    /// A local `solana-test-validator`.
    Localnet,
}

impl Network {
    /// Returns the public RPC endpoint for the cluster.
    #[must_use]
    pub const fn rpc_url(self) -> &'static str {
        match self {
            Self::Devnet => "https://api.devnet.solana.com",
            Self::Testnet => "https://api.testnet.solana.com",
            Self::MainnetBeta => "https://api.mainnet-beta.solana.com",
            Self::Localnet => "http://127.0.0.1:8899",
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Devnet => "devnet",
            Self::Testnet => "testnet",
            Self::MainnetBeta => "mainnet-beta",
            Self::Localnet => "localnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "devnet" => Ok(Self::Devnet),
            "testnet" => Ok(Self::Testnet),
            "mainnet-beta" | "mainnet" => Ok(Self::MainnetBeta),
            "localnet" | "localhost" => Ok(Self::Localnet),
            other => Err(format!("unknown network `{other}`")),
        }
    }
}

/// How finalized a transaction must be before a read is considered valid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    /// The least durable level: the node has processed the block.
    #[default]
    Processed,
    /// Voted on by a supermajority.
    Confirmed,
    /// Rooted by a supermajority.
    Finalized,
}

impl From<Commitment> for CommitmentConfig {
    fn from(value: Commitment) -> Self {
        match value {
            Commitment::Processed => Self::processed(),
            Commitment::Confirmed => Self::confirmed(),
            Commitment::Finalized => Self::finalized(),
        }
    }
}
