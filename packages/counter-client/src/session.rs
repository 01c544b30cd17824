//! The counter account reference used by one session.

use std::{fmt, path::Path, sync::Arc};

use solana_sdk::{
    pubkey::Pubkey,
    signature::{read_keypair_file, write_keypair_file, Keypair, Signer},
};
use thiserror::Error;

/// Errors loading or persisting a session keypair.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to read counter keypair `{path}`: {reason}")]
    Read {
        /// Keypair file path
        path: String,
        /// Loader error
        reason: String,
    },

    #[error("failed to write counter keypair `{path}`: {reason}")]
    Write {
        /// Keypair file path
        path: String,
        /// Writer error
        reason: String,
    },
}

/// The keypair addressing the counter account.
///
/// Every create/increment/decrement of a session must use the same
/// reference, otherwise the mutations target an account that was never
/// created.
#[derive(Clone)]
pub struct CounterSession {
    account: Arc<Keypair>,
}

impl CounterSession {
    /// A session with a freshly generated account reference.
    #[must_use]
    pub fn generate() -> Self {
        Self::from_keypair(Keypair::new())
    }

    /// A session using the given keypair.
    #[must_use]
    pub fn from_keypair(keypair: Keypair) -> Self {
        Self {
            account: Arc::new(keypair),
        }
    }

    /// Reads the keypair at `path`, or generates one and writes it there.
    pub fn load_or_generate<P: AsRef<Path>>(path: P) -> Result<Self, SessionError> {
        let path_ref = path.as_ref();
        if path_ref.exists() {
            let keypair = read_keypair_file(path_ref).map_err(|e| SessionError::Read {
                path: path_ref.display().to_string(),
                reason: e.to_string(),
            })?;
            tracing::debug!(address = %keypair.pubkey(), "loaded counter account reference");
            return Ok(Self::from_keypair(keypair));
        }

        let keypair = Keypair::new();
        write_keypair_file(&keypair, path_ref).map_err(|e| SessionError::Write {
            path: path_ref.display().to_string(),
            reason: e.to_string(),
        })?;
        tracing::info!(
            address = %keypair.pubkey(),
            path = %path_ref.display(),
            "generated counter account reference"
        );
        Ok(Self::from_keypair(keypair))
    }

    /// Address of the counter account.
    #[must_use]
    pub fn address(&self) -> Pubkey {
        self.account.pubkey()
    }

    /// Keypair co-signing the account's creation.
    #[must_use]
    pub fn keypair(&self) -> &Keypair {
        &self.account
    }
}

impl fmt::Debug for CounterSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CounterSession")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}
