//! On-chain account layout of the counter program.

use borsh::BorshDeserialize;
use thiserror::Error;

use crate::idl::DISCRIMINATOR_LEN;

/// Errors decoding account data.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("account data too short: {0} bytes")]
    TooShort(usize),

    #[error("account discriminator mismatch")]
    DiscriminatorMismatch,

    #[error("failed to deserialize account: {0}")]
    Borsh(#[from] std::io::Error),
}

/// The counter's storage account.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, BorshDeserialize)]
pub struct BaseAccount {
    /// Current counter value
    pub count: u64,
}

impl BaseAccount {
    /// Decodes raw account data, checking the Anchor discriminator.
    ///
    /// Trailing bytes (allocated but unused space) are ignored.
    pub fn decode(data: &[u8], discriminator: [u8; DISCRIMINATOR_LEN]) -> Result<Self, StateError> {
        if data.len() < DISCRIMINATOR_LEN {
            return Err(StateError::TooShort(data.len()));
        }
        if data[..DISCRIMINATOR_LEN] != discriminator {
            return Err(StateError::DiscriminatorMismatch);
        }

        let mut body = &data[DISCRIMINATOR_LEN..];
        Ok(Self::deserialize(&mut body)?)
    }

    /// Encodes the account with its discriminator.
    #[must_use]
    pub fn encode(&self, discriminator: [u8; DISCRIMINATOR_LEN]) -> Vec<u8> {
        let mut data = Vec::with_capacity(DISCRIMINATOR_LEN + 8);
        data.extend_from_slice(&discriminator);
        data.extend_from_slice(&self.count.to_le_bytes());
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISC: [u8; 8] = [16, 90, 130, 242, 159, 10, 232, 133];

    #[test]
    fn test_decode_with_padding() {
        let mut data = BaseAccount { count: 42 }.encode(DISC);
        data.resize(32, 0);
        assert_eq!(BaseAccount::decode(&data, DISC).unwrap().count, 42);
    }

    #[test]
    fn test_decode_rejects_foreign_account() {
        let data = BaseAccount { count: 1 }.encode([0; 8]);
        assert!(matches!(
            BaseAccount::decode(&data, DISC),
            Err(StateError::DiscriminatorMismatch)
        ));
    }

    #[test]
    fn test_decode_rejects_short_data() {
        assert!(matches!(
            BaseAccount::decode(&DISC[..4], DISC),
            Err(StateError::TooShort(4))
        ));
        assert!(matches!(
            BaseAccount::decode(&DISC, DISC),
            Err(StateError::Borsh(_))
        ));
    }
}
