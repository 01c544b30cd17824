use anchor_lang::prelude::*;

use crate::errors::CounterError;

/// A single counter.
///
/// The account address is the public key of the keypair that co-signed
/// `create`; there is no PDA derivation.
#[account]
#[derive(InitSpace)]
pub struct BaseAccount {
    /// Current counter value
    pub count: u64,
}

impl BaseAccount {
    pub fn increment(&mut self) -> Result<()> {
        self.count = self
            .count
            .checked_add(1)
            .ok_or(CounterError::CounterOverflow)?;
        Ok(())
    }

    pub fn decrement(&mut self) -> Result<()> {
        self.count = self
            .count
            .checked_sub(1)
            .ok_or(CounterError::CounterUnderflow)?;
        Ok(())
    }
}
