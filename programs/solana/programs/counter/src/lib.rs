use anchor_lang::prelude::*;

declare_id!("9EoiyC3P15LGQs6ZyLeY9a9FmrRMENUyHfQ2W9PkhYxV");

pub mod errors;
pub mod instructions;
pub mod state;

use instructions::*;

/// Counter Program
///
/// Each counter lives in its own `BaseAccount`, created by a fresh keypair
/// that co-signs the `create` transaction.
#[program]
pub mod counter {
    use super::*;

    /// Create a counter account starting at zero, paid for by `user`
    pub fn create(ctx: Context<Create>) -> Result<()> {
        instructions::create(ctx)
    }

    /// Add one to the counter
    pub fn increment(ctx: Context<Increment>) -> Result<()> {
        instructions::increment(ctx)
    }

    /// Subtract one from the counter
    pub fn decrement(ctx: Context<Decrement>) -> Result<()> {
        instructions::decrement(ctx)
    }
}
