use crate::state::*;
use anchor_lang::prelude::*;

#[derive(Accounts)]
pub struct Increment<'info> {
    #[account(mut)]
    pub base_account: Account<'info, BaseAccount>,
}

#[derive(Accounts)]
pub struct Decrement<'info> {
    #[account(mut)]
    pub base_account: Account<'info, BaseAccount>,
}

pub fn increment(ctx: Context<Increment>) -> Result<()> {
    let base_account = &mut ctx.accounts.base_account;
    base_account.increment()?;

    msg!("Incremented counter {} to {}", base_account.key(), base_account.count);
    Ok(())
}

pub fn decrement(ctx: Context<Decrement>) -> Result<()> {
    let base_account = &mut ctx.accounts.base_account;
    base_account.decrement()?;

    msg!("Decremented counter {} to {}", base_account.key(), base_account.count);
    Ok(())
}
