use crate::state::*;
use anchor_lang::prelude::*;

/// Create a counter account
#[derive(Accounts)]
pub struct Create<'info> {
    #[account(
        init,
        payer = user,
        space = 8 + BaseAccount::INIT_SPACE
    )]
    pub base_account: Account<'info, BaseAccount>,

    #[account(mut)]
    pub user: Signer<'info>,

    pub system_program: Program<'info, System>,
}

pub fn create(ctx: Context<Create>) -> Result<()> {
    let base_account = &mut ctx.accounts.base_account;
    base_account.count = 0;

    msg!("Created counter {}", base_account.key());
    Ok(())
}
