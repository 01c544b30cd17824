use anchor_lang::prelude::*;

#[error_code]
pub enum CounterError {
    #[msg("Counter overflow occurred")]
    CounterOverflow,

    #[msg("Counter underflow occurred")]
    CounterUnderflow,
}
