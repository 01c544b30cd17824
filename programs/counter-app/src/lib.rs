//! Command line front-end for the Solana counter program.

pub mod app;
pub mod cli;
pub mod observability;
