//! Command line interface and configuration of the counter app.

mod cmd;
mod config;

pub use cmd::*;
pub use config::*;
