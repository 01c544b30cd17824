//! Defines the command line interface for the counter app.
use clap::Parser;

#[derive(Clone, Debug, Parser)]
#[command(
    name = "counter_app",
    version,
    about = "Counter app - create and update a counter on a Solana program",
    long_about = "Connects a keypair wallet, creates a counter account on the counter program\nand increments or decrements it, printing the resulting view."
)]
/// The command line interface for the counter app.
pub struct CounterCli {
    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// The subcommands for the counter app.
#[derive(Clone, Debug, Parser)]
pub enum Commands {
    /// Create the counter account.
    Create(ConfigArgs),
    /// Increment the counter.
    Increment(ConfigArgs),
    /// Decrement the counter.
    Decrement(ConfigArgs),
    /// Fetch and print the counter.
    Show(ConfigArgs),
    /// Run an interactive session reading commands from stdin.
    Session(ConfigArgs),
}

impl Commands {
    /// The arguments shared by every subcommand.
    #[must_use]
    pub const fn args(&self) -> &ConfigArgs {
        match self {
            Self::Create(args)
            | Self::Increment(args)
            | Self::Decrement(args)
            | Self::Show(args)
            | Self::Session(args) => args,
        }
    }
}

/// The arguments for every subcommand.
#[derive(Clone, Debug, Parser)]
pub struct ConfigArgs {
    /// The configuration file for the counter app.
    #[clap(long)]
    pub config: String,
}
