//! Runs counter commands against a provider shell and renders the view.

use std::{fmt, io::Write, str::FromStr, sync::Arc};

use anyhow::{Context, Result};
use counter_client::{CounterPanel, CounterProgram, CounterSession, KeypairWallet, ProviderShell};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::cli::{AppConfig, Commands};

/// A command typed into an interactive session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionCommand {
    Connect,
    Disconnect,
    Create,
    Increment,
    Decrement,
    Show,
    Help,
    Quit,
}

impl FromStr for SessionCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "connect" => Ok(Self::Connect),
            "disconnect" => Ok(Self::Disconnect),
            "create" => Ok(Self::Create),
            "increment" | "inc" | "+" => Ok(Self::Increment),
            "decrement" | "dec" | "-" => Ok(Self::Decrement),
            "show" | "refresh" => Ok(Self::Show),
            "help" | "?" => Ok(Self::Help),
            "quit" | "exit" | "q" => Ok(Self::Quit),
            other => Err(format!("unknown command `{other}`, type `help`")),
        }
    }
}

impl fmt::Display for SessionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::Create => "create",
            Self::Increment => "increment",
            Self::Decrement => "decrement",
            Self::Show => "show",
            Self::Help => "help",
            Self::Quit => "quit",
        };
        f.write_str(name)
    }
}

const SESSION_COMMANDS: [SessionCommand; 8] = [
    SessionCommand::Connect,
    SessionCommand::Disconnect,
    SessionCommand::Create,
    SessionCommand::Increment,
    SessionCommand::Decrement,
    SessionCommand::Show,
    SessionCommand::Help,
    SessionCommand::Quit,
];

/// The provider shell together with its counter panel.
pub struct CounterApp {
    shell: ProviderShell,
    panel: CounterPanel,
}

impl CounterApp {
    /// Assembles the app from configuration.
    ///
    /// The IDL is loaded and validated here, so a malformed descriptor stops
    /// the app before anything is submitted.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let program = CounterProgram::from_file(&config.program.idl)
            .with_context(|| format!("failed to load IDL {}", config.program.idl.display()))?;
        let wallet = KeypairWallet::from_file(config.wallet_keypair())?
            .with_name(config.wallet.name.clone());
        let session = match config.counter_keypair() {
            Some(path) => CounterSession::load_or_generate(path)?,
            None => CounterSession::generate(),
        };

        tracing::info!(
            network = %config.network,
            endpoint = %config.endpoint(),
            program_id = %program.program_id(),
            counter = %session.address(),
            "counter app configured"
        );

        let shell = ProviderShell::with_endpoint(config.network, config.endpoint(), Arc::new(wallet))
            .with_options(config.send_options());

        Ok(Self::new(shell, program, session))
    }

    /// Assembles the app from an existing shell.
    #[must_use]
    pub fn new(shell: ProviderShell, program: CounterProgram, session: CounterSession) -> Self {
        let panel = shell.panel(program, session);
        Self { shell, panel }
    }

    /// The counter panel.
    #[must_use]
    pub const fn panel(&self) -> &CounterPanel {
        &self.panel
    }

    /// Runs a one-shot subcommand, or the interactive session, and renders
    /// the resulting view to `out`.
    pub async fn run(&self, command: &Commands, out: &mut impl Write) -> Result<()> {
        self.start().await?;

        match command {
            Commands::Create(_) => self.execute(SessionCommand::Create).await?,
            Commands::Increment(_) => self.execute(SessionCommand::Increment).await?,
            Commands::Decrement(_) => self.execute(SessionCommand::Decrement).await?,
            Commands::Show(_) => {}
            Commands::Session(_) => {
                let stdin = tokio::io::BufReader::new(tokio::io::stdin());
                return self.run_session(stdin, out).await;
            }
        }

        self.render(out).await
    }

    /// Connects the wallet and loads the counter account if it already
    /// exists, so a persisted account reference shows its current value.
    pub async fn start(&self) -> Result<()> {
        self.shell.autoconnect().await?;
        if let Some(count) = self.panel.refresh().await? {
            tracing::info!(count, "resumed existing counter account");
        }
        Ok(())
    }

    /// Reads commands line by line until `quit` or end of input, rendering
    /// the view after each one.
    ///
    /// Failed commands are reported and the session continues.
    pub async fn run_session<R>(&self, input: R, out: &mut impl Write) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        self.render(out).await?;

        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let command = match line.parse::<SessionCommand>() {
                Ok(SessionCommand::Quit) => break,
                Ok(SessionCommand::Help) => {
                    let names: Vec<String> = SESSION_COMMANDS.iter().map(ToString::to_string).collect();
                    writeln!(out, "commands: {}", names.join(", "))?;
                    continue;
                }
                Ok(command) => command,
                Err(e) => {
                    writeln!(out, "{e}")?;
                    continue;
                }
            };

            if let Err(e) = self.execute(command).await {
                tracing::error!(%command, "{e:#}");
                writeln!(out, "error: {e:#}")?;
            }
            self.render(out).await?;
        }

        Ok(())
    }

    /// Executes one command against the panel.
    ///
    /// Create failures are logged by the panel and not returned; increment
    /// and decrement failures are.
    pub async fn execute(&self, command: SessionCommand) -> Result<()> {
        match command {
            SessionCommand::Connect => self.shell.autoconnect().await?,
            SessionCommand::Disconnect => self.shell.disconnect().await?,
            SessionCommand::Create => {
                self.panel.create_counter_account().await;
            }
            SessionCommand::Increment => {
                self.panel.increment_counter().await?;
            }
            SessionCommand::Decrement => {
                self.panel.decrement_counter().await?;
            }
            SessionCommand::Show => {
                self.panel.refresh().await?;
            }
            SessionCommand::Help | SessionCommand::Quit => {}
        }
        Ok(())
    }

    async fn render(&self, out: &mut impl Write) -> Result<()> {
        write!(out, "{}", self.panel.view().await)?;
        out.flush()?;
        Ok(())
    }
}
