use std::io;

use clap::Parser;
use counter_app::{
    app::CounterApp,
    cli::{AppConfig, CounterCli},
    observability::init_subscriber,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CounterCli::parse();
    let config = AppConfig::from_file(&cli.command.args().config)?;

    init_subscriber(config.log_level())?;

    let app = CounterApp::from_config(&config)?;
    app.run(&cli.command, &mut io::stdout()).await?;

    Ok(())
}
