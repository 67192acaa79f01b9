use clap::Parser;
use log::info;

use contract_listener::api::Cli;
use contract_listener::config::AppConfig;
use contract_listener::logging::init_logging;
use contract_listener::Listener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    cli.apply(&mut config)?;

    if cli.print_config {
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    init_logging(&config.logging)?;
    info!(
        "Listening on {} with {} RPC endpoints",
        config.chain.name,
        config.chain.endpoints.len()
    );

    let listener = Listener::from_config(&config)?;
    listener.run().await?;

    info!("Listener stopped");
    Ok(())
}
