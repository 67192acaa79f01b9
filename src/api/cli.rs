use clap::Parser;

use crate::config::{AppConfig, ChainConfig};
use crate::error::ConfigError;

/// Command line flags; each one overrides the loaded configuration
#[derive(Parser, Debug, Default)]
#[command(name = "listener")]
#[command(about = "Watches a chain for newly deployed token contracts")]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to CONFIG_FILE or config.toml)
    #[arg(long)]
    pub config: Option<String>,

    /// Chain preset: base or ethereum
    #[arg(long)]
    pub chain: Option<String>,

    /// RPC endpoint, repeat for failover order
    #[arg(long = "rpc-url")]
    pub rpc_urls: Vec<String>,

    /// Display server port
    #[arg(long)]
    pub port: Option<u16>,

    /// Run without the display server
    #[arg(long)]
    pub no_display: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,
}

impl Cli {
    /// Apply flag overrides, then re-validate
    pub fn apply(&self, config: &mut AppConfig) -> Result<(), ConfigError> {
        if let Some(chain) = &self.chain {
            config.chain = ChainConfig::preset(chain)?;
        }
        if !self.rpc_urls.is_empty() {
            config.chain.endpoints = self.rpc_urls.clone();
        }
        if let Some(port) = self.port {
            config.display.port = port;
        }
        if self.no_display {
            config.display.enabled = false;
        }
        config.validate()
    }
}
