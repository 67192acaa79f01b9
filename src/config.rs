use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use crate::error::ConfigError;

/// Placeholder every reputation URL template must contain
pub const ADDRESS_PLACEHOLDER: &str = "{address}";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub chain: ChainConfig,
    pub polling: PollingConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}

/// Chain-specific settings; one listener is parameterized by these alone
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChainConfig {
    /// Human readable chain name
    pub name: String,
    /// Ordered RPC endpoints, rotated on failure
    pub endpoints: Vec<String>,
    /// Reputation service URL containing `{address}`
    pub reputation_url_template: Option<String>,
    /// Native currency symbol
    pub native_symbol: String,
    /// Decimals of the native currency (10^decimals base units per coin)
    pub native_decimals: u8,
}

/// Poll loop and RPC timing.
///
/// `process_first_block` defaults to `false`: the first height a fresh
/// listener observes becomes the baseline and its transactions are skipped.
/// The legacy browser page processed that block; set the flag to `true`
/// to keep that behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Tick interval in milliseconds
    pub poll_interval_ms: u64,
    /// Deadline for each JSON-RPC call
    pub rpc_timeout_seconds: u64,
    /// Deadline for each enrichment call
    pub enrichment_timeout_seconds: u64,
    /// Fetch receipts with one batched request instead of one request per hash
    pub batch_receipts: bool,
    /// Start at a random endpoint instead of the first
    pub randomize_start_endpoint: bool,
    /// Look up the deployer's native balance for detected tokens
    pub enrich_deployer_balance: bool,
    /// Process the first observed height instead of adopting it as the baseline
    #[serde(default)]
    pub process_first_block: bool,
}

/// Display server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Serve the display page
    pub enabled: bool,
    /// Bind address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Number of transaction records kept for display
    pub max_records: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            chain: ChainConfig::default(),
            polling: PollingConfig::default(),
            display: DisplayConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::base()
    }
}

impl ChainConfig {
    /// Base mainnet with public endpoints
    pub fn base() -> Self {
        Self {
            name: "base".to_string(),
            endpoints: [
                "https://mainnet.base.org",
                "https://base.blockpi.network/v1/rpc/public",
                "https://public.stackup.sh/api/v1/node/base-mainnet",
                "https://base-rpc.publicnode.com",
                "https://base.drpc.org",
                "https://1rpc.io/base",
                "https://base.meowrpc.com",
                "https://base.rpc.subquery.network/public",
                "https://gateway.tenderly.co/public/base",
                "https://base.gateway.tenderly.co",
                "https://developer-access-mainnet.base.org",
                "https://endpoints.omniatech.io/v1/base/mainnet/public",
            ]
            .iter()
            .map(|url| url.to_string())
            .collect(),
            reputation_url_template: None,
            native_symbol: "ETH".to_string(),
            native_decimals: 18,
        }
    }

    /// Ethereum mainnet with public endpoints
    pub fn ethereum() -> Self {
        Self {
            name: "ethereum".to_string(),
            endpoints: [
                "https://ethereum-rpc.publicnode.com",
                "https://eth.llamarpc.com",
                "https://rpc.ankr.com/eth",
                "https://1rpc.io/eth",
                "https://eth.drpc.org",
                "https://cloudflare-eth.com",
            ]
            .iter()
            .map(|url| url.to_string())
            .collect(),
            reputation_url_template: None,
            native_symbol: "ETH".to_string(),
            native_decimals: 18,
        }
    }

    /// Look up a preset by name
    pub fn preset(name: &str) -> Result<Self, ConfigError> {
        match name.trim().to_lowercase().as_str() {
            "base" => Ok(Self::base()),
            "ethereum" | "eth" | "mainnet" => Ok(Self::ethereum()),
            other => Err(ConfigError::UnknownChain(other.to_string())),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            rpc_timeout_seconds: 10,
            enrichment_timeout_seconds: 10,
            batch_receipts: true,
            randomize_start_endpoint: false,
            enrich_deployer_balance: true,
            process_first_block: false,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_records: 500,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables
    /// Environment variables take precedence over file values
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from(&config_path)
    }

    /// Same as `load`, reading the given file instead of `CONFIG_FILE`
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults when absent
    pub fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        if !Path::new(path).exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path.to_string()))?;
        toml::from_str(&content)
            .map_err(|e| ConfigError::Parsing(e.to_string()))
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        // Chain selection first so explicit endpoints can override the preset
        if let Ok(chain) = env::var("LISTENER_CHAIN") {
            self.chain = ChainConfig::preset(&chain)?;
        }
        if let Ok(urls) = env::var("LISTENER_RPC_URLS") {
            self.chain.endpoints = parse_endpoint_list(&urls);
        }
        if let Ok(template) = env::var("REPUTATION_URL_TEMPLATE") {
            self.chain.reputation_url_template = Some(template);
        }

        if let Ok(interval) = env::var("POLL_INTERVAL_MS") {
            self.polling.poll_interval_ms = parse_env("POLL_INTERVAL_MS", interval)?;
        }
        if let Ok(timeout) = env::var("RPC_TIMEOUT_SECONDS") {
            self.polling.rpc_timeout_seconds = parse_env("RPC_TIMEOUT_SECONDS", timeout)?;
        }
        if let Ok(timeout) = env::var("ENRICHMENT_TIMEOUT_SECONDS") {
            self.polling.enrichment_timeout_seconds = parse_env("ENRICHMENT_TIMEOUT_SECONDS", timeout)?;
        }

        if let Ok(enabled) = env::var("DISPLAY_ENABLED") {
            self.display.enabled = parse_env("DISPLAY_ENABLED", enabled)?;
        }
        if let Ok(host) = env::var("DISPLAY_HOST") {
            self.display.host = host;
        }
        if let Ok(port) = env::var("DISPLAY_PORT") {
            self.display.port = parse_env("DISPLAY_PORT", port)?;
        }

        if let Ok(level) = env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = env::var("LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chain.endpoints.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }

        for endpoint in &self.chain.endpoints {
            if !is_http_url(endpoint) {
                return Err(ConfigError::InvalidUrl(endpoint.clone()));
            }
        }

        if let Some(template) = &self.chain.reputation_url_template {
            if !is_http_url(template) {
                return Err(ConfigError::InvalidUrl(template.clone()));
            }
            if !template.contains(ADDRESS_PLACEHOLDER) {
                return Err(ConfigError::InvalidValue {
                    key: "chain.reputation_url_template".to_string(),
                    value: template.clone(),
                });
            }
        }

        if self.chain.native_decimals > 77 {
            return Err(ConfigError::InvalidValue {
                key: "chain.native_decimals".to_string(),
                value: self.chain.native_decimals.to_string(),
            });
        }

        if self.polling.poll_interval_ms < 100 || self.polling.poll_interval_ms > 300_000 {
            return Err(ConfigError::InvalidValue {
                key: "polling.poll_interval_ms".to_string(),
                value: self.polling.poll_interval_ms.to_string(),
            });
        }

        if self.polling.rpc_timeout_seconds == 0 || self.polling.rpc_timeout_seconds > 300 {
            return Err(ConfigError::InvalidValue {
                key: "polling.rpc_timeout_seconds".to_string(),
                value: self.polling.rpc_timeout_seconds.to_string(),
            });
        }

        if self.polling.enrichment_timeout_seconds == 0 || self.polling.enrichment_timeout_seconds > 300 {
            return Err(ConfigError::InvalidValue {
                key: "polling.enrichment_timeout_seconds".to_string(),
                value: self.polling.enrichment_timeout_seconds.to_string(),
            });
        }

        if self.display.port == 0 {
            return Err(ConfigError::InvalidValue {
                key: "display.port".to_string(),
                value: self.display.port.to_string(),
            });
        }

        if self.display.max_records == 0 {
            return Err(ConfigError::InvalidValue {
                key: "display.max_records".to_string(),
                value: self.display.max_records.to_string(),
            });
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                value: self.logging.level.clone(),
            });
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.format".to_string(),
                value: self.logging.format.clone(),
            });
        }

        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample_config() -> Result<String, ConfigError> {
        let config = Self::default();
        toml::to_string_pretty(&config)
            .map_err(|e| ConfigError::Parsing(e.to_string()))
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Parsing(e.to_string()))?;
        fs::write(path, content)
            .map_err(|_| ConfigError::FileNotFound(path.to_string()))?;
        Ok(())
    }
}

/// Split a comma separated endpoint list, dropping blanks
pub fn parse_endpoint_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn parse_env<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}
