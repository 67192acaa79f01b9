use std::sync::Arc;

use crate::blockchain::ChainClient;
use crate::error::EnrichmentError;
use crate::models::units::format_units;
use crate::models::NativeBalance;

/// Native balance lookups through the active chain endpoint
#[derive(Clone)]
pub struct BalanceClient {
    chain: Arc<dyn ChainClient>,
    native_decimals: u8,
    native_symbol: String,
}

impl BalanceClient {
    pub fn new(chain: Arc<dyn ChainClient>, native_decimals: u8, native_symbol: String) -> Self {
        Self {
            chain,
            native_decimals,
            native_symbol,
        }
    }

    pub async fn lookup(&self, address: &str) -> Result<NativeBalance, EnrichmentError> {
        let wei = self.chain.get_balance(address).await?;

        Ok(NativeBalance {
            address: address.to_string(),
            wei: wei.to_string(),
            formatted: format_units(wei, self.native_decimals),
            symbol: self.native_symbol.clone(),
        })
    }
}
