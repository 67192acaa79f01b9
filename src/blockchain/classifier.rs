use chrono::Utc;
use std::sync::Arc;

use crate::blockchain::abi::{self, Accessor};
use crate::blockchain::ChainClient;
use crate::enrichment::EnrichmentClient;
use crate::error::ClassificationMismatch;
use crate::logging::LogContext;
use crate::models::units::adjust_supply;
use crate::models::{normalize_address, validate_address, Receipt, TokenRecord};

/// Decides whether a freshly created contract answers the token accessors
pub struct ContractClassifier {
    chain: Arc<dyn ChainClient>,
    enrichment: EnrichmentClient,
    chain_name: String,
}

impl ContractClassifier {
    pub fn new(chain: Arc<dyn ChainClient>, enrichment: EnrichmentClient, chain_name: String) -> Self {
        Self {
            chain,
            enrichment,
            chain_name,
        }
    }

    /// Build a token record from a creation receipt.
    ///
    /// A mismatch is the common case: most created contracts are not tokens.
    pub async fn classify(&self, receipt: &Receipt, block_number: u64) -> Result<TokenRecord, ClassificationMismatch> {
        let address = receipt
            .created_contract()
            .filter(|address| validate_address(address).is_ok())
            .map(normalize_address)
            .ok_or(ClassificationMismatch::NotACreation)?;
        if !receipt.succeeded() {
            return Err(ClassificationMismatch::ConstructionFailed);
        }

        let (name, symbol, decimals, raw_supply) = tokio::join!(
            self.read(&address, Accessor::Name),
            self.read(&address, Accessor::Symbol),
            self.read(&address, Accessor::Decimals),
            self.read(&address, Accessor::TotalSupply),
        );

        let name = decode(Accessor::Name, name?, abi::decode_name)?;
        let symbol = decode(Accessor::Symbol, symbol?, abi::decode_symbol)?;
        let decimals = decode(Accessor::Decimals, decimals?, abi::decode_decimals)?;
        let raw_supply = decode(Accessor::TotalSupply, raw_supply?, abi::decode_total_supply)?;

        let deployer = normalize_address(&receipt.from);
        let (reputation, deployer_balance) = self.enrichment.enrich(&address, &deployer).await;

        Ok(TokenRecord {
            total_supply: adjust_supply(raw_supply, decimals).to_string(),
            raw_total_supply: raw_supply.to_string(),
            address,
            name,
            symbol,
            decimals,
            deployer,
            block_number,
            transaction_hash: receipt.transaction_hash.clone(),
            chain: self.chain_name.clone(),
            detected_at: Utc::now(),
            reputation,
            deployer_balance,
        })
    }

    async fn read(&self, address: &str, accessor: Accessor) -> Result<Vec<u8>, ClassificationMismatch> {
        let output = self
            .chain
            .call(address, &accessor.selector())
            .await
            .map_err(|e| ClassificationMismatch::AccessorFailed {
                accessor: accessor.name(),
                reason: e.to_string(),
            })?;

        abi::decode_hex(&output).map_err(|e| ClassificationMismatch::AccessorFailed {
            accessor: accessor.name(),
            reason: e.to_string(),
        })
    }
}

fn decode<T>(
    accessor: Accessor,
    data: Vec<u8>,
    decoder: fn(&[u8]) -> Result<T, abi::AbiError>,
) -> Result<T, ClassificationMismatch> {
    decoder(&data).map_err(|e| {
        let context = LogContext::new("classifier", "decode")
            .with_metadata("accessor", serde_json::json!(accessor.name()));
        context.trace(&format!("Undecodable accessor output: {}", e));

        ClassificationMismatch::Undecodable {
            accessor: accessor.name(),
            reason: e.to_string(),
        }
    })
}
