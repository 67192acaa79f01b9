use alloy_primitives::U256;
use async_trait::async_trait;
use futures_util::future::join_all;
use reqwest::Client;
use std::sync::{Arc, RwLock};

use crate::blockchain::rotator::EndpointRotator;
use crate::blockchain::rpc_client::{build_http_client, RpcClient};
use crate::error::{ListenerError, RpcError};
use crate::logging::MetricsLogger;
use crate::models::{Block, Receipt};

/// Chain reads against whichever endpoint is currently active
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn latest_block_height(&self) -> Result<u64, RpcError>;

    async fn get_block_with_transactions(&self, height: u64) -> Result<Option<Block>, RpcError>;

    async fn get_transaction_receipt(&self, tx_hash: &str) -> Result<Option<Receipt>, RpcError>;

    /// Receipts for several hashes in input order; fans out by default
    async fn get_transaction_receipts(&self, tx_hashes: &[String]) -> Result<Vec<Option<Receipt>>, RpcError> {
        let results = join_all(tx_hashes.iter().map(|hash| self.get_transaction_receipt(hash))).await;
        results.into_iter().collect()
    }

    async fn call(&self, to: &str, data: &str) -> Result<String, RpcError>;

    async fn get_balance(&self, address: &str) -> Result<U256, RpcError>;

    fn current_endpoint(&self) -> String;

    /// Advance to the next endpoint and rebind; returns the new endpoint
    fn rotate_endpoint(&self) -> String;
}

/// `ChainClient` over an `EndpointRotator`, rebinding its `RpcClient` on rotation
pub struct FailoverClient {
    rotator: Arc<EndpointRotator>,
    http: Client,
    timeout_seconds: u64,
    active: RwLock<RpcClient>,
    batch_receipts: bool,
}

impl FailoverClient {
    pub fn new(
        rotator: Arc<EndpointRotator>,
        timeout_seconds: u64,
        batch_receipts: bool,
    ) -> Result<Self, ListenerError> {
        let http = build_http_client(timeout_seconds)?;
        let active = RpcClient::with_client(http.clone(), rotator.current().to_string(), timeout_seconds);

        Ok(Self {
            rotator,
            http,
            timeout_seconds,
            active: RwLock::new(active),
            batch_receipts,
        })
    }

    pub fn rotator(&self) -> &EndpointRotator {
        &self.rotator
    }

    /// Clone of the active client so no lock is held across an await
    fn client(&self) -> RpcClient {
        match self.active.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl ChainClient for FailoverClient {
    async fn latest_block_height(&self) -> Result<u64, RpcError> {
        self.client().get_latest_block_number().await
    }

    async fn get_block_with_transactions(&self, height: u64) -> Result<Option<Block>, RpcError> {
        self.client().get_block_with_transactions(height).await
    }

    async fn get_transaction_receipt(&self, tx_hash: &str) -> Result<Option<Receipt>, RpcError> {
        self.client().get_transaction_receipt(tx_hash).await
    }

    async fn get_transaction_receipts(&self, tx_hashes: &[String]) -> Result<Vec<Option<Receipt>>, RpcError> {
        let client = self.client();
        if self.batch_receipts {
            return client.get_transaction_receipts(tx_hashes).await;
        }
        let results = join_all(tx_hashes.iter().map(|hash| client.get_transaction_receipt(hash))).await;
        results.into_iter().collect()
    }

    async fn call(&self, to: &str, data: &str) -> Result<String, RpcError> {
        self.client().call(to, data).await
    }

    async fn get_balance(&self, address: &str) -> Result<U256, RpcError> {
        self.client().get_balance(address).await
    }

    fn current_endpoint(&self) -> String {
        self.client().endpoint().to_string()
    }

    fn rotate_endpoint(&self) -> String {
        let from = self.current_endpoint();
        let next = self.rotator.rotate().to_string();
        let rebound = RpcClient::with_client(self.http.clone(), next.clone(), self.timeout_seconds);

        match self.active.write() {
            Ok(mut guard) => *guard = rebound,
            Err(poisoned) => *poisoned.into_inner() = rebound,
        }

        MetricsLogger::log_endpoint_rotation(&from, &next, "rpc failure");
        next
    }
}
