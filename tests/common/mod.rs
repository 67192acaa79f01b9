#![allow(dead_code)]

use alloy_primitives::{hex, U256};
use async_trait::async_trait;
use serde_json::Map;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use contract_listener::blockchain::abi::Accessor;
use contract_listener::blockchain::{
    BlockProcessor, ChainClient, ContractClassifier, PollLoop, PollLoopConfig,
};
use contract_listener::enrichment::EnrichmentClient;
use contract_listener::error::RpcError;
use contract_listener::models::{Block, Receipt, Transaction};
use contract_listener::report::{DisplayFeed, RecordSink};

pub const TOKEN_ADDRESS: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";
pub const DEPLOYER: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

fn rpc_failure(reason: &str) -> RpcError {
    RpcError::Connection(reason.to_string())
}

/// In-memory `ChainClient` driven by a script of heights and fixtures
pub struct ScriptedChain {
    endpoints: Vec<String>,
    cursor: AtomicUsize,
    heights: Mutex<VecDeque<Result<u64, String>>>,
    blocks: Mutex<HashMap<u64, Result<Option<Block>, String>>>,
    receipts: Mutex<HashMap<String, Receipt>>,
    receipt_failure: Mutex<Option<String>>,
    calls: Mutex<HashMap<(String, String), Result<String, String>>>,
    block_delay: Mutex<Option<Duration>>,
    requested_blocks: Mutex<Vec<u64>>,
    pub height_calls: AtomicUsize,
    pub block_calls: AtomicUsize,
    pub receipt_calls: AtomicUsize,
    pub eth_calls: AtomicUsize,
    pub balance_calls: AtomicUsize,
}

impl ScriptedChain {
    pub fn new(endpoint_count: usize) -> Self {
        Self {
            endpoints: (0..endpoint_count).map(|i| format!("https://rpc{}.test", i)).collect(),
            cursor: AtomicUsize::new(0),
            heights: Mutex::new(VecDeque::new()),
            blocks: Mutex::new(HashMap::new()),
            receipts: Mutex::new(HashMap::new()),
            receipt_failure: Mutex::new(None),
            calls: Mutex::new(HashMap::new()),
            block_delay: Mutex::new(None),
            requested_blocks: Mutex::new(Vec::new()),
            height_calls: AtomicUsize::new(0),
            block_calls: AtomicUsize::new(0),
            receipt_calls: AtomicUsize::new(0),
            eth_calls: AtomicUsize::new(0),
            balance_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_heights(self, heights: &[u64]) -> Self {
        for height in heights {
            self.push_height(*height);
        }
        self
    }

    pub fn push_height(&self, height: u64) {
        self.heights.lock().unwrap().push_back(Ok(height));
    }

    pub fn push_height_failure(&self, reason: &str) {
        self.heights.lock().unwrap().push_back(Err(reason.to_string()));
    }

    pub fn set_block(&self, block: Block) {
        let height = block.height().expect("fixture block height");
        self.blocks.lock().unwrap().insert(height, Ok(Some(block)));
    }

    pub fn set_empty_block(&self, height: u64) {
        self.set_block(block(height, vec![]));
    }

    pub fn set_missing_block(&self, height: u64) {
        self.blocks.lock().unwrap().insert(height, Ok(None));
    }

    pub fn fail_block(&self, height: u64, reason: &str) {
        self.blocks.lock().unwrap().insert(height, Err(reason.to_string()));
    }

    pub fn set_receipt(&self, receipt: Receipt) {
        self.receipts
            .lock()
            .unwrap()
            .insert(receipt.transaction_hash.clone(), receipt);
    }

    pub fn fail_receipts(&self, reason: &str) {
        *self.receipt_failure.lock().unwrap() = Some(reason.to_string());
    }

    pub fn set_block_delay(&self, delay: Duration) {
        *self.block_delay.lock().unwrap() = Some(delay);
    }

    /// Answer all four token accessors for `address`
    pub fn deploy_token(&self, address: &str, name: &str, symbol: &str, decimals: u8, supply: U256) {
        self.set_accessor(address, Accessor::Name, Ok(abi_string(name)));
        self.set_accessor(address, Accessor::Symbol, Ok(abi_string(symbol)));
        self.set_accessor(address, Accessor::Decimals, Ok(abi_uint(U256::from(decimals))));
        self.set_accessor(address, Accessor::TotalSupply, Ok(abi_uint(supply)));
    }

    pub fn set_accessor(&self, address: &str, accessor: Accessor, result: Result<String, String>) {
        self.calls
            .lock()
            .unwrap()
            .insert((address.to_lowercase(), accessor.selector()), result);
    }

    pub fn requested_blocks(&self) -> Vec<u64> {
        self.requested_blocks.lock().unwrap().clone()
    }

    pub fn total_rpc_calls(&self) -> usize {
        self.height_calls.load(Ordering::SeqCst)
            + self.block_calls.load(Ordering::SeqCst)
            + self.receipt_calls.load(Ordering::SeqCst)
            + self.eth_calls.load(Ordering::SeqCst)
            + self.balance_calls.load(Ordering::SeqCst)
    }

    pub fn position(&self) -> usize {
        self.cursor.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainClient for ScriptedChain {
    async fn latest_block_height(&self) -> Result<u64, RpcError> {
        self.height_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.heights.lock().unwrap().pop_front();
        match next {
            Some(Ok(height)) => Ok(height),
            Some(Err(reason)) => Err(rpc_failure(&reason)),
            None => Err(rpc_failure("height script exhausted")),
        }
    }

    async fn get_block_with_transactions(&self, height: u64) -> Result<Option<Block>, RpcError> {
        self.block_calls.fetch_add(1, Ordering::SeqCst);
        self.requested_blocks.lock().unwrap().push(height);

        let delay = *self.block_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let fixture = self.blocks.lock().unwrap().get(&height).cloned();
        match fixture {
            Some(Ok(block)) => Ok(block),
            Some(Err(reason)) => Err(rpc_failure(&reason)),
            None => Ok(Some(block(height, vec![]))),
        }
    }

    async fn get_transaction_receipt(&self, tx_hash: &str) -> Result<Option<Receipt>, RpcError> {
        self.receipt_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = self.receipt_failure.lock().unwrap().clone() {
            return Err(rpc_failure(&reason));
        }
        Ok(self.receipts.lock().unwrap().get(tx_hash).cloned())
    }

    async fn call(&self, to: &str, data: &str) -> Result<String, RpcError> {
        self.eth_calls.fetch_add(1, Ordering::SeqCst);
        let selector = Accessor::ALL
            .iter()
            .map(|accessor| accessor.selector())
            .find(|selector| selector == data);
        let result = match selector {
            Some(selector) => {
                let calls = self.calls.lock().unwrap();
                calls.get(&(to.to_lowercase(), selector)).cloned()
            }
            None => None,
        };
        match result {
            Some(Ok(output)) => Ok(output),
            Some(Err(reason)) => Err(RpcError::Method {
                code: 3,
                message: reason,
            }),
            None => Ok("0x".to_string()),
        }
    }

    async fn get_balance(&self, _address: &str) -> Result<U256, RpcError> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        Ok(U256::from(1_500_000_000_000_000_000u128))
    }

    fn current_endpoint(&self) -> String {
        self.endpoints[self.cursor.load(Ordering::SeqCst)].clone()
    }

    fn rotate_endpoint(&self) -> String {
        let len = self.endpoints.len();
        let next = (self.cursor.load(Ordering::SeqCst) + 1) % len;
        self.cursor.store(next, Ordering::SeqCst);
        self.endpoints[next].clone()
    }
}

/// Poll loop over a scripted chain with a display feed attached
pub fn build_loop(chain: Arc<ScriptedChain>, config: PollLoopConfig) -> (PollLoop, Arc<DisplayFeed>) {
    let client: Arc<dyn ChainClient> = chain;
    let classifier = ContractClassifier::new(
        Arc::clone(&client),
        EnrichmentClient::disabled(),
        "base".to_string(),
    );
    let feed = Arc::new(DisplayFeed::new(100));
    let sinks: Vec<Arc<dyn RecordSink>> = vec![feed.clone()];
    let processor = BlockProcessor::new(Arc::clone(&client), classifier, sinks);
    (PollLoop::new(client, processor, config), feed)
}

pub fn block(height: u64, transactions: Vec<Transaction>) -> Block {
    Block {
        number: format!("0x{:x}", height),
        hash: Some(format!("0xblock{:x}", height)),
        timestamp: Some("0x65000000".to_string()),
        transactions,
    }
}

pub fn transfer_tx(hash: &str) -> Transaction {
    Transaction {
        hash: hash.to_string(),
        from: DEPLOYER.to_string(),
        to: Some("0x000000000000000000000000000000000000dead".to_string()),
        block_number: None,
    }
}

pub fn creation_tx(hash: &str) -> Transaction {
    Transaction {
        hash: hash.to_string(),
        from: DEPLOYER.to_string(),
        to: None,
        block_number: None,
    }
}

pub fn creation_receipt(hash: &str, contract: &str) -> Receipt {
    Receipt {
        transaction_hash: hash.to_string(),
        contract_address: Some(contract.to_string()),
        from: DEPLOYER.to_string(),
        status: Some("0x1".to_string()),
        extra: Map::new(),
    }
}

/// ABI-encoded dynamic string as `eth_call` hex output
pub fn abi_string(value: &str) -> String {
    let body = hex::encode(value.as_bytes());
    let padded_len = value.len().div_ceil(32).max(1) * 64;
    format!("0x{:064x}{:064x}{:0<width$}", 32, value.len(), body, width = padded_len)
}

pub fn abi_uint(value: U256) -> String {
    format!("0x{}", hex::encode(value.to_be_bytes::<32>()))
}
